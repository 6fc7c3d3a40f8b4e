//! Prompt shaping for router requests and document attachments

use serde::{Deserialize, Serialize};

use crate::agents::error::{ExecutionError, ExecutionResult};

/// Words that already steer the router towards its collaborators
pub const ORCHESTRATION_TRIGGERS: [&str; 12] = [
    "analyze",
    "compare",
    "evaluate",
    "review",
    "draft",
    "negotiate",
    "search",
    "quality",
    "management",
    "contract",
    "multiple",
    "comprehensive",
];

const OPTIMIZE_PREFIX: &str =
    "Please orchestrate with your collaborator agents to comprehensively address this request: ";

const ROUTER_INPUT_PREFIX: &str =
    "Please orchestrate and collaborate with appropriate agents to handle this request: ";

/// Message used when documents are shared without any text
const EMPTY_MESSAGE_WITH_DOCUMENTS: &str = "sharing documents";

/// Prefix an orchestration request unless a trigger word is present
pub fn optimize_for_router(query: &str) -> String {
    let lower = query.to_lowercase();
    if ORCHESTRATION_TRIGGERS.iter().any(|t| lower.contains(t)) {
        query.to_string()
    } else {
        format!("{}{}", OPTIMIZE_PREFIX, query)
    }
}

/// Ask the router to orchestrate, unless the input already does
pub fn wrap_router_input(input: &str) -> String {
    if input.contains("Orchestrate") || input.to_lowercase().contains("collaborate") {
        input.to_string()
    } else {
        format!("{}{}", ROUTER_INPUT_PREFIX, input)
    }
}

/// A plain-text document attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub content: String,
}

impl Document {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Build a document from raw file bytes; only UTF-8 text is accepted
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> ExecutionResult<Self> {
        let name = name.into();
        let content = String::from_utf8(bytes).map_err(|_| {
            ExecutionError::Configuration(format!("{} is not a plain-text document", name))
        })?;
        Ok(Self { name, content })
    }
}

/// Append attached documents to the user's text
pub fn build_prompt(text: &str, documents: &[Document]) -> String {
    if documents.is_empty() {
        return text.to_string();
    }

    let mut prompt = if text.is_empty() {
        EMPTY_MESSAGE_WITH_DOCUMENTS.to_string()
    } else {
        text.to_string()
    };

    for (i, document) in documents.iter().enumerate() {
        prompt.push_str(&format!(
            "\ndocument #{} called {}\n{}",
            i + 1,
            document.name,
            document.content
        ));
    }
    prompt
}
