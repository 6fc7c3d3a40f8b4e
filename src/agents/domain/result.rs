//! Parsed invocation results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::agents::error::ParseDiagnostic;

/// Preview length for collaborator responses
pub const AGENT_PREVIEW_CHARS: usize = 150;
/// Preview length for action group output
pub const ACTION_PREVIEW_CHARS: usize = 100;
/// Preview length for pre/post-processing input
pub const PROCESSING_PREVIEW_CHARS: usize = 100;
/// Preview length for orchestration reasoning
pub const REASONING_PREVIEW_CHARS: usize = 500;

/// Truncate `text` to `max_chars` characters, appending `...` when shortened
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Kind of an orchestration log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Reasoning,
    AgentResponse,
    Action,
    KnowledgeSearch,
    Pre,
    Post,
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepKind::Reasoning => write!(f, "reasoning"),
            StepKind::AgentResponse => write!(f, "agent_response"),
            StepKind::Action => write!(f, "action"),
            StepKind::KnowledgeSearch => write!(f, "knowledge_search"),
            StepKind::Pre => write!(f, "pre"),
            StepKind::Post => write!(f, "post"),
        }
    }
}

/// A normalized orchestration log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationStep {
    pub kind: StepKind,
    /// Collaborator name, for agent responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Bounded preview of the step content
    pub preview: String,
    /// Retrieved reference count, for knowledge searches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references_count: Option<usize>,
}

impl OrchestrationStep {
    fn new(kind: StepKind, preview: String) -> Self {
        Self {
            kind,
            agent: None,
            preview,
            references_count: None,
        }
    }

    pub fn reasoning(text: &str) -> Self {
        Self::new(StepKind::Reasoning, truncate_preview(text, REASONING_PREVIEW_CHARS))
    }

    pub fn agent_response(agent: impl Into<String>, text: &str) -> Self {
        Self {
            agent: Some(agent.into()),
            ..Self::new(StepKind::AgentResponse, truncate_preview(text, AGENT_PREVIEW_CHARS))
        }
    }

    pub fn action(text: &str) -> Self {
        Self::new(StepKind::Action, truncate_preview(text, ACTION_PREVIEW_CHARS))
    }

    pub fn knowledge_search(references_count: usize) -> Self {
        Self {
            references_count: Some(references_count),
            ..Self::new(StepKind::KnowledgeSearch, format!("{} references found", references_count))
        }
    }

    pub fn pre(text: &str) -> Self {
        Self::new(StepKind::Pre, truncate_preview(text, PROCESSING_PREVIEW_CHARS))
    }

    pub fn post(text: &str) -> Self {
        Self::new(StepKind::Post, truncate_preview(text, PROCESSING_PREVIEW_CHARS))
    }
}

/// Where a collaborator response came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Reported by an AGENT_COLLABORATOR observation
    #[default]
    Collaborator,
}

/// A collaborator's full response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaboratorResponse {
    pub response: String,
    pub source_kind: SourceKind,
}

/// Collaborator display name → response. Last write wins.
pub type CollaboratorResponseMap = BTreeMap<String, CollaboratorResponse>;

/// Everything extracted from one invocation's stream
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedResult {
    /// Assembled answer text
    pub final_response: String,
    /// Responses reported by collaborators
    pub collaborators: CollaboratorResponseMap,
    /// Orchestration log in arrival order
    pub steps: Vec<OrchestrationStep>,
    /// Recovered diagnostics in arrival order
    pub errors: Vec<ParseDiagnostic>,
    /// Collaborator names seen on trace envelopes
    pub trace_info: Vec<String>,
    /// Decoded chunks, for debugging
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub raw_chunks: Vec<String>,
}

impl ParsedResult {
    /// Whether collaborators were involved in producing this result
    pub fn collaboration_detected(&self) -> bool {
        !self.collaborators.is_empty()
            || self.steps.iter().any(|s| s.kind == StepKind::AgentResponse)
    }
}
