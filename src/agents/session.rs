//! Per-user chat session

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::domain::Message;
use crate::agents::prompt::Document;

/// How a query is routed to agents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowMode {
    /// The router agent orchestrates its collaborators
    #[default]
    Intelligent,
    /// A user-defined sequence of agents, each seeing the previous answer
    Sequence,
    /// One manually selected agent
    Single,
}

impl std::fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowMode::Intelligent => write!(f, "intelligent"),
            WorkflowMode::Sequence => write!(f, "sequence"),
            WorkflowMode::Single => write!(f, "single"),
        }
    }
}

/// Generate a service session identifier: `session-{unix-seconds}-{12 hex}`
pub fn new_session_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("session-{}-{}", Utc::now().timestamp(), &hex[..12])
}

/// State owned by one conversation
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    pub session_id: String,
    pub mode: WorkflowMode,
    /// Agent keys run in order in sequence mode
    pub agent_sequence: Vec<String>,
    /// Agent keys picked by the user; single mode uses the first
    pub selected_agents: Vec<String>,
    pub debug: bool,
    pub history: Vec<Message>,
    /// Documents appended to the next prompt
    pub attachments: Vec<Document>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(WorkflowMode::default())
    }
}

impl ChatSession {
    pub fn new(mode: WorkflowMode) -> Self {
        Self {
            session_id: new_session_id(),
            mode,
            agent_sequence: Vec::new(),
            selected_agents: Vec::new(),
            debug: false,
            history: Vec::new(),
            attachments: Vec::new(),
        }
    }

    pub fn with_sequence(mut self, sequence: Vec<String>) -> Self {
        self.agent_sequence = sequence;
        self
    }

    pub fn with_selected(mut self, agents: Vec<String>) -> Self {
        self.selected_agents = agents;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// First selected agent, if any
    pub fn selected_agent(&self) -> Option<&str> {
        self.selected_agents.first().map(String::as_str)
    }

    pub fn record_user(&mut self, content: impl Into<String>) {
        self.history.push(Message::user(content));
    }

    pub fn record_assistant(&mut self, content: impl Into<String>, agents: Vec<String>) {
        self.history.push(Message::assistant(content, agents));
    }

    /// Attachments are consumed by the next prompt
    pub fn take_attachments(&mut self) -> Vec<Document> {
        std::mem::take(&mut self.attachments)
    }

    /// Start a new conversation: fresh identifier, empty history and attachments
    pub fn reset(&mut self) {
        self.session_id = new_session_id();
        self.history.clear();
        self.attachments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_format() {
        let id = new_session_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "session");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 12);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_session_id_persists_until_reset() {
        let mut session = ChatSession::new(WorkflowMode::Single)
            .with_selected(vec!["quality".to_string()]);
        let id = session.session_id.clone();

        session.record_user("hello");
        session.attachments.push(Document::new("a.txt", "x"));
        assert_eq!(session.session_id, id);

        session.reset();
        assert_ne!(session.session_id, id);
        assert!(session.history.is_empty());
        assert!(session.attachments.is_empty());
        assert_eq!(session.selected_agent(), Some("quality"));
        assert_eq!(session.mode, WorkflowMode::Single);
    }

    #[test]
    fn test_take_attachments() {
        let mut session = ChatSession::default();
        session.attachments.push(Document::new("a.txt", "x"));
        assert_eq!(session.take_attachments().len(), 1);
        assert!(session.attachments.is_empty());
    }
}
