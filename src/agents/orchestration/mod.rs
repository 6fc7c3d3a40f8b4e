//! Workflow orchestration
//!
//! Routes a query according to the session's mode:
//! - Intelligent: the router agent orchestrates its collaborators
//! - Sequence: agents execute in order, passing results
//! - Single: one selected agent answers directly

mod sequential;
mod single;

pub use sequential::{
    continuation_input, recovery_input, SequentialRunner, SEQUENCE_SELECTION_METHOD,
};
pub use single::{SingleAgentRunner, SINGLE_SELECTION_METHOD};

use serde::Serialize;
use tracing::info;

use crate::agents::domain::ParsedResult;
use crate::agents::error::ExecutionResult;
use crate::agents::executor::{AgentExecutor, AgentReply};
use crate::agents::prompt::{build_prompt, optimize_for_router};
use crate::agents::session::{ChatSession, WorkflowMode};

pub const INTELLIGENT_SELECTION_METHOD: &str = "Intelligent multi-agent orchestration";

/// Shown when single mode has no usable selection
pub const NO_AGENT_SELECTED: &str = "Please select an agent to continue.";

/// One agent's contribution to a workflow
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutput {
    pub agent_key: String,
    pub agent_name: String,
    pub agent_icon: String,
    /// Rendered answer, or the inline error of a failed step
    pub output: String,
    pub succeeded: bool,
    pub collaboration_detected: bool,
}

impl AgentOutput {
    /// Split a reply into its output and its debug trace
    pub fn from_reply(reply: AgentReply) -> (Self, AgentTrace) {
        let trace = AgentTrace {
            agent_key: reply.agent_key.clone(),
            parsed: reply.parsed,
        };
        let output = Self {
            agent_key: reply.agent_key,
            agent_name: reply.agent_name,
            agent_icon: reply.agent_icon,
            output: reply.text,
            succeeded: true,
            collaboration_detected: reply.collaboration_detected,
        };
        (output, trace)
    }

    pub fn failed(
        agent_key: impl Into<String>,
        agent_name: impl Into<String>,
        agent_icon: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            agent_key: agent_key.into(),
            agent_name: agent_name.into(),
            agent_icon: agent_icon.into(),
            output: error.into(),
            succeeded: false,
            collaboration_detected: false,
        }
    }
}

/// Parse details of one invocation, shown in debug mode
#[derive(Debug, Clone, Serialize)]
pub struct AgentTrace {
    pub agent_key: String,
    pub parsed: ParsedResult,
}

/// Outcome of a completed workflow
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub final_text: String,
    pub agent_names: Vec<String>,
    pub agent_icons: Vec<String>,
    pub selection_method: String,
    pub collaboration_detected: bool,
    /// Per-step outputs, in sequence mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_agent_outputs: Option<Vec<AgentOutput>>,
    pub original_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized_query: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub traces: Vec<AgentTrace>,
}

/// Result of one workflow run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowResult {
    Failed { error: String },
    Completed(WorkflowReport),
}

impl WorkflowResult {
    fn from_execution(result: ExecutionResult<WorkflowReport>) -> Self {
        match result {
            Ok(report) => WorkflowResult::Completed(report),
            Err(err) => WorkflowResult::Failed {
                error: err.to_string(),
            },
        }
    }

    /// Text shown to the user
    pub fn text(&self) -> &str {
        match self {
            WorkflowResult::Failed { error } => error,
            WorkflowResult::Completed(report) => &report.final_text,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, WorkflowResult::Completed(_))
    }
}

/// Dispatches queries to the runner matching the session's mode
#[derive(Clone)]
pub struct OrchestrationEngine {
    executor: AgentExecutor,
}

impl OrchestrationEngine {
    pub fn new(executor: AgentExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &AgentExecutor {
        &self.executor
    }

    /// Run one query in the session's mode
    pub async fn run_workflow(&self, session: &ChatSession, query: &str) -> WorkflowResult {
        info!(mode = %session.mode, session_id = %session.session_id, "Running workflow");

        match session.mode {
            WorkflowMode::Intelligent => {
                let optimized = optimize_for_router(query);
                let result = SingleAgentRunner::new(&self.executor)
                    .run(self.executor.router_key(), &optimized, &session.session_id)
                    .await
                    .map(|mut report| {
                        report.selection_method = INTELLIGENT_SELECTION_METHOD.to_string();
                        report.original_query = query.to_string();
                        report.optimized_query = Some(optimized.clone());
                        report
                    });
                WorkflowResult::from_execution(result)
            }
            WorkflowMode::Sequence => WorkflowResult::from_execution(
                SequentialRunner::new(&self.executor)
                    .run(&session.agent_sequence, query, &session.session_id)
                    .await,
            ),
            WorkflowMode::Single => {
                let catalog = self.executor.catalog();
                let usable = !session.selected_agents.is_empty()
                    && session.selected_agents.iter().all(|key| catalog.contains(key));

                match session.selected_agent() {
                    Some(agent_key) if usable => WorkflowResult::from_execution(
                        SingleAgentRunner::new(&self.executor)
                            .run(agent_key, query, &session.session_id)
                            .await,
                    ),
                    _ => WorkflowResult::Failed {
                        error: NO_AGENT_SELECTED.to_string(),
                    },
                }
            }
        }
    }

    /// Build the prompt from `text` and pending attachments, run it, and
    /// record both sides in the session history
    pub async fn submit(&self, session: &mut ChatSession, text: &str) -> WorkflowResult {
        let attachments = session.take_attachments();
        let prompt = build_prompt(text, &attachments);
        session.record_user(prompt.clone());

        let result = self.run_workflow(session, &prompt).await;
        let agents = match &result {
            WorkflowResult::Completed(report) => report.agent_names.clone(),
            WorkflowResult::Failed { .. } => Vec::new(),
        };
        session.record_assistant(result.text(), agents);
        result
    }
}
