//! Sequential pipeline: agents run in order, each seeing the previous answer

use tracing::{info, warn};

use super::{AgentOutput, WorkflowReport};
use crate::agents::error::{ExecutionError, ExecutionResult};
use crate::agents::executor::AgentExecutor;

pub const SEQUENCE_SELECTION_METHOD: &str = "Multi-agent sequence";

/// Input for the step after a successful one
pub fn continuation_input(previous_output: &str, query: &str) -> String {
    format!(
        "Considering the previous response: {}\n\nOriginal question: {}",
        previous_output, query
    )
}

/// Input for the step after a failed one
pub fn recovery_input(query: &str) -> String {
    format!(
        "The previous agent encountered an error. Original question: {}",
        query
    )
}

/// Runs an ordered list of agents; a failing step never aborts the sequence
pub struct SequentialRunner<'a> {
    executor: &'a AgentExecutor,
}

impl<'a> SequentialRunner<'a> {
    pub fn new(executor: &'a AgentExecutor) -> Self {
        Self { executor }
    }

    pub async fn run(
        &self,
        sequence: &[String],
        query: &str,
        session_id: &str,
    ) -> ExecutionResult<WorkflowReport> {
        if sequence.is_empty() {
            return Err(ExecutionError::Configuration(
                "No agent sequence defined. Define a sequence to continue.".to_string(),
            ));
        }

        let catalog = self.executor.catalog();
        let mut outputs = Vec::with_capacity(sequence.len());
        let mut traces = Vec::new();
        let mut current_input = query.to_string();

        for (step, agent_key) in sequence.iter().enumerate() {
            info!(agent = %agent_key, step = step + 1, total = sequence.len(), "Running sequence step");

            let output = match self.executor.execute(agent_key, &current_input, session_id).await {
                Ok(reply) => {
                    current_input = continuation_input(&reply.text, query);
                    let (output, trace) = AgentOutput::from_reply(reply);
                    traces.push(trace);
                    output
                }
                Err(err) => {
                    warn!(agent = %agent_key, error = %err, "Sequence step failed");
                    current_input = recovery_input(query);
                    AgentOutput::failed(
                        agent_key,
                        catalog.display_name(agent_key),
                        catalog.icon(agent_key),
                        err.to_string(),
                    )
                }
            };
            outputs.push(output);
        }

        let final_text = outputs
            .iter()
            .map(|o| format!("{} {}:\n{}", o.agent_icon, o.agent_name, o.output))
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(WorkflowReport {
            final_text,
            agent_names: outputs.iter().map(|o| o.agent_name.clone()).collect(),
            agent_icons: outputs.iter().map(|o| o.agent_icon.clone()).collect(),
            selection_method: SEQUENCE_SELECTION_METHOD.to_string(),
            collaboration_detected: outputs.iter().any(|o| o.collaboration_detected),
            per_agent_outputs: Some(outputs),
            original_query: query.to_string(),
            optimized_query: None,
            traces,
        })
    }
}
