//! Single-call runner

use super::{AgentOutput, WorkflowReport};
use crate::agents::error::ExecutionResult;
use crate::agents::executor::AgentExecutor;

pub const SINGLE_SELECTION_METHOD: &str = "Single agent selected manually";

/// Sends the raw query to one agent
pub struct SingleAgentRunner<'a> {
    executor: &'a AgentExecutor,
}

impl<'a> SingleAgentRunner<'a> {
    pub fn new(executor: &'a AgentExecutor) -> Self {
        Self { executor }
    }

    pub async fn run(
        &self,
        agent_key: &str,
        query: &str,
        session_id: &str,
    ) -> ExecutionResult<WorkflowReport> {
        let reply = self.executor.execute(agent_key, query, session_id).await?;
        let (output, trace) = AgentOutput::from_reply(reply);

        Ok(WorkflowReport {
            final_text: output.output,
            agent_names: vec![output.agent_name],
            agent_icons: vec![output.agent_icon],
            selection_method: SINGLE_SELECTION_METHOD.to_string(),
            collaboration_detected: output.collaboration_detected,
            per_agent_outputs: None,
            original_query: query.to_string(),
            optimized_query: None,
            traces: vec![trace],
        })
    }
}
