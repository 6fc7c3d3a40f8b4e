//! Single-agent execution: invoke, parse, assemble, classify

use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, info};

use crate::agents::config::{AgentCatalog, AgentDescriptor};
use crate::agents::domain::{ParsedResult, StreamEvent};
use crate::agents::error::{ExecutionError, ExecutionResult, ParseDiagnostic};
use crate::agents::parser::{classify, ResponseParser};
use crate::agents::phase::{Outcome, PhaseTracker, RequestPhase};
use crate::agents::prompt::wrap_router_input;
use crate::agents::retry::RetryingInvoker;
use crate::agents::runtime::{EventStream, InvokeRequest};

/// Rendered answer of one agent invocation
#[derive(Debug, Clone, Serialize)]
pub struct AgentReply {
    pub agent_key: String,
    pub agent_name: String,
    pub agent_icon: String,
    /// User-visible text
    pub text: String,
    pub collaboration_detected: bool,
    /// Full parse, for debug output
    pub parsed: ParsedResult,
}

/// Runs one agent at a time through the retrying invoker
#[derive(Clone)]
pub struct AgentExecutor {
    invoker: RetryingInvoker,
    catalog: Arc<AgentCatalog>,
    router_key: String,
    markers: Vec<String>,
}

impl AgentExecutor {
    pub fn new(
        invoker: RetryingInvoker,
        catalog: Arc<AgentCatalog>,
        router_key: impl Into<String>,
        markers: Vec<String>,
    ) -> Self {
        Self {
            invoker,
            catalog,
            router_key: router_key.into(),
            markers,
        }
    }

    pub fn catalog(&self) -> &AgentCatalog {
        &self.catalog
    }

    pub fn router_key(&self) -> &str {
        &self.router_key
    }

    /// Look up an agent that can be invoked
    pub fn resolve(&self, agent_key: &str) -> ExecutionResult<&AgentDescriptor> {
        let agent = self
            .catalog
            .get(agent_key)
            .ok_or_else(|| ExecutionError::UnknownAgent(agent_key.to_string()))?;

        if !agent.is_configured() {
            return Err(ExecutionError::Configuration(format!(
                "Missing agent ID or alias ID for {}",
                agent.name
            )));
        }
        Ok(agent)
    }

    /// Send `input` to one agent and render its answer. Router input is
    /// wrapped with an orchestration request.
    pub async fn execute(
        &self,
        agent_key: &str,
        input: &str,
        session_id: &str,
    ) -> ExecutionResult<AgentReply> {
        let input_text = if agent_key == self.router_key {
            wrap_router_input(input)
        } else {
            input.to_string()
        };
        self.execute_verbatim(agent_key, input_text, session_id).await
    }

    /// Like [`execute`](Self::execute), sending the input unchanged
    pub async fn execute_verbatim(
        &self,
        agent_key: &str,
        input_text: String,
        session_id: &str,
    ) -> ExecutionResult<AgentReply> {
        let agent = self.resolve(agent_key)?;
        let mut tracker = PhaseTracker::new(agent_key);
        tracker.advance(RequestPhase::Dispatching)?;
        let is_router = agent_key == self.router_key;

        let request = InvokeRequest::new(
            &agent.agent_id,
            &agent.alias_id,
            session_id,
            input_text,
        );

        let stream = match self.invoker.invoke(agent, request).await {
            Ok(stream) => stream,
            Err(err) => {
                tracker.fail();
                return Err(err);
            }
        };

        let result = self.consume(stream, &mut tracker).await;
        let reply = match result {
            Ok(parsed) => self.render(agent, is_router, parsed, &mut tracker),
            Err(err) => Err(err),
        };
        if reply.is_err() {
            tracker.fail();
        }
        reply
    }

    /// Parse and render an already-recorded stream for one agent
    pub fn replay(
        &self,
        agent_key: &str,
        events: Vec<Result<StreamEvent, ParseDiagnostic>>,
    ) -> ExecutionResult<AgentReply> {
        let agent = self
            .catalog
            .get(agent_key)
            .ok_or_else(|| ExecutionError::UnknownAgent(agent_key.to_string()))?;

        let mut tracker = PhaseTracker::new(agent_key);
        tracker.advance(RequestPhase::Dispatching)?;
        tracker.advance(RequestPhase::Streaming)?;

        let mut parser = ResponseParser::new(self.markers.clone());
        for event in events {
            match event {
                Ok(event) => Self::push(&mut parser, event, &mut tracker)?,
                Err(diagnostic) => parser.record(diagnostic),
            }
        }

        tracker.advance(RequestPhase::Assembling)?;
        let parsed = parser.finish(&self.catalog);
        self.render(agent, agent_key == self.router_key, parsed, &mut tracker)
    }

    async fn consume(
        &self,
        mut stream: EventStream,
        tracker: &mut PhaseTracker,
    ) -> ExecutionResult<ParsedResult> {
        tracker.advance(RequestPhase::Streaming)?;
        let mut parser = ResponseParser::new(self.markers.clone());

        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => Self::push(&mut parser, event, tracker)?,
                Err(err) => {
                    parser.interrupt(&err);
                    break;
                }
            }
        }

        tracker.advance(RequestPhase::Assembling)?;
        Ok(parser.finish(&self.catalog))
    }

    fn push(
        parser: &mut ResponseParser,
        event: StreamEvent,
        tracker: &mut PhaseTracker,
    ) -> ExecutionResult<()> {
        let phase = if event.is_trace() {
            RequestPhase::TraceProcessing
        } else {
            RequestPhase::Streaming
        };
        tracker.advance(phase)?;
        parser.push(event);
        Ok(())
    }

    fn render(
        &self,
        agent: &AgentDescriptor,
        is_router: bool,
        parsed: ParsedResult,
        tracker: &mut PhaseTracker,
    ) -> ExecutionResult<AgentReply> {
        tracker.advance(RequestPhase::Classifying)?;
        let classification = classify(&parsed, agent, is_router, &self.catalog);
        tracker.advance(RequestPhase::Done(Outcome::Success))?;

        if !parsed.errors.is_empty() {
            debug!(agent = %agent.key, diagnostics = parsed.errors.len(), "Parse diagnostics recorded");
        }
        info!(
            agent = %agent.key,
            collaboration = classification.collaboration_detected,
            collaborators = parsed.collaborators.len(),
            "Agent replied"
        );

        Ok(AgentReply {
            agent_key: agent.key.clone(),
            agent_name: agent.name.clone(),
            agent_icon: agent.icon.clone(),
            text: classification.rendered,
            collaboration_detected: classification.collaboration_detected,
            parsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::config::IconMatching;
    use crate::agents::domain::Observation;
    use crate::agents::error::RuntimeError;
    use crate::agents::parser::default_markers;
    use crate::agents::retry::RetryPolicy;
    use crate::agents::runtime::{ScriptedResponse, ScriptedRuntime};
    use std::time::Duration;

    fn descriptor(key: &str, name: &str, configured: bool) -> AgentDescriptor {
        AgentDescriptor {
            key: key.to_string(),
            name: name.to_string(),
            icon: "🎯".to_string(),
            description: String::new(),
            agent_id: if configured { format!("{}-id", key) } else { String::new() },
            alias_id: if configured { format!("{}-alias", key) } else { String::new() },
        }
    }

    fn executor(runtime: Arc<ScriptedRuntime>) -> AgentExecutor {
        let catalog = AgentCatalog::new(
            vec![
                descriptor("router", "Router Agent", true),
                descriptor("quality", "Quality Agent", true),
                descriptor("drafter", "Drafting Agent", false),
            ],
            IconMatching::Heuristic,
        );
        AgentExecutor::new(
            RetryingInvoker::new(runtime, RetryPolicy::new(3, Duration::from_millis(10))),
            Arc::new(catalog),
            "router",
            default_markers(),
        )
    }

    #[tokio::test]
    async fn test_router_input_is_wrapped() {
        let runtime = Arc::new(ScriptedRuntime::repeating(vec![StreamEvent::text("ok")], 2));
        let executor = executor(runtime.clone());

        executor.execute("router", "hello", "s1").await.unwrap();
        executor.execute("quality", "hello", "s1").await.unwrap();

        let requests = runtime.requests();
        assert!(requests[0].input_text.starts_with("Please orchestrate and collaborate"));
        assert_eq!(requests[0].agent_id, "router-id");
        assert!(requests[0].enable_trace);
        assert!(!requests[0].end_session);
        assert_eq!(requests[1].input_text, "hello");
        assert_eq!(requests[1].session_id, "s1");
    }

    #[tokio::test]
    async fn test_unconfigured_agent_fails_before_call() {
        let runtime = Arc::new(ScriptedRuntime::default());
        let result = executor(runtime.clone()).execute("drafter", "hi", "s").await;
        assert!(matches!(result, Err(ExecutionError::Configuration(_))));
        assert_eq!(runtime.calls(), 0);

        let result = executor(runtime.clone()).execute("missing", "hi", "s").await;
        assert!(matches!(result, Err(ExecutionError::UnknownAgent(_))));
    }

    #[tokio::test]
    async fn test_router_collaboration_rendered() {
        let runtime = Arc::new(ScriptedRuntime::new(vec![ScriptedResponse::Events(vec![
            StreamEvent::observation(Observation::collaborator("QualityAgent", "Looks good")),
            StreamEvent::observation(Observation::finish("All checks passed")),
        ])]));

        let reply = executor(runtime).execute("router", "review", "s").await.unwrap();
        assert!(reply.collaboration_detected);
        assert!(reply.text.starts_with("🎯 **Orchestration Completed**"));
        assert!(reply.text.contains("Looks good"));
    }

    #[tokio::test]
    async fn test_interrupted_stream_keeps_partial_answer() {
        let runtime = Arc::new(ScriptedRuntime::new(vec![ScriptedResponse::Interrupted(
            vec![StreamEvent::text("partial")],
            RuntimeError::Stream("connection reset".to_string()),
        )]));

        let reply = executor(runtime.clone()).execute("quality", "q", "s").await.unwrap();
        assert_eq!(reply.text, "partial");
        assert!(matches!(
            reply.parsed.errors[0],
            ParseDiagnostic::StreamInterrupted(_)
        ));
        assert_eq!(runtime.calls(), 1);
    }

    #[test]
    fn test_replay_recorded_events() {
        let executor = executor(Arc::new(ScriptedRuntime::default()));
        let reply = executor
            .replay(
                "router",
                vec![
                    Ok(StreamEvent::text("Direct answer")),
                    Err(ParseDiagnostic::TraceParse("bad".to_string())),
                ],
            )
            .unwrap();
        assert_eq!(reply.text, "🎯 **Router Agent (Direct Response):**\n\nDirect answer");
        assert_eq!(reply.parsed.errors.len(), 1);
    }
}
