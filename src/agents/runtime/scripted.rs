//! In-process runtime replaying scripted responses, for tests and replays

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use super::{AgentRuntime, EventStream, InvokeRequest};
use crate::agents::domain::StreamEvent;
use crate::agents::error::RuntimeError;

/// One scripted outcome of an invocation
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// The call succeeds and streams these events
    Events(Vec<StreamEvent>),
    /// The call is rejected
    Reject(RuntimeError),
    /// The call succeeds, streams the events, then fails
    Interrupted(Vec<StreamEvent>, RuntimeError),
}

/// Runtime answering invocations from a queue of scripted responses.
///
/// Every request is recorded. Once the queue is empty, invocations are
/// rejected.
#[derive(Debug, Default)]
pub struct ScriptedRuntime {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<InvokeRequest>>,
}

impl ScriptedRuntime {
    pub fn new(responses: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Runtime that answers every call with the same events
    pub fn repeating(events: Vec<StreamEvent>, times: usize) -> Self {
        Self::new(std::iter::repeat(ScriptedResponse::Events(events)).take(times))
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<InvokeRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Number of invocations received so far
    pub fn calls(&self) -> usize {
        self.requests.lock().map_or(0, |requests| requests.len())
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, request: InvokeRequest) -> Result<EventStream, RuntimeError> {
        self.requests
            .lock()
            .map_err(|e| RuntimeError::Client(e.to_string()))?
            .push(request);

        let next = self
            .responses
            .lock()
            .map_err(|e| RuntimeError::Client(e.to_string()))?
            .pop_front();

        match next {
            Some(ScriptedResponse::Events(events)) => {
                Ok(stream::iter(events.into_iter().map(Ok)).boxed())
            }
            Some(ScriptedResponse::Reject(error)) => Err(error),
            Some(ScriptedResponse::Interrupted(events, error)) => Ok(stream::iter(
                events
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(error))),
            )
            .boxed()),
            None => Err(RuntimeError::Invocation(
                "no scripted response left".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let runtime = ScriptedRuntime::new(vec![
            ScriptedResponse::Reject(RuntimeError::Invocation("ThrottlingException".to_string())),
            ScriptedResponse::Events(vec![StreamEvent::text("hi")]),
        ]);

        let request = InvokeRequest::new("A", "B", "s", "q");
        assert!(runtime.invoke(request.clone()).await.is_err());

        let events: Vec<_> = runtime.invoke(request).await.unwrap().collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(runtime.calls(), 2);
        assert_eq!(runtime.requests()[0].agent_id, "A");
    }

    #[tokio::test]
    async fn test_interrupted_stream_ends_with_error() {
        let runtime = ScriptedRuntime::new(vec![ScriptedResponse::Interrupted(
            vec![StreamEvent::text("partial")],
            RuntimeError::Stream("reset".to_string()),
        )]);
        let events: Vec<_> = runtime
            .invoke(InvokeRequest::new("A", "B", "s", "q"))
            .await
            .unwrap()
            .collect()
            .await;
        assert!(events[0].is_ok());
        assert!(events[1].is_err());
    }

    #[tokio::test]
    async fn test_exhausted_queue_rejects() {
        let runtime = ScriptedRuntime::default();
        assert!(runtime.invoke(InvokeRequest::new("A", "B", "s", "q")).await.is_err());
    }
}
