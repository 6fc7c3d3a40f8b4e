//! Agent runtime port
//!
//! Abstracts the managed agent service's `invoke` call so the executor can
//! run against the real service or a scripted stand-in.

mod bedrock;
mod scripted;

pub use bedrock::BedrockRuntime;
pub use scripted::{ScriptedResponse, ScriptedRuntime};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::agents::domain::StreamEvent;
use crate::agents::error::RuntimeError;

/// Response stream of one accepted invocation
pub type EventStream = BoxStream<'static, Result<StreamEvent, RuntimeError>>;

/// Parameters of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeRequest {
    pub agent_id: String,
    pub alias_id: String,
    pub session_id: String,
    pub input_text: String,
    pub enable_trace: bool,
    pub end_session: bool,
}

impl InvokeRequest {
    /// Request with tracing on and the service session kept open
    pub fn new(
        agent_id: impl Into<String>,
        alias_id: impl Into<String>,
        session_id: impl Into<String>,
        input_text: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            alias_id: alias_id.into(),
            session_id: session_id.into(),
            input_text: input_text.into(),
            enable_trace: true,
            end_session: false,
        }
    }
}

/// The external agent invocation service
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Runtime name, for logs
    fn name(&self) -> &str;

    /// Invoke an agent. An `Err` means the call was rejected before any
    /// event was produced; errors inside the stream are mid-stream failures.
    async fn invoke(&self, request: InvokeRequest) -> Result<EventStream, RuntimeError>;
}
