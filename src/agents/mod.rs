//! Agent invocation and response handling
//!
//! This module turns one user query into calls to the managed agent service
//! and renders the streamed, trace-annotated answers:
//! - Single agent (one request → one response)
//! - Router orchestration (the router delegates to collaborator agents)
//! - Sequences (agents execute in order, each seeing the previous answer)
//!
//! ## Architecture
//!
//! - `domain/` - Core types (StreamEvent, ParsedResult, Message)
//! - `runtime/` - The invocation port and its implementations
//! - `parser/` - Stream reader, trace interpreter, assembler, classifier
//! - `retry` / `executor` - Retrying invocation of one agent
//! - `orchestration/` - Workflow modes

pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod executor;
pub mod orchestration;
pub mod parser;
pub mod phase;
pub mod prompt;
pub mod retry;
pub mod runtime;
pub mod session;

// Re-export commonly used types
pub use config::*;
pub use domain::*;
pub use error::*;
pub use executor::{AgentExecutor, AgentReply};
pub use orchestration::{OrchestrationEngine, WorkflowReport, WorkflowResult};
pub use runtime::{AgentRuntime, BedrockRuntime, InvokeRequest, ScriptedResponse, ScriptedRuntime};
pub use session::{ChatSession, WorkflowMode};
