//! Error types for agent invocation and response parsing

use serde::Serialize;
use thiserror::Error;

/// Maximum number of characters of a raw service error kept in user-facing messages
pub const RAW_ERROR_CHARS: usize = 200;

/// Errors raised by an agent runtime (the external invocation service)
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// The invocation was rejected before a response stream was opened
    #[error("Invocation failed: {0}")]
    Invocation(String),

    /// The response stream failed after the invocation was accepted
    #[error("Stream error: {0}")]
    Stream(String),

    /// The runtime client could not be built
    #[error("Client error: {0}")]
    Client(String),
}

impl RuntimeError {
    /// The service-provided message, without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            RuntimeError::Invocation(msg) | RuntimeError::Stream(msg) | RuntimeError::Client(msg) => msg,
        }
    }

    /// Classify this error for retry decisions
    pub fn class(&self) -> ErrorClass {
        ErrorClass::classify(self.message())
    }
}

/// Failure class of an invocation error, derived from its message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Throttling or rate limiting (retryable)
    Throttling,
    /// Request timed out (retryable)
    Timeout,
    /// Missing permissions (fatal)
    AccessDenied,
    /// Unknown agent or alias (fatal)
    NotFound,
    /// Anything else (fatal)
    Unclassified,
}

impl ErrorClass {
    /// Classify an error message by case-insensitive substring match.
    ///
    /// Checks run in a fixed order: throttling, access, not-found, timeout.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("throttling") || lower.contains("rate") {
            ErrorClass::Throttling
        } else if lower.contains("accessdenied") || lower.contains("forbidden") {
            ErrorClass::AccessDenied
        } else if lower.contains("resourcenotfound") || lower.contains("notfound") {
            ErrorClass::NotFound
        } else if lower.contains("timeout") {
            ErrorClass::Timeout
        } else {
            ErrorClass::Unclassified
        }
    }

    /// Whether another attempt may succeed
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorClass::Throttling | ErrorClass::Timeout)
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Throttling => write!(f, "throttling"),
            ErrorClass::Timeout => write!(f, "timeout"),
            ErrorClass::AccessDenied => write!(f, "access_denied"),
            ErrorClass::NotFound => write!(f, "not_found"),
            ErrorClass::Unclassified => write!(f, "unclassified"),
        }
    }
}

/// Request-level failures. The `Display` output is the user-visible message.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Rate limit still hit after the last attempt
    #[error("❌ Rate limit exceeded for {agent}. Try again later.")]
    Throttled { agent: String },

    /// Timed out on every attempt
    #[error("❌ Timeout for {agent}. The orchestration may take longer than expected.")]
    TimedOut { agent: String },

    /// Permission problem, never retried
    #[error("❌ Access denied for {agent}. Check the IAM permissions and the agent configuration.")]
    AccessDenied { agent: String },

    /// Unknown agent id or alias, never retried
    #[error("❌ Agent {agent} not found. Check the ID ({agent_id}) and the alias ({alias_id}).")]
    NotFound {
        agent: String,
        agent_id: String,
        alias_id: String,
    },

    /// Any other service error
    #[error("❌ Error {agent}: {message}")]
    Unclassified { agent: String, message: String },

    /// The catalog entry cannot be invoked
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No catalog entry for this key
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    /// Internal invariant violated
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Recovered, per-fragment or per-trace problems collected while parsing
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ParseDiagnostic {
    /// Chunk bytes could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Chunk carried a known system-error marker and was dropped
    #[error("Filtered system error: {0}")]
    FilteredSystemError(String),

    /// Trace item had an unexpected shape and was skipped
    #[error("Trace parse error: {0}")]
    TraceParse(String),

    /// The stream failed midway; the partial result was kept
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}

/// Result type alias for request execution
pub type ExecutionResult<T> = Result<T, ExecutionError>;
