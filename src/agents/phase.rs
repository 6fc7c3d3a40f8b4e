//! Per-request phase tracking

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::agents::error::ExecutionError;

/// Terminal outcome of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Error,
}

/// Where a request is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    Idle,
    Dispatching,
    Streaming,
    TraceProcessing,
    Assembling,
    Classifying,
    Done(Outcome),
}

impl RequestPhase {
    pub fn is_done(self) -> bool {
        matches!(self, RequestPhase::Done(_))
    }

    /// Whether `next` may follow `self`
    pub fn can_advance_to(self, next: RequestPhase) -> bool {
        use RequestPhase::*;

        match (self, next) {
            (Done(_), _) => false,
            (_, Done(Outcome::Error)) => true,
            (Idle, Dispatching)
            | (Dispatching, Streaming)
            | (Streaming, TraceProcessing)
            | (TraceProcessing, Streaming)
            | (Streaming, Assembling)
            | (TraceProcessing, Assembling)
            | (Assembling, Classifying)
            | (Classifying, Done(Outcome::Success)) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestPhase::Idle => write!(f, "idle"),
            RequestPhase::Dispatching => write!(f, "dispatching"),
            RequestPhase::Streaming => write!(f, "streaming"),
            RequestPhase::TraceProcessing => write!(f, "trace_processing"),
            RequestPhase::Assembling => write!(f, "assembling"),
            RequestPhase::Classifying => write!(f, "classifying"),
            RequestPhase::Done(Outcome::Success) => write!(f, "done(success)"),
            RequestPhase::Done(Outcome::Error) => write!(f, "done(error)"),
        }
    }
}

/// Rejected phase transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid phase transition: {from} -> {to}")]
pub struct PhaseError {
    pub from: RequestPhase,
    pub to: RequestPhase,
}

impl From<PhaseError> for ExecutionError {
    fn from(err: PhaseError) -> Self {
        ExecutionError::Internal(err.to_string())
    }
}

/// Tracks one request's phase, rejecting invalid transitions
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    agent: String,
    phase: RequestPhase,
}

impl PhaseTracker {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            phase: RequestPhase::Idle,
        }
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    /// Move to `next`. Re-entering the current phase is a no-op.
    pub fn advance(&mut self, next: RequestPhase) -> Result<(), PhaseError> {
        if next == self.phase {
            return Ok(());
        }
        if !self.phase.can_advance_to(next) {
            return Err(PhaseError {
                from: self.phase,
                to: next,
            });
        }
        debug!(agent = %self.agent, from = %self.phase, to = %next, "Request phase");
        self.phase = next;
        Ok(())
    }

    /// Mark the request failed, unless it already finished
    pub fn fail(&mut self) {
        if !self.phase.is_done() {
            debug!(agent = %self.agent, from = %self.phase, "Request failed");
            self.phase = RequestPhase::Done(Outcome::Error);
        }
    }
}
