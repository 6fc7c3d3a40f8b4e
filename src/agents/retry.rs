//! Retry/backoff invoker
//!
//! Invocation failures are classified by message. Throttling backs off
//! exponentially and timeouts retry after a flat delay; every other class
//! fails at once.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::agents::config::AgentDescriptor;
use crate::agents::error::{ErrorClass, ExecutionError, ExecutionResult, RAW_ERROR_CHARS};
use crate::agents::runtime::{AgentRuntime, EventStream, InvokeRequest};

/// Default number of attempts per invocation
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Outcome of one retry decision
#[derive(Debug)]
pub enum RetryDecision {
    /// Sleep this long, then try again
    Retry(Duration),
    /// Give up with this error
    Fail(ExecutionError),
}

/// Bounded, class-dependent retry schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay,
        }
    }

    /// Decide what follows a failed attempt. `attempt` counts from 1.
    pub fn decide(
        &self,
        class: ErrorClass,
        attempt: u32,
        agent: &AgentDescriptor,
        raw_message: &str,
    ) -> RetryDecision {
        if !class.is_retryable() || attempt >= self.max_attempts {
            return RetryDecision::Fail(Self::failure(class, agent, raw_message));
        }

        match class {
            ErrorClass::Throttling => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                RetryDecision::Retry(self.retry_delay.saturating_mul(factor))
            }
            _ => RetryDecision::Retry(self.retry_delay),
        }
    }

    /// User-facing error for a class once no retry is left
    fn failure(class: ErrorClass, agent: &AgentDescriptor, raw_message: &str) -> ExecutionError {
        let name = agent.name.clone();

        match class {
            ErrorClass::Throttling => ExecutionError::Throttled { agent: name },
            ErrorClass::Timeout => ExecutionError::TimedOut { agent: name },
            ErrorClass::AccessDenied => ExecutionError::AccessDenied { agent: name },
            ErrorClass::NotFound => ExecutionError::NotFound {
                agent: name,
                agent_id: agent.agent_id.clone(),
                alias_id: agent.alias_id.clone(),
            },
            ErrorClass::Unclassified => ExecutionError::Unclassified {
                agent: name,
                message: raw_message.chars().take(RAW_ERROR_CHARS).collect(),
            },
        }
    }
}

/// Invokes agents through a runtime, retrying per a [`RetryPolicy`]
#[derive(Clone)]
pub struct RetryingInvoker {
    runtime: Arc<dyn AgentRuntime>,
    policy: RetryPolicy,
}

impl RetryingInvoker {
    pub fn new(runtime: Arc<dyn AgentRuntime>, policy: RetryPolicy) -> Self {
        Self { runtime, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Open a response stream for `agent`, retrying the call on retryable
    /// failures. Failures inside the returned stream are not retried.
    pub async fn invoke(
        &self,
        agent: &AgentDescriptor,
        request: InvokeRequest,
    ) -> ExecutionResult<EventStream> {
        let mut attempt = 1;

        loop {
            info!(
                agent = %agent.key,
                runtime = self.runtime.name(),
                attempt,
                max_attempts = self.policy.max_attempts,
                "Invoking agent"
            );

            let err = match self.runtime.invoke(request.clone()).await {
                Ok(stream) => return Ok(stream),
                Err(err) => err,
            };

            let class = err.class();
            match self.policy.decide(class, attempt, agent, err.message()) {
                RetryDecision::Retry(delay) => {
                    warn!(
                        agent = %agent.key,
                        attempt,
                        class = %class,
                        delay_ms = delay.as_millis() as u64,
                        "Invocation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::Fail(failure) => {
                    if class == ErrorClass::Unclassified {
                        error!(agent = %agent.key, attempt, error = %err, "Invocation failed");
                    } else {
                        warn!(agent = %agent.key, attempt, class = %class, "Invocation failed");
                    }
                    return Err(failure);
                }
            }
        }
    }
}
