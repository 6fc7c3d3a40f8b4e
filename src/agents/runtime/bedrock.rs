//! Amazon Bedrock Agents runtime

use std::time::Duration;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_bedrockagentruntime::error::DisplayErrorContext;
use aws_sdk_bedrockagentruntime::types::{
    Observation as SdkObservation, OrchestrationTrace, PostProcessingTrace, PreProcessingTrace,
    ResponseStream, Trace,
};
use aws_sdk_bedrockagentruntime::Client;
use futures::stream::{self, StreamExt};
use tracing::{debug, trace};

use super::{AgentRuntime, EventStream, InvokeRequest};
use crate::agents::domain::{
    Observation, StreamEvent, TraceBody, TraceStep, UNNAMED_COLLABORATOR,
};
use crate::agents::error::RuntimeError;
use crate::config::RuntimeSettings;

/// Runtime backed by the `bedrock-agent-runtime` service
#[derive(Debug, Clone)]
pub struct BedrockRuntime {
    client: Client,
}

impl BedrockRuntime {
    /// Build a client from runtime settings
    pub async fn from_settings(settings: &RuntimeSettings) -> anyhow::Result<Self> {
        let sdk_config = Self::build_aws_config(settings).await?;
        Ok(Self {
            client: Client::new(&sdk_config),
        })
    }

    /// Build AWS SDK configuration with optional region, endpoint and credentials
    async fn build_aws_config(settings: &RuntimeSettings) -> anyhow::Result<aws_config::SdkConfig> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
                    .read_timeout(Duration::from_secs(settings.read_timeout_secs))
                    .build(),
            )
            .retry_config(RetryConfig::adaptive().with_max_attempts(settings.sdk_max_attempts));

        if let Some(region) = &settings.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        match (&settings.access_key_id, &settings.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => {
                let credentials = aws_sdk_bedrockagentruntime::config::Credentials::new(
                    access_key_id.clone(),
                    secret_access_key.clone(),
                    None,
                    None,
                    "chorus-settings",
                );
                loader = loader.credentials_provider(credentials);
                debug!("Agent runtime using explicit credentials");
            }
            (None, None) => debug!("Agent runtime using default credential chain"),
            _ => anyhow::bail!(
                "runtime.access_key_id and runtime.secret_access_key must be set together"
            ),
        }

        Ok(loader.load().await)
    }
}

#[async_trait]
impl AgentRuntime for BedrockRuntime {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn invoke(&self, request: InvokeRequest) -> Result<EventStream, RuntimeError> {
        let output = self
            .client
            .invoke_agent()
            .agent_id(request.agent_id)
            .agent_alias_id(request.alias_id)
            .session_id(request.session_id)
            .input_text(request.input_text)
            .enable_trace(request.enable_trace)
            .end_session(request.end_session)
            .send()
            .await
            .map_err(|e| RuntimeError::Invocation(DisplayErrorContext(&e).to_string()))?;

        // The receiver is dropped after the first error
        let events = stream::unfold(Some(output.completion), |receiver| async move {
            let mut receiver = receiver?;
            loop {
                match receiver.recv().await {
                    Ok(Some(item)) => {
                        if let Some(event) = map_response(item) {
                            return Some((Ok(event), Some(receiver)));
                        }
                    }
                    Ok(None) => return None,
                    Err(e) => {
                        let error = RuntimeError::Stream(DisplayErrorContext(&e).to_string());
                        return Some((Err(error), None));
                    }
                }
            }
        });

        Ok(events.boxed())
    }
}

fn map_response(item: ResponseStream) -> Option<StreamEvent> {
    match item {
        ResponseStream::Chunk(part) => part
            .bytes()
            .map(|blob| StreamEvent::bytes(blob.as_ref().to_vec())),
        ResponseStream::Trace(part) => {
            let sections = part.trace().and_then(map_trace).into_iter().collect();
            Some(StreamEvent::collaborator_trace(
                part.collaborator_name(),
                sections,
            ))
        }
        other => {
            trace!(item = ?other, "Ignoring response stream item");
            None
        }
    }
}

fn map_trace(trace: &Trace) -> Option<TraceBody> {
    match trace {
        Trace::PreProcessingTrace(PreProcessingTrace::ModelInvocationInput(input)) => Some(
            TraceBody::PreProcessing(processing_step(input.text())),
        ),
        Trace::PostProcessingTrace(PostProcessingTrace::ModelInvocationInput(input)) => Some(
            TraceBody::PostProcessing(processing_step(input.text())),
        ),
        Trace::OrchestrationTrace(orchestration) => {
            map_orchestration(orchestration).map(TraceBody::Orchestration)
        }
        _ => None,
    }
}

fn processing_step(text: Option<&str>) -> TraceStep {
    TraceStep {
        reasoning_text: text.map(str::to_string),
        observation: None,
    }
}

fn map_orchestration(trace: &OrchestrationTrace) -> Option<TraceStep> {
    match trace {
        OrchestrationTrace::Rationale(rationale) => {
            rationale.text().map(TraceStep::reasoning)
        }
        OrchestrationTrace::ModelInvocationInput(input) => input.text().map(TraceStep::reasoning),
        OrchestrationTrace::Observation(observation) => {
            map_observation(observation).map(TraceStep::observation)
        }
        _ => None,
    }
}

fn map_observation(observation: &SdkObservation) -> Option<Observation> {
    match observation.r#type()?.as_str() {
        "AGENT_COLLABORATOR" => {
            let output = observation.agent_collaborator_invocation_output()?;
            let text = output.output()?.text()?;
            Some(Observation::collaborator(
                output
                    .agent_collaborator_name()
                    .unwrap_or(UNNAMED_COLLABORATOR),
                text,
            ))
        }
        "FINISH" => observation
            .final_response()
            .and_then(|response| response.text())
            .map(Observation::finish),
        "ACTION_GROUP" => observation
            .action_group_invocation_output()
            .map(|output| Observation::action(output.text().unwrap_or_default())),
        "KNOWLEDGE_BASE" => observation
            .knowledge_base_lookup_output()
            .map(|output| Observation::knowledge_base(output.retrieved_references().len())),
        other => Some(Observation::Unrecognized {
            kind: other.to_string(),
        }),
    }
}
