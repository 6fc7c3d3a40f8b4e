//! Serde mirror of the service's JSON trace shape
//!
//! Unknown keys are ignored; missing keys deserialize as `None`. Only type
//! mismatches fail, and those surface as trace parse diagnostics.

use serde::Deserialize;
use serde_json::Value;

use crate::agents::domain::{Observation, StreamEvent, TraceBody, TraceStep, UNNAMED_COLLABORATOR};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TracePart {
    collaborator_name: Option<String>,
    trace: Option<TraceSections>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TraceSections {
    pre_processing_trace: Option<ProcessingTrace>,
    orchestration_trace: Option<OrchestrationTrace>,
    post_processing_trace: Option<ProcessingTrace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessingTrace {
    model_invocation_input: Option<TextPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrchestrationTrace {
    model_invocation_input: Option<TextPayload>,
    rationale: Option<TextPayload>,
    observation: Option<WireObservation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireObservation {
    #[serde(rename = "type")]
    kind: Option<String>,
    agent_collaborator_invocation_output: Option<CollaboratorOutput>,
    final_response: Option<TextPayload>,
    action_group_invocation_output: Option<TextPayload>,
    knowledge_base_lookup_output: Option<KnowledgeBaseLookupOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollaboratorOutput {
    agent_collaborator_name: Option<String>,
    output: Option<TextPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KnowledgeBaseLookupOutput {
    #[serde(default)]
    retrieved_references: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TextPayload {
    text: Option<String>,
}

impl TextPayload {
    fn into_text(payload: Option<TextPayload>) -> Option<String> {
        payload.and_then(|p| p.text)
    }
}

impl From<TracePart> for StreamEvent {
    fn from(part: TracePart) -> Self {
        let sections = part.trace.unwrap_or_default();
        let mut bodies = Vec::new();

        if let Some(pre) = sections.pre_processing_trace {
            bodies.push(TraceBody::PreProcessing(pre.into()));
        }
        if let Some(orchestration) = sections.orchestration_trace {
            bodies.push(TraceBody::Orchestration(orchestration.into()));
        }
        if let Some(post) = sections.post_processing_trace {
            bodies.push(TraceBody::PostProcessing(post.into()));
        }

        StreamEvent::collaborator_trace(part.collaborator_name, bodies)
    }
}

impl From<ProcessingTrace> for TraceStep {
    fn from(trace: ProcessingTrace) -> Self {
        TraceStep {
            reasoning_text: TextPayload::into_text(trace.model_invocation_input),
            observation: None,
        }
    }
}

impl From<OrchestrationTrace> for TraceStep {
    fn from(trace: OrchestrationTrace) -> Self {
        let reasoning_text = TextPayload::into_text(trace.rationale)
            .or_else(|| TextPayload::into_text(trace.model_invocation_input));

        TraceStep {
            reasoning_text,
            observation: trace.observation.and_then(WireObservation::into_observation),
        }
    }
}

impl WireObservation {
    fn into_observation(self) -> Option<Observation> {
        match self.kind.as_deref()? {
            "AGENT_COLLABORATOR" => {
                let output = self.agent_collaborator_invocation_output?;
                let text = TextPayload::into_text(output.output)?;
                let agent_name = output
                    .agent_collaborator_name
                    .unwrap_or_else(|| UNNAMED_COLLABORATOR.to_string());
                Some(Observation::AgentCollaboratorOutput { agent_name, text })
            }
            "FINISH" => TextPayload::into_text(self.final_response).map(Observation::finish),
            "ACTION_GROUP" => self
                .action_group_invocation_output
                .map(|output| Observation::action(output.text.unwrap_or_default())),
            "KNOWLEDGE_BASE" => self
                .knowledge_base_lookup_output
                .map(|output| Observation::knowledge_base(output.retrieved_references.len())),
            other => Some(Observation::Unrecognized {
                kind: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> StreamEvent {
        let part: TracePart = serde_json::from_value(value).expect("valid trace part");
        part.into()
    }

    fn single_observation(event: &StreamEvent) -> Option<&Observation> {
        match event {
            StreamEvent::TraceEvent { sections, .. } => match sections.first() {
                Some(TraceBody::Orchestration(step)) => step.observation.as_ref(),
                _ => None,
            },
            _ => None,
        }
    }

    #[test]
    fn test_collaborator_observation() {
        let event = parse(json!({
            "collaboratorName": "router",
            "trace": {
                "orchestrationTrace": {
                    "observation": {
                        "type": "AGENT_COLLABORATOR",
                        "agentCollaboratorInvocationOutput": {
                            "agentCollaboratorName": "QualityAgent",
                            "output": { "text": "Looks fine" }
                        }
                    }
                }
            }
        }));

        assert_eq!(
            single_observation(&event),
            Some(&Observation::collaborator("QualityAgent", "Looks fine"))
        );
        match event {
            StreamEvent::TraceEvent { collaborator_name, .. } => {
                assert_eq!(collaborator_name.as_deref(), Some("router"));
            }
            _ => panic!("expected trace"),
        }
    }

    #[test]
    fn test_collaborator_without_text_is_dropped() {
        let event = parse(json!({
            "trace": { "orchestrationTrace": { "observation": {
                "type": "AGENT_COLLABORATOR",
                "agentCollaboratorInvocationOutput": { "agentCollaboratorName": "X" }
            }}}
        }));
        assert_eq!(single_observation(&event), None);
    }

    #[test]
    fn test_collaborator_default_name() {
        let event = parse(json!({
            "trace": { "orchestrationTrace": { "observation": {
                "type": "AGENT_COLLABORATOR",
                "agentCollaboratorInvocationOutput": { "output": { "text": "hi" } }
            }}}
        }));
        assert_eq!(single_observation(&event), Some(&Observation::collaborator("Agent", "hi")));
    }

    #[test]
    fn test_knowledge_base_counts_references() {
        let event = parse(json!({
            "trace": { "orchestrationTrace": { "observation": {
                "type": "KNOWLEDGE_BASE",
                "knowledgeBaseLookupOutput": { "retrievedReferences": [{}, {}, {}] }
            }}}
        }));
        assert_eq!(single_observation(&event), Some(&Observation::knowledge_base(3)));
    }

    #[test]
    fn test_unknown_observation_type() {
        let event = parse(json!({
            "trace": { "orchestrationTrace": { "observation": { "type": "REPROMPT" } } }
        }));
        assert_eq!(
            single_observation(&event),
            Some(&Observation::Unrecognized { kind: "REPROMPT".to_string() })
        );
    }

    #[test]
    fn test_reasoning_prefers_rationale() {
        let event = parse(json!({
            "trace": { "orchestrationTrace": {
                "rationale": { "text": "I should ask the drafter" },
                "modelInvocationInput": { "text": "full prompt" }
            }}
        }));
        match event {
            StreamEvent::TraceEvent { sections, .. } => {
                assert_eq!(
                    sections[0],
                    TraceBody::Orchestration(TraceStep::reasoning("I should ask the drafter"))
                );
            }
            _ => panic!("expected trace"),
        }
    }

    #[test]
    fn test_all_sections_in_order() {
        let event = parse(json!({
            "trace": {
                "postProcessingTrace": { "modelInvocationInput": { "text": "post" } },
                "preProcessingTrace": { "modelInvocationInput": { "text": "pre" } }
            }
        }));
        match event {
            StreamEvent::TraceEvent { sections, .. } => {
                assert_eq!(sections.len(), 2);
                assert_eq!(sections[0], TraceBody::PreProcessing(TraceStep::reasoning("pre")));
                assert_eq!(sections[1], TraceBody::PostProcessing(TraceStep::reasoning("post")));
            }
            _ => panic!("expected trace"),
        }
    }

    #[test]
    fn test_type_mismatch_fails() {
        let result: Result<TracePart, _> = serde_json::from_value(json!({
            "trace": { "orchestrationTrace": { "observation": { "type": 42 } } }
        }));
        assert!(result.is_err());
    }
}
