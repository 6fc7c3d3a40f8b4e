//! Trace interpreter
//!
//! Turns trace sections into orchestration steps and collaborator responses.

use tracing::{debug, trace};

use crate::agents::domain::{
    CollaboratorResponse, Observation, OrchestrationStep, ParsedResult, SourceKind, TraceBody,
    TraceStep,
};

/// Apply one trace event to the accumulating result
pub(crate) fn interpret(
    result: &mut ParsedResult,
    collaborator_name: Option<String>,
    sections: Vec<TraceBody>,
) {
    if let Some(name) = collaborator_name {
        result.trace_info.push(format!("Collaborator: {}", name));
    }

    for section in sections {
        match section {
            TraceBody::PreProcessing(step) => {
                if let Some(text) = non_empty(&step.reasoning_text) {
                    result.steps.push(OrchestrationStep::pre(text));
                }
            }
            TraceBody::Orchestration(step) => interpret_orchestration(result, step),
            TraceBody::PostProcessing(step) => {
                if let Some(text) = non_empty(&step.reasoning_text) {
                    result.steps.push(OrchestrationStep::post(text));
                }
            }
        }
    }
}

fn interpret_orchestration(result: &mut ParsedResult, step: TraceStep) {
    if let Some(text) = non_empty(&step.reasoning_text) {
        result.steps.push(OrchestrationStep::reasoning(text));
    }

    let Some(observation) = step.observation else {
        return;
    };

    match observation {
        Observation::AgentCollaboratorOutput { agent_name, text } => {
            debug!(collaborator = %agent_name, chars = text.chars().count(), "Collaborator responded");
            result.steps.push(OrchestrationStep::agent_response(agent_name.clone(), &text));
            result.collaborators.insert(
                agent_name,
                CollaboratorResponse {
                    response: text,
                    source_kind: SourceKind::Collaborator,
                },
            );
        }
        Observation::FinishOutput { text } => apply_finish(result, text),
        Observation::ActionGroupOutput { text } => {
            result.steps.push(OrchestrationStep::action(&text));
        }
        Observation::KnowledgeBaseOutput { reference_count } => {
            result.steps.push(OrchestrationStep::knowledge_search(reference_count));
        }
        Observation::Unrecognized { kind } => {
            trace!(kind = %kind, "Ignoring unrecognized observation");
        }
    }
}

/// Longest text wins: a later, longer orchestration summary replaces a
/// shorter answer; a shorter one never overwrites.
fn apply_finish(result: &mut ParsedResult, text: String) {
    if text.trim().is_empty() {
        return;
    }

    let current = result.final_response.chars().count();
    if result.final_response.is_empty() || current < text.chars().count() {
        result.final_response = text;
    }
}

fn non_empty(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|t| !t.is_empty())
}
