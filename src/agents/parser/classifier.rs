//! Orchestration classifier: decides whether collaboration happened and
//! renders the user-visible answer.

use serde::Serialize;

use crate::agents::config::{AgentCatalog, AgentDescriptor};
use crate::agents::domain::ParsedResult;

/// Classified, rendered outcome of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub collaboration_detected: bool,
    pub rendered: String,
}

/// Classify a parsed result for the agent that was invoked.
///
/// `is_router` selects the orchestration-aware rendering.
pub fn classify(
    parsed: &ParsedResult,
    target: &AgentDescriptor,
    is_router: bool,
    catalog: &AgentCatalog,
) -> Classification {
    let collaboration_detected = parsed.collaboration_detected();

    let rendered = if !is_router {
        if parsed.final_response.is_empty() {
            format!("⚠️ No response from {}", target.name)
        } else {
            parsed.final_response.clone()
        }
    } else if collaboration_detected {
        render_orchestration(parsed, catalog)
    } else if parsed.final_response.is_empty() {
        format!(
            "⚠️ {} did not produce a response. Check the multi-agent collaboration configuration.",
            target.name
        )
    } else {
        format!(
            "🎯 **{} (Direct Response):**\n\n{}",
            target.name, parsed.final_response
        )
    };

    Classification {
        collaboration_detected,
        rendered,
    }
}

fn render_orchestration(parsed: &ParsedResult, catalog: &AgentCatalog) -> String {
    let mut sections = Vec::new();

    if !parsed.final_response.is_empty() {
        sections.push(format!(
            "🎯 **Orchestration Completed**\n\n{}",
            parsed.final_response
        ));
    }

    if !parsed.collaborators.is_empty() {
        sections.push("\n---\n🤝 **Collaborator Details:**".to_string());
        for (name, collaborator) in &parsed.collaborators {
            sections.push(format!(
                "\n{} **{}:**\n{}",
                catalog.resolve_icon(name),
                name,
                collaborator.response
            ));
        }
    }

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::config::IconMatching;
    use crate::agents::domain::{CollaboratorResponse, OrchestrationStep, SourceKind};

    fn router() -> AgentDescriptor {
        AgentDescriptor {
            key: "router".to_string(),
            name: "Router Agent".to_string(),
            icon: "🎯".to_string(),
            description: String::new(),
            agent_id: "R".to_string(),
            alias_id: "A".to_string(),
        }
    }

    fn catalog() -> AgentCatalog {
        let negotiation = AgentDescriptor {
            key: "negotiation".to_string(),
            name: "Negotiation Agent".to_string(),
            icon: "🤝".to_string(),
            ..router()
        };
        AgentCatalog::new(vec![negotiation], IconMatching::Heuristic)
    }

    #[test]
    fn test_empty_result_not_collaborative() {
        let parsed = ParsedResult::default();
        let classification = classify(&parsed, &router(), true, &catalog());
        assert!(!classification.collaboration_detected);
        assert!(classification.rendered.starts_with("⚠️"));
    }

    #[test]
    fn test_direct_response_wrapper() {
        let parsed = ParsedResult {
            final_response: "Answer".to_string(),
            ..Default::default()
        };
        let classification = classify(&parsed, &router(), true, &catalog());
        assert_eq!(
            classification.rendered,
            "🎯 **Router Agent (Direct Response):**\n\nAnswer"
        );
    }

    #[test]
    fn test_orchestration_composite() {
        let mut parsed = ParsedResult {
            final_response: "Summary".to_string(),
            ..Default::default()
        };
        parsed.collaborators.insert(
            "NegotiationBot".to_string(),
            CollaboratorResponse {
                response: "Offer 10% less".to_string(),
                source_kind: SourceKind::Collaborator,
            },
        );

        let classification = classify(&parsed, &router(), true, &catalog());
        assert!(classification.collaboration_detected);
        assert_eq!(
            classification.rendered,
            "🎯 **Orchestration Completed**\n\nSummary\n\n---\n🤝 **Collaborator Details:**\n\n🤝 **NegotiationBot:**\nOffer 10% less"
        );
    }

    #[test]
    fn test_agent_response_step_alone_detects_collaboration() {
        let parsed = ParsedResult {
            final_response: "Summary".to_string(),
            steps: vec![OrchestrationStep::agent_response("Drafter", "draft")],
            ..Default::default()
        };
        let classification = classify(&parsed, &router(), true, &catalog());
        assert!(classification.collaboration_detected);
        assert_eq!(classification.rendered, "🎯 **Orchestration Completed**\n\nSummary");
    }

    #[test]
    fn test_non_router_verbatim() {
        let parsed = ParsedResult {
            final_response: "Draft ready".to_string(),
            ..Default::default()
        };
        let classification = classify(&parsed, &router(), false, &catalog());
        assert_eq!(classification.rendered, "Draft ready");

        let empty = classify(&ParsedResult::default(), &router(), false, &catalog());
        assert_eq!(empty.rendered, "⚠️ No response from Router Agent");
    }
}
