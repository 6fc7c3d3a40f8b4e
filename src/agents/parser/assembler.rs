//! Response assembler: collaborator synthesis and line deduplication

use std::collections::HashSet;

use crate::agents::config::AgentCatalog;
use crate::agents::domain::ParsedResult;

/// Apply the post-stream passes to a parsed result
pub(crate) fn assemble(result: &mut ParsedResult, catalog: &AgentCatalog) {
    if result.final_response.trim().is_empty() && !result.collaborators.is_empty() {
        result.final_response = synthesize(result, catalog);
    }

    if !result.final_response.is_empty() {
        result.final_response = dedup_lines(&result.final_response);
    }
}

/// Build an answer from collaborator responses alone
pub fn synthesize(result: &ParsedResult, catalog: &AgentCatalog) -> String {
    result
        .collaborators
        .iter()
        .map(|(name, collaborator)| {
            format!(
                "{} **{}**\n{}",
                catalog.resolve_icon(name),
                name,
                collaborator.response
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Trim, then drop blank lines and exact repeats of earlier lines
pub fn dedup_lines(text: &str) -> String {
    let mut seen = HashSet::new();
    text.trim()
        .split('\n')
        .filter(|line| !line.trim().is_empty() && seen.insert(*line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::config::{AgentDescriptor, IconMatching, FALLBACK_ICON};
    use crate::agents::domain::{CollaboratorResponse, SourceKind};

    fn catalog() -> AgentCatalog {
        AgentCatalog::new(
            vec![AgentDescriptor {
                key: "quality".to_string(),
                name: "Quality Agent".to_string(),
                icon: "🔍".to_string(),
                description: String::new(),
                agent_id: String::new(),
                alias_id: String::new(),
            }],
            IconMatching::Heuristic,
        )
    }

    fn with_collaborators(pairs: &[(&str, &str)]) -> ParsedResult {
        let mut result = ParsedResult::default();
        for (name, response) in pairs {
            result.collaborators.insert(
                name.to_string(),
                CollaboratorResponse {
                    response: response.to_string(),
                    source_kind: SourceKind::Collaborator,
                },
            );
        }
        result
    }

    #[test]
    fn test_dedup_lines() {
        assert_eq!(dedup_lines("A\nB\nA\n\nB"), "A\nB");
    }

    #[test]
    fn test_dedup_is_exact_match() {
        assert_eq!(dedup_lines("Line\nline\nLine \nend"), "Line\nline\nLine \nend");
    }

    #[test]
    fn test_dedup_trims_outer_whitespace() {
        assert_eq!(dedup_lines("\n\n  hello\nworld  \n\n"), "hello\nworld");
    }

    #[test]
    fn test_synthesis_when_final_blank() {
        let mut result = with_collaborators(&[("QualityReviewer", "All clauses valid")]);
        result.final_response = "  ".to_string();
        assemble(&mut result, &catalog());
        assert_eq!(result.final_response, "🔍 **QualityReviewer**\nAll clauses valid");
    }

    #[test]
    fn test_synthesis_joins_with_blank_line_then_dedups() {
        let mut result = with_collaborators(&[("Alpha", "shared"), ("Beta", "shared")]);
        assemble(&mut result, &catalog());
        // The blank separator and the repeated "shared" line are dropped
        assert_eq!(
            result.final_response,
            format!("{0} **Alpha**\nshared\n{0} **Beta**", FALLBACK_ICON)
        );
    }

    #[test]
    fn test_existing_answer_not_replaced() {
        let mut result = with_collaborators(&[("Alpha", "ignored")]);
        result.final_response = "Router answer".to_string();
        assemble(&mut result, &catalog());
        assert_eq!(result.final_response, "Router answer");
    }

    #[test]
    fn test_empty_stays_empty() {
        let mut result = ParsedResult::default();
        assemble(&mut result, &catalog());
        assert!(result.final_response.is_empty());
    }
}
