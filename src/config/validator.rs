use std::collections::HashMap;
use thiserror::Error;

use crate::agents::config::AgentDescriptor;
use crate::agents::diagnostics::SetupReport;
use crate::config::{ParserSettings, RetrySettings, RuntimeSettings, Settings};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Cross-reference error: {0}")]
    CrossReference(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

pub struct ConfigValidator;

impl ConfigValidator {
    /// Check the settings, returning every problem found
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        // Validate runtime settings
        errors.extend(Self::validate_runtime(&settings.runtime));

        // Validate retry and parser settings
        errors.extend(Self::validate_retry(&settings.retry));
        errors.extend(Self::validate_parser(&settings.parser));

        // Validate agents
        errors.extend(Self::validate_agents(&settings.agents));

        // Cross-reference validation
        errors.extend(Self::validate_cross_references(settings));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Whether every agent can actually be invoked
    pub fn setup_report(settings: &Settings) -> SetupReport {
        SetupReport::from_catalog(&settings.catalog(), &settings.router)
    }

    fn validate_runtime(runtime: &RuntimeSettings) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("runtime.connect_timeout_secs", runtime.connect_timeout_secs),
            ("runtime.read_timeout_secs", runtime.read_timeout_secs),
        ] {
            if value == 0 {
                errors.push(ValidationError::InvalidValue {
                    field: field.to_string(),
                    reason: "Timeout must be greater than 0".to_string(),
                });
            }
        }

        if runtime.sdk_max_attempts == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "runtime.sdk_max_attempts".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        // Explicit credentials need both halves
        if runtime.access_key_id.is_some() != runtime.secret_access_key.is_some() {
            errors.push(ValidationError::InvalidValue {
                field: "runtime.access_key_id".to_string(),
                reason: "access_key_id and secret_access_key must be set together".to_string(),
            });
        }

        errors
    }

    fn validate_retry(retry: &RetrySettings) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if retry.max_attempts == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "retry.max_attempts".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        errors
    }

    fn validate_parser(parser: &ParserSettings) -> Vec<ValidationError> {
        parser
            .system_error_markers
            .iter()
            .enumerate()
            .filter(|(_, marker)| marker.is_empty())
            .map(|(idx, _)| ValidationError::InvalidValue {
                field: format!("parser.system_error_markers[{}]", idx),
                reason: "An empty marker would filter every chunk".to_string(),
            })
            .collect()
    }

    fn validate_agents(agents: &[AgentDescriptor]) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut seen_keys = HashMap::new();

        for (idx, agent) in agents.iter().enumerate() {
            // Check for duplicate keys
            if let Some(prev_idx) = seen_keys.insert(&agent.key, idx) {
                errors.push(ValidationError::Duplicate(format!(
                    "Agent key '{}' appears at indices {} and {}",
                    agent.key, prev_idx, idx
                )));
            }

            // Validate required fields
            if agent.key.is_empty() {
                errors.push(ValidationError::MissingField(format!("agents[{}].key", idx)));
            }

            if agent.name.is_empty() {
                errors.push(ValidationError::MissingField(format!("agents[{}].name", idx)));
            }
        }

        errors
    }

    fn validate_cross_references(settings: &Settings) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // The router must be one of the configured agents
        if !settings.agents.iter().any(|a| a.key == settings.router) {
            errors.push(ValidationError::CrossReference(format!(
                "Router '{}' is not a configured agent",
                settings.router
            )));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(key: &str) -> AgentDescriptor {
        AgentDescriptor {
            key: key.to_string(),
            name: format!("{} agent", key),
            icon: "🤖".to_string(),
            description: String::new(),
            agent_id: "ID".to_string(),
            alias_id: "ALIAS".to_string(),
        }
    }

    fn settings(agents: Vec<AgentDescriptor>) -> Settings {
        Settings {
            runtime: RuntimeSettings::default(),
            retry: RetrySettings::default(),
            parser: ParserSettings::default(),
            router: "router".to_string(),
            agents,
        }
    }

    #[test]
    fn test_valid_settings() {
        let settings = settings(vec![agent("router"), agent("quality")]);
        assert!(ConfigValidator::validate(&settings).is_ok());
        assert!(ConfigValidator::setup_report(&settings).valid);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut settings = settings(vec![agent("quality"), agent("quality")]);
        settings.retry.max_attempts = 0;
        settings.runtime.access_key_id = Some("AKIA".to_string());

        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::Duplicate(_))));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::CrossReference(_))));
    }

    #[test]
    fn test_empty_marker_rejected() {
        let mut settings = settings(vec![agent("router")]);
        settings.parser.system_error_markers.push(String::new());
        let errors = ConfigValidator::validate(&settings).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidValue { .. }));
    }
}
