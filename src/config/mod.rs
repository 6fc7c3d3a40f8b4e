use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

pub mod validator;

use crate::agents::config::{AgentCatalog, AgentDescriptor, IconMatching};
use crate::agents::parser::default_markers;
use crate::agents::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::cli::Cli;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "chorus.toml";

/// Prefix of environment overrides, e.g. `CHORUS__RUNTIME__REGION`
const ENV_PREFIX: &str = "CHORUS";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub runtime: RuntimeSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub parser: ParserSettings,
    /// Catalog key of the router agent
    #[serde(default = "default_router")]
    pub router: String,
    /// Agent catalog, in display order
    #[serde(default)]
    pub agents: Vec<AgentDescriptor>,
}

fn default_router() -> String {
    "router".to_string()
}

/// Connection to the agent service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeSettings {
    /// AWS region; the default provider chain is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Custom endpoint URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Long orchestrations stream for a long time before finishing
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Attempts made by the SDK's own adaptive retry layer
    #[serde(default = "default_sdk_max_attempts")]
    pub sdk_max_attempts: u32,
    /// Explicit credentials; both or neither
    #[serde(default, skip_serializing)]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub secret_access_key: Option<String>,
}

fn default_connect_timeout() -> u64 {
    120
}

fn default_read_timeout() -> u64 {
    7200
}

fn default_sdk_max_attempts() -> u32 {
    5
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            sdk_max_attempts: default_sdk_max_attempts(),
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

/// Application-level retries around each invocation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    2000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParserSettings {
    /// Chunks containing any of these are dropped from the answer
    #[serde(default = "default_markers")]
    pub system_error_markers: Vec<String>,
    #[serde(default)]
    pub icon_matching: IconMatching,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            system_error_markers: default_markers(),
            icon_matching: IconMatching::default(),
        }
    }
}

impl Settings {
    /// Load from the default file and environment
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_path(DEFAULT_CONFIG_FILE)
    }

    /// Load with CLI overrides applied last
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::from_path(&cli.config)?;

        // Apply CLI overrides (CLI > env vars > config file)
        settings.apply_cli_overrides(cli);
        Ok(settings)
    }

    /// Load from a file (optional) and `CHORUS__*` environment variables
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        // A missing file leaves the defaults and the environment
        let s = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            // Fallback values, overridden by the file and the environment
            .set_default("router", default_router())?
            .set_default("retry.max_attempts", i64::from(default_max_attempts()))?
            .set_default("retry.retry_delay_ms", default_retry_delay_ms() as i64)?
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        Ok(settings)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(region) = &cli.region {
            self.runtime.region = Some(region.clone());
        }
        if let Some(router) = &cli.router {
            self.router = router.clone();
        }
    }

    /// Build the agent catalog
    pub fn catalog(&self) -> AgentCatalog {
        AgentCatalog::new(self.agents.clone(), self.parser.icon_matching)
    }
}
