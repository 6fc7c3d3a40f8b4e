//! Static agent catalog

use serde::{Deserialize, Serialize};

/// Icon used when no catalog entry matches a collaborator name
pub const FALLBACK_ICON: &str = "🤖";

/// Catalog entry for one agent deployed on the service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentDescriptor {
    /// Unique catalog key (e.g. "router", "quality")
    pub key: String,
    /// Human-readable name
    pub name: String,
    /// Icon shown next to the agent's output
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Service-side agent identifier
    #[serde(default)]
    pub agent_id: String,
    /// Service-side agent alias identifier
    #[serde(default)]
    pub alias_id: String,
}

fn default_icon() -> String {
    FALLBACK_ICON.to_string()
}

impl AgentDescriptor {
    /// Whether both service identifiers are present
    pub fn is_configured(&self) -> bool {
        !self.agent_id.trim().is_empty() && !self.alias_id.trim().is_empty()
    }
}

/// How collaborator names reported by the service are matched to catalog entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IconMatching {
    /// Name contains the key or the first word of the display name.
    /// Agents sharing a first word ("Agent ...") can shadow each other.
    #[default]
    Heuristic,
    /// Name equals the key or the display name, ignoring case
    ExactKey,
}

impl IconMatching {
    /// Check whether `descriptor` matches the lower-cased collaborator name
    pub fn matches(self, descriptor: &AgentDescriptor, lower_name: &str) -> bool {
        let key = descriptor.key.to_lowercase();
        let display = descriptor.name.to_lowercase();

        match self {
            IconMatching::Heuristic => {
                let key_match = !key.is_empty() && lower_name.contains(&key);
                let word_match = display
                    .split_whitespace()
                    .next()
                    .map_or(false, |word| lower_name.contains(word));
                key_match || word_match
            }
            IconMatching::ExactKey => lower_name == key || lower_name == display,
        }
    }
}

/// Ordered, immutable catalog of agents, loaded once from configuration
#[derive(Debug, Clone, Default)]
pub struct AgentCatalog {
    agents: Vec<AgentDescriptor>,
    matching: IconMatching,
}

impl AgentCatalog {
    /// Create a catalog from ordered descriptors
    pub fn new(agents: Vec<AgentDescriptor>, matching: IconMatching) -> Self {
        Self { agents, matching }
    }

    /// Get an agent by key
    pub fn get(&self, key: &str) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.key == key)
    }

    /// Check whether a key is in the catalog
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate agents in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Find the catalog entry matching a collaborator name; first match wins
    pub fn find_collaborator(&self, collaborator: &str) -> Option<&AgentDescriptor> {
        let lower = collaborator.to_lowercase();
        self.agents.iter().find(|a| self.matching.matches(a, &lower))
    }

    /// Resolve the icon for a collaborator name
    pub fn resolve_icon(&self, collaborator: &str) -> &str {
        self.find_collaborator(collaborator)
            .map_or(FALLBACK_ICON, |a| a.icon.as_str())
    }

    /// Display name for a key, falling back to the key itself
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.get(key).map_or(key, |a| a.name.as_str())
    }

    /// Icon for a key, falling back to the generic icon
    pub fn icon(&self, key: &str) -> &str {
        self.get(key).map_or(FALLBACK_ICON, |a| a.icon.as_str())
    }
}
