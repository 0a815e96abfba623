//! Runtime configuration.
//!
//! Configuration is applied per class through
//! [`ClassBuilder::config`](crate::model::ClassBuilder::config). Missing
//! fields fall back to their defaults.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What happens to the old forwarding handler when an alias is retargeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetachPolicy {
    /// Clear the handler's owner link and remove it from the old target's
    /// observer list.
    #[default]
    Unsubscribe,

    /// Only clear the handler's owner link. The inert handler stays
    /// registered on the old target until that attribute next notifies,
    /// at which point the pool prunes it.
    Soft,
}

/// Top-level model configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub detach: DetachPolicy,
}

impl ModelConfig {
    /// Load config from a JSON string, falling back to defaults for missing fields.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_unsubscribes() {
        assert_eq!(ModelConfig::default().detach, DetachPolicy::Unsubscribe);
    }

    #[test]
    fn empty_json_uses_defaults() {
        let config = ModelConfig::from_json("{}").unwrap();
        assert_eq!(config, ModelConfig::default());
    }

    #[test]
    fn parses_soft_policy() {
        let config = ModelConfig::from_json(r#"{ "detach": "soft" }"#).unwrap();
        assert_eq!(config.detach, DetachPolicy::Soft);
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = ModelConfig::from_json(r#"{ "detach": "sometimes" }"#).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidConfig(_)));
    }
}
