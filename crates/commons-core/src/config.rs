//! Session parameters with YAML loading.
//!
//! Defaults mirror the canonical constants in `commons-types`. A
//! deployment can override them from a YAML file the way the facilitator
//! host is provisioned; every field falls back to its default when
//! absent.

use std::path::Path;

use serde::Deserialize;

use commons_types::{INITIAL_TOKENS, TOTAL_ROUNDS};

/// Maximum team name length accepted at join (mirrors the UI input bound).
const DEFAULT_MAX_TEAM_NAME_LEN: usize = 15;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Tunable session parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of rounds in a full session.
    pub total_rounds: u32,
    /// Tokens each team can allocate per round.
    pub initial_tokens: u32,
    /// Fund multiplier for every round but the last.
    pub base_multiplier: u32,
    /// Fund multiplier for the final round.
    pub final_round_multiplier: u32,
    /// Maximum accepted team name length, in characters.
    pub max_team_name_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_rounds: TOTAL_ROUNDS,
            initial_tokens: INITIAL_TOKENS,
            base_multiplier: 2,
            final_round_multiplier: 3,
            max_team_name_len: DEFAULT_MAX_TEAM_NAME_LEN,
        }
    }
}

impl SessionConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Yaml`] if it cannot be parsed.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_canonical_constants() {
        let config = SessionConfig::default();
        assert_eq!(config.total_rounds, 5);
        assert_eq!(config.initial_tokens, 10);
        assert_eq!(config.base_multiplier, 2);
        assert_eq!(config.final_round_multiplier, 3);
        assert_eq!(config.max_team_name_len, 15);
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let parsed: Result<SessionConfig, _> = serde_yml::from_str("total_rounds: 3\n");
        let config = parsed.unwrap_or_default();
        assert_eq!(config.total_rounds, 3);
        assert_eq!(config.initial_tokens, 10);
    }
}
