//! Rewrite configuration
//!
//! `RewriteConfig` is the full set of knobs the pass accepts. It can be built
//! in code, deserialized from a `rebind.toml` file, and then overridden field
//! by field from the command line.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::RewriteError;

pub const DEFAULT_SCOPE_MARKER: &str = "func TestIntegration_";
pub const DEFAULT_UNIT_PREFIX: &str = "func ";
pub const DEFAULT_DISCARD: &str = "_";

/// Any call expression: a (possibly qualified) identifier followed by `(`.
pub const DEFAULT_PRODUCER_PATTERN: &str = r"[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*\s*\(";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RewriteConfig {
    /// Lines at or below this 1-based index are copied verbatim.
    pub cutoff_line: usize,
    /// Textual prefix identifying a scope-start line.
    pub scope_marker_prefix: String,
    /// Prefix of any unit header. A header that is not a scope marker
    /// closes the current scope.
    pub unit_prefix: String,
    /// Maximum lines scanned forward by the tie-break lookahead.
    /// `None` scans to the scope boundary.
    pub lookahead_horizon: Option<usize>,
    /// Regex fragment the right-hand side of a candidate must start with.
    pub producer_pattern: String,
    /// Discard placeholder of the target language.
    pub discard: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        RewriteConfig {
            cutoff_line: 0,
            scope_marker_prefix: DEFAULT_SCOPE_MARKER.to_string(),
            unit_prefix: DEFAULT_UNIT_PREFIX.to_string(),
            lookahead_horizon: None,
            producer_pattern: DEFAULT_PRODUCER_PATTERN.to_string(),
            discard: DEFAULT_DISCARD.to_string(),
        }
    }
}

impl RewriteConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cutoff(mut self, cutoff_line: usize) -> Self {
        self.cutoff_line = cutoff_line;
        self
    }

    pub fn with_marker(mut self, prefix: impl Into<String>) -> Self {
        self.scope_marker_prefix = prefix.into();
        self
    }

    pub fn with_horizon(mut self, horizon: Option<usize>) -> Self {
        self.lookahead_horizon = horizon;
        self
    }

    pub fn with_producer(mut self, pattern: impl Into<String>) -> Self {
        self.producer_pattern = pattern.into();
        self
    }

    /// Parse a TOML document into a config. Missing keys take defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, RewriteError> {
        let config: RewriteConfig =
            toml::from_str(source).map_err(|e| RewriteError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, RewriteError> {
        let source = fs::read_to_string(path)
            .map_err(|e| RewriteError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Reject configurations the pass cannot run with.
    pub fn validate(&self) -> Result<(), RewriteError> {
        if self.scope_marker_prefix.trim().is_empty() {
            return Err(RewriteError::Config(
                "scope_marker_prefix must not be empty".to_string(),
            ));
        }
        if self.discard.trim().is_empty() {
            return Err(RewriteError::Config("discard must not be empty".to_string()));
        }
        if self.lookahead_horizon == Some(0) {
            return Err(RewriteError::Config(
                "lookahead_horizon must be at least 1 when set".to_string(),
            ));
        }
        Regex::new(&self.producer_pattern).map_err(|e| RewriteError::InvalidProducerPattern {
            pattern: self.producer_pattern.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RewriteConfig::default();
        assert_eq!(config.cutoff_line, 0);
        assert_eq!(config.scope_marker_prefix, "func TestIntegration_");
        assert_eq!(config.lookahead_horizon, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = RewriteConfig::from_toml_str(
            "cutoff_line = 805\nlookahead_horizon = 100\nproducer_pattern = 'client\\.makeRequest\\('\n",
        )
        .unwrap();
        assert_eq!(config.cutoff_line, 805);
        assert_eq!(config.lookahead_horizon, Some(100));
        assert_eq!(config.producer_pattern, r"client\.makeRequest\(");
        assert_eq!(config.unit_prefix, "func ");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            RewriteConfig::from_toml_str("cutof_line = 3"),
            Err(RewriteError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_producer_rejected() {
        let config = RewriteConfig::new().with_producer("client.(");
        assert!(matches!(
            config.validate(),
            Err(RewriteError::InvalidProducerPattern { .. })
        ));
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let config = RewriteConfig::new().with_horizon(Some(0));
        assert!(config.validate().is_err());
    }
}
