//! Runtime configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file is a
//! valid configuration.
//!
//! ```toml
//! default_model = "gpt-4o"
//! max_concurrent_stages = 2
//! gateway_timeout_secs = 120
//! preprocess_threshold_chars = 500
//! team_ready_scope = "ready_for_handoff_only"
//! ```

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use specflow_gateway::ModelId;
use std::path::Path;
use std::time::Duration;

/// Which graded requirements the team-readiness pass reviews
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamReadyScope {
    /// Every graded requirement
    #[default]
    All,
    /// Only requirements graded ready for handoff
    ReadyForHandoffOnly,
}

/// Specflow configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecflowConfig {
    /// Model used when a stage names none
    pub default_model: ModelId,
    /// Pipeline stages in flight at once
    pub max_concurrent_stages: usize,
    /// Per-call gateway deadline in seconds
    pub gateway_timeout_secs: u64,
    /// Inputs longer than this get the direct-parse comparison
    pub preprocess_threshold_chars: usize,
    /// Team-readiness eligibility
    pub team_ready_scope: TeamReadyScope,
}

impl SpecflowConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With default model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<ModelId>) -> Self {
        self.default_model = model.into();
        self
    }

    /// With stage concurrency
    #[inline]
    #[must_use]
    pub fn with_max_concurrent_stages(mut self, max: usize) -> Self {
        self.max_concurrent_stages = max;
        self
    }

    /// With gateway timeout
    #[inline]
    #[must_use]
    pub fn with_gateway_timeout_secs(mut self, secs: u64) -> Self {
        self.gateway_timeout_secs = secs;
        self
    }

    /// With team-readiness scope
    #[inline]
    #[must_use]
    pub fn with_team_ready_scope(mut self, scope: TeamReadyScope) -> Self {
        self.team_ready_scope = scope;
        self
    }

    /// Gateway deadline
    #[inline]
    #[must_use]
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// `CoreError::Config` for malformed TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, CoreError> {
        let config: Self = toml::from_str(text).map_err(|e| CoreError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `CoreError::Config` when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `CoreError::Config` naming the offending field.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_concurrent_stages == 0 {
            return Err(CoreError::config("max_concurrent_stages must be at least 1"));
        }
        if self.gateway_timeout_secs == 0 {
            return Err(CoreError::config("gateway_timeout_secs must be at least 1"));
        }
        if self.default_model.as_str().trim().is_empty() {
            return Err(CoreError::config("default_model must not be empty"));
        }
        Ok(())
    }
}

impl Default for SpecflowConfig {
    fn default() -> Self {
        Self {
            default_model: ModelId::new("default"),
            max_concurrent_stages: 2,
            gateway_timeout_secs: 300,
            preprocess_threshold_chars: specflow_parser::DEFAULT_THRESHOLD_CHARS,
            team_ready_scope: TeamReadyScope::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(SpecflowConfig::from_toml_str("").unwrap(), SpecflowConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = SpecflowConfig::from_toml_str(
            "default_model = \"m1\"\nmax_concurrent_stages = 4\nteam_ready_scope = \"ready_for_handoff_only\"\n",
        )
        .unwrap();
        assert_eq!(config.default_model.as_str(), "m1");
        assert_eq!(config.max_concurrent_stages, 4);
        assert_eq!(config.team_ready_scope, TeamReadyScope::ReadyForHandoffOnly);
        assert_eq!(config.preprocess_threshold_chars, 500);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = SpecflowConfig::from_toml_str("max_concurrent_stages = 0").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "gateway_timeout_secs = 30").unwrap();
        let config = SpecflowConfig::load(file.path()).unwrap();
        assert_eq!(config.gateway_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = SpecflowConfig::load("/nonexistent/specflow.toml").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
