// Configuration for the guardian orchestrator

use crate::error::{GuardianError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for assumption evaluation
///
/// # Example
/// ```
/// use stat_guardian::guardian::GuardianConfig;
///
/// let config = GuardianConfig::default();
/// assert_eq!(config.default_alpha, 0.05);
/// assert!(config.parallel);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    /// Significance level used when a request does not carry its own
    ///
    /// Must lie strictly inside (0, 1).
    pub default_alpha: f64,

    /// Run validators on scoped threads
    ///
    /// Validators share nothing, so results are identical either way;
    /// sequential mode exists for debugging and single-core targets.
    pub parallel: bool,

    /// Request visual evidence from the injected renderer
    pub include_evidence: bool,

    /// Wall-clock budget for evidence rendering, in milliseconds
    ///
    /// Once exhausted no further evidence is requested. The decision is
    /// fixed before rendering starts, so the budget only bounds latency.
    pub evidence_budget_ms: u64,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            default_alpha: 0.05,
            parallel: true,
            include_evidence: false,
            evidence_budget_ms: 2_000,
        }
    }
}

impl GuardianConfig {
    /// Default configuration with validators run one after another
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.default_alpha > 0.0 && self.default_alpha < 1.0) {
            return Err(GuardianError::InvalidConfig(format!(
                "default_alpha must be in (0, 1), got {}",
                self.default_alpha
            )));
        }
        if self.include_evidence && self.evidence_budget_ms == 0 {
            return Err(GuardianError::InvalidConfig(
                "evidence_budget_ms must be positive when include_evidence is set".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a TOML configuration; missing keys keep defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| GuardianError::InvalidConfig(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GuardianConfig::default();
        assert_eq!(config.default_alpha, 0.05);
        assert!(config.parallel);
        assert!(!config.include_evidence);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sequential_config() {
        let config = GuardianConfig::sequential();
        assert!(!config.parallel);
        assert_eq!(config.default_alpha, 0.05);
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_alpha() {
        let mut config = GuardianConfig::default();
        config.default_alpha = 1.0;
        assert_eq!(config.validate().unwrap_err().code(), "invalid_config");
        config.default_alpha = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_zero_budget_with_evidence() {
        let mut config = GuardianConfig::default();
        config.evidence_budget_ms = 0;
        assert!(config.validate().is_ok());
        config.include_evidence = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GuardianConfig::from_toml_str("default_alpha = 0.01\nparallel = false\n").unwrap();
        assert_eq!(config.default_alpha, 0.01);
        assert!(!config.parallel);
        assert_eq!(config.evidence_budget_ms, 2_000);
    }

    #[test]
    fn test_toml_rejects_bad_alpha() {
        assert!(GuardianConfig::from_toml_str("default_alpha = 2.0").is_err());
        assert!(GuardianConfig::from_toml_str("default_alpha = \"high\"").is_err());
    }
}
