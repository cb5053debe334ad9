//! Engine Configuration
//!
//! Domains, natural-variance models, targeted spread and the conflict policy.
//! Defaults match `config/engine.yaml`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::effects::{ScoreDomain, VarianceConfig};
use crate::error::{SimResult, SimulationError};

/// Which intervention governs a unit targeted by more than one applied code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// First match in applied-list order
    #[default]
    FirstMatch,
    /// Largest magnitude delta for the unit's score type; ties go to the earlier code
    StrongestEffect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub sentiment_domain: ScoreDomain,
    pub capability_domain: ScoreDomain,
    pub targeted_spread: f64,
    pub sentiment_variance: VarianceConfig,
    pub capability_variance: VarianceConfig,
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sentiment_domain: ScoreDomain::SENTIMENT,
            capability_domain: ScoreDomain::CAPABILITY,
            targeted_spread: 0.10,
            sentiment_variance: VarianceConfig::SENTIMENT,
            capability_variance: VarianceConfig::CAPABILITY,
            conflict_policy: ConflictPolicy::FirstMatch,
        }
    }
}

impl EngineConfig {
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        let invalid = |reason: &str| Err(SimulationError::InvalidConfig { reason: reason.to_string() });

        if !self.sentiment_domain.is_well_formed() {
            return invalid("sentiment_domain must be finite with lo < hi");
        }
        if !self.capability_domain.is_well_formed() {
            return invalid("capability_domain must be finite with lo < hi");
        }
        if !(self.targeted_spread.is_finite() && (0.0..1.0).contains(&self.targeted_spread)) {
            return invalid("targeted_spread must lie in [0, 1)");
        }
        if !self.sentiment_variance.is_well_formed() {
            return invalid("sentiment_variance needs finite values, std_dev >= 0 and min_change <= max_change");
        }
        if !self.capability_variance.is_well_formed() {
            return invalid("capability_variance needs finite values, std_dev >= 0 and min_change <= max_change");
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> SimResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml_str(&content)?;
        info!("Loaded engine config from {:?} ({:?})", path, config.conflict_policy);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_yaml_matches_default() {
        let yaml = include_str!("../config/engine.yaml");
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_conflict_policy_defaults_to_first_match() {
        let yaml = r#"
sentiment_domain: { lo: 1.0, hi: 5.0 }
capability_domain: { lo: 1.0, hi: 7.0 }
targeted_spread: 0.2
sentiment_variance: { mean: 0.0, std_dev: 0.1, min_change: -0.1, max_change: 0.1 }
capability_variance: { mean: 0.0, std_dev: 0.1, min_change: -0.1, max_change: 0.1 }
"#;
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.conflict_policy, ConflictPolicy::FirstMatch);
        assert_eq!(config.sentiment_domain.hi, 5.0);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let mut config = EngineConfig::default();
        config.sentiment_domain = ScoreDomain::new(3.0, 3.0);
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.targeted_spread = 1.5;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.capability_variance.std_dev = -0.1;
        let err = config.validate().unwrap_err();
        assert!(err.is_configuration());
    }
}
