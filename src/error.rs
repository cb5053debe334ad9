//! Error Types
//!
//! Structural failures that abort a phase transition. Out-of-range scores are
//! not errors; they are reported by the validator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    /// An applied code has no catalog entry
    #[error("unknown intervention code '{code}'")]
    UnknownIntervention { code: String },

    #[error("source dataset is empty")]
    EmptyDataset,

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("malformed record '{record}': {reason}")]
    MalformedRecord { record: String, reason: String },

    #[error("invalid intervention catalog: {reason}")]
    InvalidCatalog { reason: String },

    #[error("invalid engine configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SimulationError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput { reason: reason.into() }
    }

    pub fn malformed(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record: record.into(),
            reason: reason.into(),
        }
    }

    /// True for the configuration class (catalog/config problems)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownIntervention { .. } | Self::InvalidCatalog { .. } | Self::InvalidConfig { .. }
        )
    }

    /// True for the input class (empty or malformed source data)
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Self::EmptyDataset | Self::InvalidInput { .. } | Self::MalformedRecord { .. }
        )
    }
}

pub type SimResult<T> = std::result::Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let unknown = SimulationError::UnknownIntervention { code: "Z9".to_string() };
        assert!(unknown.is_configuration());
        assert!(!unknown.is_input());
        assert_eq!(unknown.to_string(), "unknown intervention code 'Z9'");

        assert!(SimulationError::EmptyDataset.is_input());
        assert!(SimulationError::malformed("r-1", "missing L1_C1").is_input());
    }
}
