//! Output Validator
//!
//! Advisory scan of a produced dataset. Every violation becomes one message;
//! nothing here returns an error.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::EngineConfig;
use crate::model::RespondentRecord;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Check every score of every record against the configured domains
pub fn validate(records: &[RespondentRecord], config: &EngineConfig) -> ValidationReport {
    let mut errors = Vec::new();

    if records.is_empty() {
        errors.push("Generated data is empty".to_string());
        return ValidationReport::from_errors(errors);
    }

    let mut seen_ids = HashSet::with_capacity(records.len());
    for record in records {
        if !seen_ids.insert(record.respondent_id.as_str()) {
            errors.push(format!("Duplicate respondent id {}", record.respondent_id));
        }

        for (cell, value) in record.sentiment.iter() {
            if !value.is_finite() {
                errors.push(format!("Sentiment value not finite for {} {}: {}", record.respondent_id, cell, value));
            } else if !config.sentiment_domain.contains(value) {
                errors.push(format!(
                    "Sentiment value out of range for {} {}: {} (expected {}..={})",
                    record.respondent_id, cell, value, config.sentiment_domain.lo, config.sentiment_domain.hi
                ));
            }
        }

        for (construct, value) in record.capability.iter() {
            if !value.is_finite() {
                errors.push(format!(
                    "Capability value not finite for {} {}: {}",
                    record.respondent_id, construct, value
                ));
            } else if !config.capability_domain.contains(value) {
                errors.push(format!(
                    "Capability value out of range for {} {}: {} (expected {}..={})",
                    record.respondent_id, construct, value, config.capability_domain.lo, config.capability_domain.hi
                ));
            }
        }
    }

    ValidationReport::from_errors(errors)
}
