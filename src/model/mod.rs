//! Data Model
//!
//! Scorable units, respondent records and phase datasets.

pub mod record;
pub mod units;

pub use record::{CapabilityScores, RespondentRecord, SentimentScores};
pub use units::{
    CapabilityDimension, ConstructId, SentimentCell, CONSTRUCT_COUNT, DIMENSION_COUNT, SENTIMENT_CELL_COUNT,
};

use serde::{Deserialize, Serialize};

/// All records sharing one wave label, produced by a single transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDataset {
    pub wave_label: String,
    /// Codes applied to reach this phase, in applied order
    pub applied_interventions: Vec<String>,
    pub records: Vec<RespondentRecord>,
}

impl PhaseDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
