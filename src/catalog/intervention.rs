//! Intervention definitions
//!
//! Immutable catalog entries: what an intervention targets and how hard it
//! moves the scores it targets.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{CapabilityDimension, SentimentCell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionCategory {
    Leadership,
    Communication,
    Training,
    Process,
    Culture,
    Technology,
}

impl fmt::Display for InterventionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterventionCategory::Leadership => write!(f, "Leadership"),
            InterventionCategory::Communication => write!(f, "Communication"),
            InterventionCategory::Training => write!(f, "Training"),
            InterventionCategory::Process => write!(f, "Process"),
            InterventionCategory::Culture => write!(f, "Culture"),
            InterventionCategory::Technology => write!(f, "Technology"),
        }
    }
}

/// Qualitative time to effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Immediate,
    ShortTerm,
    MediumTerm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Effort and cost tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Low,
    Medium,
    High,
}

/// Units an intervention moves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    #[serde(default)]
    pub cells: Vec<SentimentCell>,
    #[serde(default)]
    pub dimensions: Vec<CapabilityDimension>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactSpec {
    /// Shift for targeted sentiment cells (negative = improvement)
    pub sentiment_delta: f64,
    /// Shift for every construct of a targeted dimension (positive = improvement)
    pub capability_delta: f64,
    pub timeframe: Timeframe,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub code: String,
    pub category: InterventionCategory,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub targets: TargetSpec,
    pub impact: ImpactSpec,
    pub effort: Tier,
    pub cost: Tier,
    /// Codes expected to have been applied in this or an earlier phase
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

impl Intervention {
    pub fn targets_cell(&self, cell: SentimentCell) -> bool {
        self.targets.cells.contains(&cell)
    }

    pub fn targets_dimension(&self, dimension: CapabilityDimension) -> bool {
        self.targets.dimensions.contains(&dimension)
    }
}

/// Display info for badges and listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionSummary {
    pub code: String,
    pub name: String,
    pub category: InterventionCategory,
}

impl From<&Intervention> for InterventionSummary {
    fn from(i: &Intervention) -> Self {
        Self {
            code: i.code.clone(),
            name: i.name.clone(),
            category: i.category,
        }
    }
}
