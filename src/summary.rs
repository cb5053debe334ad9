//! Phase Summary Statistics
//!
//! Aggregate view of one phase (heatmap cell means, row/column averages,
//! dimension means) and the change between two phases.

use serde::{Deserialize, Serialize};

use crate::model::units::{CATEGORY_COUNT, CONSTRUCTS_PER_DIMENSION, LEVEL_COUNT};
use crate::model::{CapabilityDimension, RespondentRecord, SentimentCell, DIMENSION_COUNT, SENTIMENT_CELL_COUNT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub respondents: usize,
    /// Mean per sentiment cell, level-major
    pub cell_means: Vec<f64>,
    /// Mean per concern level (heatmap rows)
    pub level_means: Vec<f64>,
    /// Mean per perception category (heatmap columns)
    pub category_means: Vec<f64>,
    pub sentiment_mean: f64,
    /// Population standard deviation over all sentiment scores
    pub sentiment_std_dev: f64,
    /// Mean over all constructs of each dimension
    pub dimension_means: Vec<f64>,
    pub capability_mean: f64,
}

impl PhaseSummary {
    pub fn from_records(records: &[RespondentRecord]) -> Self {
        let n = records.len();
        if n == 0 {
            return Self {
                respondents: 0,
                cell_means: vec![0.0; SENTIMENT_CELL_COUNT],
                level_means: vec![0.0; LEVEL_COUNT as usize],
                category_means: vec![0.0; CATEGORY_COUNT as usize],
                sentiment_mean: 0.0,
                sentiment_std_dev: 0.0,
                dimension_means: vec![0.0; DIMENSION_COUNT as usize],
                capability_mean: 0.0,
            };
        }

        let mut cell_sums = vec![0.0; SENTIMENT_CELL_COUNT];
        let mut dimension_sums = vec![0.0; DIMENSION_COUNT as usize];
        for record in records {
            for (cell, value) in record.sentiment.iter() {
                cell_sums[cell.index()] += value;
            }
            for (construct, value) in record.capability.iter() {
                dimension_sums[construct.dimension().id() as usize - 1] += value;
            }
        }

        let cell_means: Vec<f64> = cell_sums.iter().map(|s| s / n as f64).collect();

        let mut level_means = vec![0.0; LEVEL_COUNT as usize];
        let mut category_means = vec![0.0; CATEGORY_COUNT as usize];
        for cell in SentimentCell::all() {
            level_means[cell.level() as usize - 1] += cell_means[cell.index()] / CATEGORY_COUNT as f64;
            category_means[cell.category() as usize - 1] += cell_means[cell.index()] / LEVEL_COUNT as f64;
        }

        let sentiment_mean = cell_means.iter().sum::<f64>() / SENTIMENT_CELL_COUNT as f64;
        let total = (n * SENTIMENT_CELL_COUNT) as f64;
        let variance = records
            .iter()
            .flat_map(|r| r.sentiment.values().iter())
            .map(|v| (v - sentiment_mean).powi(2))
            .sum::<f64>()
            / total;

        let per_dimension = (n * CONSTRUCTS_PER_DIMENSION as usize) as f64;
        let dimension_means: Vec<f64> = dimension_sums.iter().map(|s| s / per_dimension).collect();
        let capability_mean = dimension_means.iter().sum::<f64>() / DIMENSION_COUNT as f64;

        Self {
            respondents: n,
            cell_means,
            level_means,
            category_means,
            sentiment_mean,
            sentiment_std_dev: variance.sqrt(),
            dimension_means,
            capability_mean,
        }
    }

    pub fn cell_mean(&self, cell: SentimentCell) -> f64 {
        self.cell_means[cell.index()]
    }

    pub fn dimension_mean(&self, dimension: CapabilityDimension) -> f64 {
        self.dimension_means[dimension.id() as usize - 1]
    }

    /// Change from `self` to `later`
    pub fn delta(&self, later: &PhaseSummary) -> PhaseDelta {
        PhaseDelta {
            cell_changes: diff(&self.cell_means, &later.cell_means),
            dimension_changes: diff(&self.dimension_means, &later.dimension_means),
            sentiment_change: later.sentiment_mean - self.sentiment_mean,
            capability_change: later.capability_mean - self.capability_mean,
        }
    }
}

/// Per-unit change between two phases (later minus earlier)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDelta {
    pub cell_changes: Vec<f64>,
    pub dimension_changes: Vec<f64>,
    pub sentiment_change: f64,
    pub capability_change: f64,
}

impl PhaseDelta {
    /// Cells sorted by improvement (largest drop in resistance first)
    pub fn most_improved_cells(&self, top: usize) -> Vec<(SentimentCell, f64)> {
        let mut cells: Vec<_> = self
            .cell_changes
            .iter()
            .enumerate()
            .filter_map(|(i, change)| SentimentCell::from_index(i).map(|c| (c, *change)))
            .collect();
        cells.sort_by(|a, b| a.1.total_cmp(&b.1));
        cells.truncate(top);
        cells
    }
}

fn diff(before: &[f64], after: &[f64]) -> Vec<f64> {
    before.iter().zip(after).map(|(b, a)| a - b).collect()
}
