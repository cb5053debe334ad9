//! Multi-Phase Journeys
//!
//! Chains transformations so each phase is produced from the previous phase's
//! output. Applied codes accumulate into a history that prerequisite checks
//! are evaluated against.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::{info, warn};

use crate::catalog::{InterventionCatalog, UnmetPrerequisite};
use crate::config::EngineConfig;
use crate::effects::RandomSource;
use crate::error::{SimResult, SimulationError};
use crate::model::{PhaseDataset, RespondentRecord};
use crate::summary::PhaseSummary;
use crate::transformer::{PhaseRequest, PhaseTransformer};

/// One planned transition
#[derive(Debug, Clone, PartialEq)]
pub struct PhasePlan {
    pub wave_label: String,
    pub assessment_date: DateTime<Utc>,
    pub applied: Vec<String>,
}

impl PhasePlan {
    pub fn new(wave_label: impl Into<String>, assessment_date: DateTime<Utc>, applied: &[&str]) -> Self {
        Self {
            wave_label: wave_label.into(),
            assessment_date,
            applied: applied.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Baseline -> March 2025 -> November 2025
    pub fn standard_journey() -> SimResult<Vec<PhasePlan>> {
        Ok(vec![
            PhasePlan::new("mar-2025-phase2", first_of_month(2025, 3)?, &["A1", "B2", "C1"]),
            PhasePlan::new("nov-2025-phase3", first_of_month(2025, 11)?, &["A2", "C3", "D1"]),
        ])
    }

    fn request(&self, company_id: &str) -> PhaseRequest {
        PhaseRequest::new(self.wave_label.clone(), self.assessment_date, company_id, self.applied.clone())
    }
}

fn first_of_month(year: i32, month: u32) -> SimResult<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .ok_or_else(|| SimulationError::invalid_input(format!("no such month {}-{:02}", year, month)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct JourneyStep {
    pub dataset: PhaseDataset,
    pub summary: PhaseSummary,
    pub unmet_prerequisites: Vec<UnmetPrerequisite>,
}

pub struct Journey<'a> {
    catalog: &'a InterventionCatalog,
    transformer: PhaseTransformer<'a>,
    company_id: String,
}

impl<'a> Journey<'a> {
    pub fn new(catalog: &'a InterventionCatalog, config: &'a EngineConfig, company_id: impl Into<String>) -> Self {
        Self {
            catalog,
            transformer: PhaseTransformer::new(catalog, config),
            company_id: company_id.into(),
        }
    }

    /// Run every plan in order. Any step failure aborts the whole journey.
    pub fn run<R: RandomSource + ?Sized>(
        &self,
        baseline: &[RespondentRecord],
        plans: &[PhasePlan],
        rng: &mut R,
    ) -> SimResult<Vec<JourneyStep>> {
        if plans.is_empty() {
            return Err(SimulationError::invalid_input("journey needs at least one phase plan"));
        }

        let mut steps: Vec<JourneyStep> = Vec::with_capacity(plans.len());
        let mut history: Vec<String> = Vec::new();

        for plan in plans {
            let unmet = self.catalog.unmet_prerequisites(&plan.applied, &history)?;
            for u in &unmet {
                warn!(
                    "Wave '{}': '{}' applied without prerequisite(s) {}",
                    plan.wave_label,
                    u.code,
                    u.missing.join(", ")
                );
            }

            let source = match steps.last() {
                Some(previous) => previous.dataset.records.as_slice(),
                None => baseline,
            };
            let dataset = self.transformer.transform(source, &plan.request(&self.company_id), &mut *rng)?;
            let summary = PhaseSummary::from_records(&dataset.records);
            info!(
                "Wave '{}' complete: mean sentiment {:.3}, mean capability {:.3}",
                plan.wave_label, summary.sentiment_mean, summary.capability_mean
            );

            history.extend(plan.applied.iter().cloned());
            steps.push(JourneyStep {
                dataset,
                summary,
                unmet_prerequisites: unmet,
            });
        }

        Ok(steps)
    }
}
