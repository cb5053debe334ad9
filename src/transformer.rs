//! Population Transformer
//!
//! Produces the next phase's records from a source phase: every sentiment cell
//! and every capability construct of every record is moved either by the
//! governing intervention or by natural drift. Source records are only read.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::catalog::InterventionCatalog;
use crate::config::EngineConfig;
use crate::effects::{apply_natural, apply_targeted, RandomSource};
use crate::error::{SimResult, SimulationError};
use crate::model::{CapabilityDimension, PhaseDataset, RespondentRecord, SentimentCell};
use crate::targeting::TargetResolver;

/// Caller-supplied identity of the phase being produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseRequest {
    pub wave_label: String,
    pub assessment_date: DateTime<Utc>,
    pub company_id: String,
    /// Applied intervention codes, in priority order
    pub applied: Vec<String>,
}

impl PhaseRequest {
    pub fn new(
        wave_label: impl Into<String>,
        assessment_date: DateTime<Utc>,
        company_id: impl Into<String>,
        applied: Vec<String>,
    ) -> Self {
        Self {
            wave_label: wave_label.into(),
            assessment_date,
            company_id: company_id.into(),
            applied,
        }
    }
}

/// Identifier for the record at 0-based `position` of a new wave
pub fn respondent_id(wave_label: &str, position: usize) -> String {
    format!("{}-{:04}", wave_label, position + 1)
}

/// Targeted unit updates, for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TargetTally {
    cells: usize,
    dimensions: usize,
}

pub struct PhaseTransformer<'a> {
    catalog: &'a InterventionCatalog,
    config: &'a EngineConfig,
}

impl<'a> PhaseTransformer<'a> {
    pub fn new(catalog: &'a InterventionCatalog, config: &'a EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Sequential transformation drawing from `rng`
    pub fn transform<R: RandomSource + ?Sized>(
        &self,
        source: &[RespondentRecord],
        request: &PhaseRequest,
        rng: &mut R,
    ) -> SimResult<PhaseDataset> {
        let resolver = self.prepare(source, request)?;

        let mut tally = TargetTally::default();
        let records = source
            .iter()
            .enumerate()
            .map(|(position, record)| self.transform_record(&resolver, record, position, request, &mut *rng, &mut tally))
            .collect();

        Ok(self.finish(request, records, tally))
    }

    /// Record-parallel transformation. Each record draws from its own generator
    /// seeded from `(seed, position)`, so output does not depend on thread count.
    pub fn transform_parallel(
        &self,
        source: &[RespondentRecord],
        request: &PhaseRequest,
        seed: u64,
    ) -> SimResult<PhaseDataset> {
        let resolver = self.prepare(source, request)?;

        let (records, tallies): (Vec<_>, Vec<_>) = source
            .par_iter()
            .enumerate()
            .map(|(position, record)| {
                let mut rng = StdRng::seed_from_u64(record_seed(seed, position));
                let mut tally = TargetTally::default();
                let record = self.transform_record(&resolver, record, position, request, &mut rng, &mut tally);
                (record, tally)
            })
            .unzip();

        let tally = tallies.into_iter().fold(TargetTally::default(), |acc, t| TargetTally {
            cells: acc.cells + t.cells,
            dimensions: acc.dimensions + t.dimensions,
        });
        Ok(self.finish(request, records, tally))
    }

    fn prepare(&self, source: &[RespondentRecord], request: &PhaseRequest) -> SimResult<TargetResolver<'a>> {
        self.config.validate()?;
        if source.is_empty() {
            return Err(SimulationError::EmptyDataset);
        }
        if request.wave_label.trim().is_empty() {
            return Err(SimulationError::invalid_input("new wave label must not be empty"));
        }
        let resolver = TargetResolver::new(self.catalog, &request.applied, self.config.conflict_policy)?;
        info!(
            "Transforming {} records into wave '{}' with interventions [{}]",
            source.len(),
            request.wave_label,
            request.applied.join(", ")
        );
        Ok(resolver)
    }

    fn finish(&self, request: &PhaseRequest, records: Vec<RespondentRecord>, tally: TargetTally) -> PhaseDataset {
        debug!(
            "Wave '{}': {} targeted cell updates, {} targeted dimension updates",
            request.wave_label, tally.cells, tally.dimensions
        );
        PhaseDataset {
            wave_label: request.wave_label.clone(),
            applied_interventions: request.applied.clone(),
            records,
        }
    }

    fn transform_record<R: RandomSource + ?Sized>(
        &self,
        resolver: &TargetResolver<'_>,
        source: &RespondentRecord,
        position: usize,
        request: &PhaseRequest,
        rng: &mut R,
        tally: &mut TargetTally,
    ) -> RespondentRecord {
        let config = self.config;

        let mut sentiment = source.sentiment;
        for cell in SentimentCell::all() {
            let value = sentiment.get(cell);
            let next = match resolver.cell_target(cell) {
                Some(intervention) => {
                    tally.cells += 1;
                    apply_targeted(
                        value,
                        intervention.impact.sentiment_delta,
                        config.targeted_spread,
                        &config.sentiment_domain,
                        rng,
                    )
                }
                None => apply_natural(value, &config.sentiment_variance, &config.sentiment_domain, rng),
            };
            sentiment.set(cell, next);
        }

        // Targeting is decided per dimension; each construct gets its own draw
        let mut capability = source.capability;
        for dimension in CapabilityDimension::ALL {
            let target = resolver.dimension_target(dimension);
            if target.is_some() {
                tally.dimensions += 1;
            }
            for construct in dimension.constructs() {
                let value = capability.get(construct);
                let next = match target {
                    Some(intervention) => apply_targeted(
                        value,
                        intervention.impact.capability_delta,
                        config.targeted_spread,
                        &config.capability_domain,
                        rng,
                    ),
                    None => apply_natural(value, &config.capability_variance, &config.capability_domain, rng),
                };
                capability.set(construct, next);
            }
        }

        RespondentRecord {
            respondent_id: respondent_id(&request.wave_label, position),
            survey_wave: request.wave_label.clone(),
            company_id: request.company_id.clone(),
            assessment_date: request.assessment_date,
            sentiment,
            capability,
            attributes: carried_attributes(source),
        }
    }
}

/// Non-score columns of `source`, minus its storage key
fn carried_attributes(source: &RespondentRecord) -> BTreeMap<String, Value> {
    let mut attributes = source.attributes.clone();
    attributes.remove("id");
    attributes
}

fn record_seed(seed: u64, position: usize) -> u64 {
    seed ^ (position as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::ScriptedRandom;
    use crate::model::{CapabilityScores, SentimentScores};
    use chrono::TimeZone;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
    }

    fn baseline(n: usize) -> Vec<RespondentRecord> {
        (0..n)
            .map(|i| {
                RespondentRecord::new(
                    format!("R{}", 100 + i),
                    "baseline",
                    "old-co",
                    Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap(),
                    SentimentScores::uniform(2.0),
                    CapabilityScores::uniform(4.0),
                )
            })
            .collect()
    }

    fn request(applied: &[&str]) -> PhaseRequest {
        PhaseRequest::new("phase2", date(), "acme", applied.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_respondent_id_format() {
        assert_eq!(respondent_id("mar-2025-phase2", 0), "mar-2025-phase2-0001");
        assert_eq!(respondent_id("w", 12_344), "w-12345");
    }

    #[test]
    fn test_empty_source_rejected() {
        let catalog = InterventionCatalog::standard().unwrap();
        let config = EngineConfig::default();
        let transformer = PhaseTransformer::new(&catalog, &config);
        let err = transformer
            .transform(&[], &request(&["A1"]), &mut ScriptedRandom::constant(0.5))
            .unwrap_err();
        assert!(matches!(err, SimulationError::EmptyDataset));
    }

    #[test]
    fn test_unknown_code_aborts() {
        let catalog = InterventionCatalog::standard().unwrap();
        let config = EngineConfig::default();
        let transformer = PhaseTransformer::new(&catalog, &config);
        let err = transformer
            .transform(&baseline(3), &request(&["A1", "Q1"]), &mut ScriptedRandom::constant(0.5))
            .unwrap_err();
        assert!(matches!(err, SimulationError::UnknownIntervention { ref code } if code == "Q1"));
    }

    #[test]
    fn test_identity_is_restamped() {
        let catalog = InterventionCatalog::standard().unwrap();
        let config = EngineConfig::default();
        let transformer = PhaseTransformer::new(&catalog, &config);
        let source = baseline(3);
        let out = transformer
            .transform(&source, &request(&["A1"]), &mut ScriptedRandom::constant(0.5))
            .unwrap();

        assert_eq!(out.wave_label, "phase2");
        assert_eq!(out.applied_interventions, vec!["A1".to_string()]);
        let ids: Vec<_> = out.records.iter().map(|r| r.respondent_id.as_str()).collect();
        assert_eq!(ids, vec!["phase2-0001", "phase2-0002", "phase2-0003"]);
        for r in &out.records {
            assert_eq!(r.survey_wave, "phase2");
            assert_eq!(r.company_id, "acme");
            assert_eq!(r.assessment_date, date());
        }
        // source untouched
        assert_eq!(source, baseline(3));
    }

    #[test]
    fn test_midpoint_draws_apply_exact_deltas() {
        // u = 0.5 => r = 0 and z = -sqrt(2 ln 2), so targeted units move by exactly d
        let catalog = InterventionCatalog::standard().unwrap();
        let config = EngineConfig::default();
        let transformer = PhaseTransformer::new(&catalog, &config);
        let out = transformer
            .transform(&baseline(1), &request(&["A1"]), &mut ScriptedRandom::constant(0.5))
            .unwrap();
        let r = &out.records[0];

        let l1c4 = SentimentCell::new(1, 4).unwrap();
        assert!((r.sentiment.get(l1c4) - 1.5).abs() < 1e-9);

        for construct in CapabilityDimension::StrategyVision.constructs() {
            assert!((r.capability.get(construct) - 4.9).abs() < 1e-9);
        }

        let z = -(2.0 * 2f64.ln()).sqrt();
        let drift = (-0.03 + z * 0.05_f64).max(-0.12).min(0.08);
        let untouched = SentimentCell::new(5, 5).unwrap();
        assert!((r.sentiment.get(untouched) - (2.0 + drift)).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_is_deterministic_per_seed() {
        let catalog = InterventionCatalog::standard().unwrap();
        let config = EngineConfig::default();
        let transformer = PhaseTransformer::new(&catalog, &config);
        let source = baseline(50);
        let req = request(&["A1", "B2", "C1"]);

        let a = transformer.transform_parallel(&source, &req, 2024).unwrap();
        let b = transformer.transform_parallel(&source, &req, 2024).unwrap();
        let c = transformer.transform_parallel(&source, &req, 2025).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.records[49].respondent_id, "phase2-0050");
    }

    #[test]
    fn test_each_construct_gets_its_own_draw() {
        // Five distinct draws cycling, so any four consecutive draws differ
        let catalog = InterventionCatalog::standard().unwrap();
        let config = EngineConfig::default();
        let transformer = PhaseTransformer::new(&catalog, &config);
        let mut rng = ScriptedRandom::new(vec![0.05, 0.3, 0.55, 0.8, 0.95]);
        let out = transformer.transform(&baseline(1), &request(&["C1"]), &mut rng).unwrap();

        let values: Vec<f64> = CapabilityDimension::TalentSkills
            .constructs()
            .map(|c| out.records[0].capability.get(c))
            .collect();
        for v in &values {
            // 4.0 + 1.0 * (1 ± 0.10)
            assert!(*v >= 4.9 - 1e-9 && *v <= 5.1 + 1e-9, "{}", v);
        }
        for i in 0..values.len() {
            for j in (i + 1)..values.len() {
                assert!((values[i] - values[j]).abs() > 1e-6, "{:?}", values);
            }
        }
    }

    #[test]
    fn test_attributes_carried_forward() {
        let catalog = InterventionCatalog::standard().unwrap();
        let config = EngineConfig::default();
        let transformer = PhaseTransformer::new(&catalog, &config);
        let source: Vec<_> = baseline(2)
            .into_iter()
            .map(|r| r.with_attribute("Department", "Finance").with_attribute("id", 17))
            .collect();

        let out = transformer.transform_parallel(&source, &request(&["A1"]), 5).unwrap();
        for r in &out.records {
            assert_eq!(r.attributes["Department"], "Finance");
            assert!(!r.attributes.contains_key("id"));
        }
        assert!(source[0].attributes.contains_key("id"));
    }

    #[test]
    fn test_blank_wave_label_rejected() {
        let catalog = InterventionCatalog::standard().unwrap();
        let config = EngineConfig::default();
        let transformer = PhaseTransformer::new(&catalog, &config);
        let mut req = request(&["A1"]);
        req.wave_label = "  ".to_string();
        let err = transformer.transform_parallel(&baseline(2), &req, 1).unwrap_err();
        assert!(err.is_input());
    }
}
