//! Intervention Catalog
//!
//! Read-only registry of interventions, built once from static YAML and
//! passed explicitly to whatever needs it. Several catalogs may coexist.

pub mod intervention;

pub use intervention::{
    Confidence, ImpactSpec, Intervention, InterventionCategory, InterventionSummary, TargetSpec, Tier, Timeframe,
};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

use crate::error::{SimResult, SimulationError};

const STANDARD_CATALOG_YAML: &str = include_str!("../../config/interventions.yaml");

#[derive(Debug, Deserialize, Serialize)]
struct CatalogFile {
    #[serde(default = "default_version")]
    version: u32,
    interventions: Vec<Intervention>,
}

fn default_version() -> u32 {
    1
}

/// An applied code whose prerequisites have not been met
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmetPrerequisite {
    pub code: String,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct InterventionCatalog {
    interventions: Vec<Intervention>,
    index: HashMap<String, usize>,
}

impl InterventionCatalog {
    /// Build a catalog, checking codes, deltas and prerequisite references
    pub fn from_interventions(interventions: Vec<Intervention>) -> SimResult<Self> {
        let mut index = HashMap::with_capacity(interventions.len());
        for (i, intervention) in interventions.iter().enumerate() {
            let code = intervention.code.trim();
            if code.is_empty() || code != intervention.code {
                return Err(SimulationError::InvalidCatalog {
                    reason: format!("entry {} has an empty or padded code '{}'", i + 1, intervention.code),
                });
            }
            if index.insert(intervention.code.clone(), i).is_some() {
                return Err(SimulationError::InvalidCatalog {
                    reason: format!("duplicate code '{}'", intervention.code),
                });
            }
            let impact = &intervention.impact;
            if !impact.sentiment_delta.is_finite() || !impact.capability_delta.is_finite() {
                return Err(SimulationError::InvalidCatalog {
                    reason: format!("'{}' has a non-finite impact delta", intervention.code),
                });
            }
        }

        for intervention in &interventions {
            for prerequisite in &intervention.prerequisites {
                if prerequisite == &intervention.code {
                    return Err(SimulationError::InvalidCatalog {
                        reason: format!("'{}' lists itself as a prerequisite", intervention.code),
                    });
                }
                if !index.contains_key(prerequisite) {
                    return Err(SimulationError::InvalidCatalog {
                        reason: format!("'{}' requires unknown code '{}'", intervention.code, prerequisite),
                    });
                }
            }
        }

        Ok(Self { interventions, index })
    }

    pub fn from_yaml_str(yaml: &str) -> SimResult<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        let catalog = Self::from_interventions(file.interventions)?;
        info!("Loaded intervention catalog v{} with {} entries", file.version, catalog.len());
        Ok(catalog)
    }

    /// The catalog shipped in `config/interventions.yaml`
    pub fn standard() -> SimResult<Self> {
        Self::from_yaml_str(STANDARD_CATALOG_YAML)
    }

    pub async fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_yaml_str(&content)
    }

    pub fn lookup(&self, code: &str) -> SimResult<&Intervention> {
        self.get(code).ok_or_else(|| SimulationError::UnknownIntervention { code: code.to_string() })
    }

    pub fn get(&self, code: &str) -> Option<&Intervention> {
        self.index.get(code).map(|&i| &self.interventions[i])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Look up a whole applied list, preserving its order. Fails on the first unknown code.
    pub fn resolve<S: AsRef<str>>(&self, codes: &[S]) -> SimResult<Vec<&Intervention>> {
        codes.iter().map(|c| self.lookup(c.as_ref())).collect()
    }

    pub fn summary(&self, code: &str) -> SimResult<InterventionSummary> {
        self.lookup(code).map(InterventionSummary::from)
    }

    /// Codes in declared order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.interventions.iter().map(|i| i.code.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Intervention> {
        self.interventions.iter()
    }

    pub fn len(&self) -> usize {
        self.interventions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interventions.is_empty()
    }

    /// Prerequisites satisfied by neither `applied` nor `history`. Advisory.
    pub fn unmet_prerequisites<S: AsRef<str>, H: AsRef<str>>(
        &self,
        applied: &[S],
        history: &[H],
    ) -> SimResult<Vec<UnmetPrerequisite>> {
        let available: HashSet<&str> = applied
            .iter()
            .map(AsRef::as_ref)
            .chain(history.iter().map(AsRef::as_ref))
            .collect();

        let mut unmet = Vec::new();
        for intervention in self.resolve(applied)? {
            let missing: Vec<String> = intervention
                .prerequisites
                .iter()
                .filter(|p| !available.contains(p.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                unmet.push(UnmetPrerequisite {
                    code: intervention.code.clone(),
                    missing,
                });
            }
        }
        Ok(unmet)
    }
}
