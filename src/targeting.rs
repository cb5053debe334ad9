//! Targeting Resolver
//!
//! Decides, for one sentiment cell or capability dimension, which applied
//! intervention (if any) governs it. Effects never stack: exactly one
//! intervention governs a targeted unit.

use crate::catalog::{Intervention, InterventionCatalog};
use crate::config::ConflictPolicy;
use crate::error::SimResult;
use crate::model::{CapabilityDimension, SentimentCell};

/// First code in `applied` whose targets include `cell`
pub fn resolve_cell_target<'a, S: AsRef<str>>(
    catalog: &InterventionCatalog,
    cell: SentimentCell,
    applied: &'a [S],
) -> SimResult<Option<&'a str>> {
    for code in applied {
        if catalog.lookup(code.as_ref())?.targets_cell(cell) {
            return Ok(Some(code.as_ref()));
        }
    }
    Ok(None)
}

/// First code in `applied` whose targets include `dimension`
pub fn resolve_dimension_target<'a, S: AsRef<str>>(
    catalog: &InterventionCatalog,
    dimension: CapabilityDimension,
    applied: &'a [S],
) -> SimResult<Option<&'a str>> {
    for code in applied {
        if catalog.lookup(code.as_ref())?.targets_dimension(dimension) {
            return Ok(Some(code.as_ref()));
        }
    }
    Ok(None)
}

/// Applied interventions resolved against a catalog once, queried per unit.
#[derive(Debug, Clone)]
pub struct TargetResolver<'c> {
    applied: Vec<&'c Intervention>,
    policy: ConflictPolicy,
}

impl<'c> TargetResolver<'c> {
    pub fn new<S: AsRef<str>>(catalog: &'c InterventionCatalog, applied: &[S], policy: ConflictPolicy) -> SimResult<Self> {
        Ok(Self {
            applied: catalog.resolve(applied)?,
            policy,
        })
    }

    pub fn applied(&self) -> &[&'c Intervention] {
        &self.applied
    }

    pub fn cell_target(&self, cell: SentimentCell) -> Option<&'c Intervention> {
        self.pick(|i| i.targets_cell(cell), |i| i.impact.sentiment_delta)
    }

    pub fn dimension_target(&self, dimension: CapabilityDimension) -> Option<&'c Intervention> {
        self.pick(|i| i.targets_dimension(dimension), |i| i.impact.capability_delta)
    }

    fn pick(
        &self,
        targets: impl Fn(&Intervention) -> bool,
        delta: impl Fn(&Intervention) -> f64,
    ) -> Option<&'c Intervention> {
        let mut candidates = self.applied.iter().copied().filter(|i| targets(i));
        match self.policy {
            ConflictPolicy::FirstMatch => candidates.next(),
            ConflictPolicy::StrongestEffect => candidates.fold(None, |best: Option<&'c Intervention>, i| match best {
                Some(b) if delta(b).abs() >= delta(i).abs() => Some(b),
                _ => Some(i),
            }),
        }
    }
}
