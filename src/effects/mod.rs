//! Effect Application Engine
//!
//! Moves one scalar score either by a targeted intervention delta (scaled by a
//! bounded uniform factor) or by natural drift (capped normal draw). Both paths
//! clamp the result to the unit's domain.

pub mod random;

pub use random::{RandomSource, ScriptedRandom};

use serde::{Deserialize, Serialize};

/// Closed interval a score type must stay within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreDomain {
    pub lo: f64,
    pub hi: f64,
}

impl ScoreDomain {
    pub const SENTIMENT: ScoreDomain = ScoreDomain { lo: 1.0, hi: 3.0 };
    pub const CAPABILITY: ScoreDomain = ScoreDomain { lo: 1.0, hi: 7.0 };

    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.lo).min(self.hi)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }

    pub fn is_well_formed(&self) -> bool {
        self.lo.is_finite() && self.hi.is_finite() && self.lo < self.hi
    }
}

/// Natural drift model for one score type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceConfig {
    pub mean: f64,
    pub std_dev: f64,
    /// Most negative drift allowed
    pub min_change: f64,
    /// Most positive drift allowed
    pub max_change: f64,
}

impl VarianceConfig {
    /// Small drift, biased toward lower resistance
    pub const SENTIMENT: VarianceConfig = VarianceConfig {
        mean: -0.03,
        std_dev: 0.05,
        min_change: -0.12,
        max_change: 0.08,
    };

    /// Small drift, biased toward higher maturity
    pub const CAPABILITY: VarianceConfig = VarianceConfig {
        mean: 0.08,
        std_dev: 0.08,
        min_change: -0.05,
        max_change: 0.25,
    };

    pub fn is_well_formed(&self) -> bool {
        [self.mean, self.std_dev, self.min_change, self.max_change]
            .iter()
            .all(|v| v.is_finite())
            && self.std_dev >= 0.0
            && self.min_change <= self.max_change
    }
}

/// `d * (1 + r)` with `r` uniform in `[-spread, +spread]`, before clamping
pub fn targeted_shift<R: RandomSource + ?Sized>(delta: f64, spread: f64, rng: &mut R) -> f64 {
    let r = rng.uniform() * 2.0 * spread - spread;
    delta * (1.0 + r)
}

/// `mean + z * std_dev` capped to `[min_change, max_change]`
pub fn natural_drift<R: RandomSource + ?Sized>(variance: &VarianceConfig, rng: &mut R) -> f64 {
    let z = rng.standard_normal();
    (variance.mean + z * variance.std_dev).max(variance.min_change).min(variance.max_change)
}

pub fn apply_targeted<R: RandomSource + ?Sized>(
    value: f64,
    delta: f64,
    spread: f64,
    domain: &ScoreDomain,
    rng: &mut R,
) -> f64 {
    domain.clamp(value + targeted_shift(delta, spread, rng))
}

pub fn apply_natural<R: RandomSource + ?Sized>(
    value: f64,
    variance: &VarianceConfig,
    domain: &ScoreDomain,
    rng: &mut R,
) -> f64 {
    domain.clamp(value + natural_drift(variance, rng))
}
