//! Injectable randomness
//!
//! Every draw the engine makes goes through [`RandomSource`], so callers can
//! pass a seeded generator (or a scripted one) instead of ambient global state.

use rand::Rng;
use std::f64::consts::PI;

pub trait RandomSource {
    /// Uniform draw in `[0, 1)`
    fn uniform(&mut self) -> f64;

    /// Standard-normal draw (Box-Muller over two uniform draws)
    fn standard_normal(&mut self) -> f64 {
        // 1 - u keeps the log argument in (0, 1]
        let u1 = 1.0 - self.uniform();
        let u2 = self.uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

impl<R: Rng> RandomSource for R {
    fn uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Replays a fixed list of uniform draws, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    /// Draws are clamped into `[0, 1)`
    pub fn new(draws: Vec<f64>) -> Self {
        let draws = if draws.is_empty() { vec![0.5] } else { draws };
        Self {
            draws: draws.into_iter().map(|d| d.clamp(0.0, 1.0 - f64::EPSILON)).collect(),
            cursor: 0,
        }
    }

    pub fn constant(draw: f64) -> Self {
        Self::new(vec![draw])
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&mut self) -> f64 {
        let draw = self.draws[self.cursor % self.draws.len()];
        self.cursor = self.cursor.wrapping_add(1);
        draw
    }
}
