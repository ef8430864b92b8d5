//! Injectable randomness for the simulated market.
//!
//! The simulator never calls a global RNG. It draws from a `RandomSource`, so the
//! composition root picks an OS-seeded generator, a fixed seed for reproducible
//! runs, or a scripted sequence in tests.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource: Send {
    /// Next uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

impl RandomSource for StdRng {
    fn next_unit(&mut self) -> f64 {
        self.random_range(0.0..1.0)
    }
}

/// OS-seeded generator.
pub fn entropy() -> StdRng {
    StdRng::from_os_rng()
}

/// Deterministic generator for reproducible runs.
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Replays a fixed sequence of unit values, cycling when it runs out.
///
/// Values are clamped into `[0, 1)`. An empty script always yields `0.5`, the midpoint
/// of every range.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    /// Create a source replaying `values` in order.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.5;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// Uniform draws over the ranges the simulator needs.
pub(crate) trait Draw {
    /// Uniform in `[min, max)`.
    fn uniform(&mut self, min: f64, max: f64) -> f64;
    /// Uniform integer in `min..=max`.
    fn uniform_int(&mut self, min: i64, max: i64) -> i64;
    /// Uniform in `(-half, +half)`.
    fn symmetric(&mut self, half: f64) -> f64;
    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool;
}

impl<R: RandomSource + ?Sized> Draw for R {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_unit() * (max - min)
    }

    fn uniform_int(&mut self, min: i64, max: i64) -> i64 {
        // widened so the full i64 range does not overflow
        let (min, max) = (i128::from(min), i128::from(max));
        let span = (max - min + 1) as f64;
        let offset = (self.next_unit() * span).floor() as i128;
        (min + offset).clamp(min, max) as i64
    }

    fn symmetric(&mut self, half: f64) -> f64 {
        (self.next_unit() - 0.5) * 2.0 * half
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_unit() < p
    }
}
