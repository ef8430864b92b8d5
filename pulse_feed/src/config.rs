//! Feed simulator configuration.
//!
//! Every knob of the simulated market lives here: tick cadence bounds, the ranges a
//! fresh baseline is drawn from, and the perturbation magnitudes applied on each tick.
//! The defaults reproduce the dashboard's stock behaviour; a JSON file may override any
//! subset of fields.
use log::info;
use pulse_common::{PulseError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

/// Closed range given as `{ "min": .., "max": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    /// Lower bound.
    pub min: T,
    /// Upper bound.
    pub max: T,
}

impl<T> Bounds<T> {
    /// Create a new range.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: PartialOrd + Copy> Bounds<T> {
    fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

/// Tunables of the simulated market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Per-token tick period is drawn once from this range, in milliseconds.
    pub tick_interval_ms: Bounds<u64>,
    /// Period of batch subscriptions, in milliseconds.
    pub batch_interval_ms: u64,
    /// Range of a fresh baseline price.
    pub price_range: Bounds<f64>,
    /// Range of a fresh baseline market cap.
    pub market_cap_range: Bounds<f64>,
    /// Range of a fresh baseline volume.
    pub volume_range: Bounds<f64>,
    /// Inclusive range of a fresh holder count.
    pub holders_range: Bounds<u64>,
    /// Price and market cap move by up to this many percent per tick, either way.
    pub price_swing_pct: f64,
    /// Volume moves by up to this many percent per tick, either way.
    pub volume_swing_pct: f64,
    /// Chance per tick that the holder count moves at all.
    pub holder_change_probability: f64,
    /// Inclusive range of the holder step when it moves.
    pub holder_step: Bounds<i64>,
    /// Half-width of the synthetic 1h change, in percent.
    pub change_1h_pct: f64,
    /// Half-width of the synthetic 6h change, in percent.
    pub change_6h_pct: f64,
    /// Half-width of the synthetic 24h change, in percent.
    pub change_24h_pct: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: Bounds::new(1_000, 3_000),
            batch_interval_ms: 3_000,
            price_range: Bounds::new(0.0001, 0.0011),
            market_cap_range: Bounds::new(50_000.0, 550_000.0),
            volume_range: Bounds::new(5_000.0, 55_000.0),
            holders_range: Bounds::new(50, 549),
            price_swing_pct: 2.5,
            volume_swing_pct: 5.0,
            holder_change_probability: 0.3,
            holder_step: Bounds::new(-2, 2),
            change_1h_pct: 10.0,
            change_6h_pct: 20.0,
            change_24h_pct: 30.0,
        }
    }
}

impl FeedConfig {
    /// Read a JSON config, fill missing fields with defaults and validate it.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config = Self::parse_from_reader(BufReader::new(file))?;
        info!("Feed config loaded from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a JSON config from any reader.
    pub fn parse_from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: FeedConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty or inverted ranges and out-of-range probabilities.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms.min == 0 || !self.tick_interval_ms.is_ordered() {
            return Err(invalid("tick_interval_ms must be a positive, ordered range"));
        }
        if self.batch_interval_ms == 0 {
            return Err(invalid("batch_interval_ms must be positive"));
        }
        for (name, range) in [
            ("price_range", self.price_range),
            ("market_cap_range", self.market_cap_range),
            ("volume_range", self.volume_range),
        ] {
            if !(range.min > 0.0 && range.is_ordered() && range.max.is_finite()) {
                return Err(invalid(&format!("{name} must be a positive, ordered range")));
            }
        }
        if self.holders_range.min == 0 || !self.holders_range.is_ordered() {
            return Err(invalid("holders_range must start at 1 or more and be ordered"));
        }
        if !self.holder_step.is_ordered() {
            return Err(invalid("holder_step must be ordered"));
        }
        if !(0.0..=1.0).contains(&self.holder_change_probability) {
            return Err(invalid("holder_change_probability must be within 0..=1"));
        }
        for (name, value) in [
            ("price_swing_pct", self.price_swing_pct),
            ("volume_swing_pct", self.volume_swing_pct),
        ] {
            // a -100% move would zero the walk for good
            if !(0.0..100.0).contains(&value) {
                return Err(invalid(&format!("{name} must be within 0..100")));
            }
        }
        for (name, value) in [
            ("change_1h_pct", self.change_1h_pct),
            ("change_6h_pct", self.change_6h_pct),
            ("change_24h_pct", self.change_24h_pct),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(invalid(&format!("{name} must be a finite, non-negative number")));
            }
        }
        Ok(())
    }

    /// Batch period as a `Duration`.
    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }
}

fn invalid(message: &str) -> PulseError {
    PulseError::Config(message.to_string())
}
