//! Per-token random walk and update construction.
//!
//! A `Baseline` holds the raw figures a token's walk is at. Each tick nudges it by a
//! small relative move, so consecutive updates drift instead of jumping. Price and
//! market cap always move by the same percentage; volume moves on its own; holders
//! only move now and then.
use crate::config::FeedConfig;
use crate::random::{Draw, RandomSource};
use chrono::Utc;
use pulse_common::format::{format_number, format_price, round2};
use pulse_common::{MarketSnapshot, TokenUpdate};
use std::sync::atomic::{AtomicU64, Ordering};

/// Raw market state of one subscribed token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    /// Price in quote units.
    pub price: f64,
    /// Market capitalization.
    pub market_cap: f64,
    /// Trading volume.
    pub volume: f64,
    /// Holder count, never below 1.
    pub holders: u64,
}

/// What one tick did to a baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Percentage applied to both price and market cap.
    pub price_pct: f64,
    /// Percentage applied to volume.
    pub volume_pct: f64,
    /// Signed holder move, zero when holders stayed put.
    pub holder_delta: i64,
}

/// Synthetic window changes reported with an update.
///
/// Drawn fresh on every tick; they are not derived from the walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowChanges {
    /// One hour change, percent.
    pub change_1h: f64,
    /// Six hour change, percent.
    pub change_6h: f64,
    /// Day change, percent.
    pub change_24h: f64,
}

impl Baseline {
    /// Draw a fresh baseline from the configured ranges.
    pub fn random(config: &FeedConfig, source: &mut dyn RandomSource) -> Self {
        let price = source.uniform(config.price_range.min, config.price_range.max);
        let market_cap = source.uniform(config.market_cap_range.min, config.market_cap_range.max);
        let volume = source.uniform(config.volume_range.min, config.volume_range.max);
        let holders = source.uniform_int(
            saturating_i64(config.holders_range.min),
            saturating_i64(config.holders_range.max),
        );
        Self {
            price,
            market_cap,
            volume,
            holders: holders.max(1).unsigned_abs(),
        }
    }

    /// Advance the walk by one tick and report the move.
    pub fn step(&mut self, config: &FeedConfig, source: &mut dyn RandomSource) -> Step {
        let price_pct = source.symmetric(config.price_swing_pct);
        let price_factor = 1.0 + price_pct / 100.0;
        self.price *= price_factor;
        self.market_cap *= price_factor;

        let volume_pct = source.symmetric(config.volume_swing_pct);
        self.volume *= 1.0 + volume_pct / 100.0;

        let mut holder_delta = 0;
        if source.chance(config.holder_change_probability) {
            holder_delta = source.uniform_int(config.holder_step.min, config.holder_step.max);
            self.holders = saturating_i64(self.holders)
                .saturating_add(holder_delta)
                .max(1)
                .unsigned_abs();
        }

        Step {
            price_pct,
            volume_pct,
            holder_delta,
        }
    }

    /// Raw figures as a `MarketSnapshot`.
    pub fn snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            price: self.price,
            market_cap: self.market_cap,
            volume: self.volume,
            holders: self.holders,
        }
    }

    /// Format the current state into the update subscribers receive.
    pub fn to_update(&self, id: &str, changes: WindowChanges, timestamp: u64) -> TokenUpdate {
        TokenUpdate {
            id: id.to_string(),
            price: format_price(self.price),
            market_cap: format_number(self.market_cap),
            volume: format_number(self.volume),
            change_1h: round2(changes.change_1h),
            change_6h: round2(changes.change_6h),
            change_24h: round2(changes.change_24h),
            holders: self.holders,
            timestamp,
            snapshot: self.snapshot(),
        }
    }
}

impl WindowChanges {
    /// Draw three independent changes within the configured half-widths.
    pub fn random(config: &FeedConfig, source: &mut dyn RandomSource) -> Self {
        Self {
            change_1h: source.symmetric(config.change_1h_pct),
            change_6h: source.symmetric(config.change_6h_pct),
            change_24h: source.symmetric(config.change_24h_pct),
        }
    }
}

/// `value` as `i64`, capped at `i64::MAX`.
pub(crate) fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

static LAST_TIMESTAMP: AtomicU64 = AtomicU64::new(0);

/// Wall-clock milliseconds, never lower than a value handed out before in this process.
pub fn monotonic_timestamp() -> u64 {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let previous = LAST_TIMESTAMP.fetch_max(now, Ordering::AcqRel);
    previous.max(now)
}
