//! Token data model shared by the feed and the dashboard.
//!
//! A `TokenRecord` is what a dashboard column shows for one token: mostly display
//! strings, as they arrive from the board file. A `TokenUpdate` is one simulated
//! tick for a token; it carries both the formatted strings the UI shows and the raw
//! `MarketSnapshot` they were formatted from.
use serde::{Deserialize, Serialize};

/// Display snapshot of a single token.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenRecord {
    /// Identifier, stable for the lifetime of a subscription.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Ticker or long token title.
    pub ticker: String,
    /// Time since creation, e.g. `"39s"`.
    #[serde(alias = "timeAgo")]
    pub age: String,
    /// Market capitalization, e.g. `"$4.84K"`.
    pub market_cap: String,
    /// Trading volume, e.g. `"$477"`.
    pub volume: String,
    /// Last price as shown.
    pub price: String,
    /// Holder count.
    pub holders: Option<u64>,
    /// Reply/comment count.
    pub replies: Option<u32>,
    /// Percentage change over the last hour.
    pub change_1h: Option<f64>,
    /// Percentage change over the last six hours.
    pub change_6h: Option<f64>,
    /// Percentage change over the last day.
    pub change_24h: Option<f64>,
    /// Liquidity indicator.
    pub liquidity: Option<String>,
    /// Liquidity ratio as shown, e.g. `"224/248"`.
    pub liquidity_ratio: Option<String>,
    /// Share held by top holders, e.g. `"0/21"`.
    pub top_holders_ratio: Option<String>,
    /// Transaction count.
    pub tx_count: Option<u32>,
    /// Abbreviated creator address.
    pub creator: Option<String>,
    /// Secondary age label, e.g. `"3mo"`.
    pub time_label: Option<String>,
    /// Verified badge.
    #[serde(alias = "isVerified")]
    pub verified: bool,
    /// Flagged by moderation.
    #[serde(alias = "hasFlag")]
    pub flagged: bool,
    /// Graduated off the bonding curve.
    #[serde(alias = "hasGraduated")]
    pub graduated: bool,
    /// Bonding-curve stage label, e.g. `"DS"`.
    #[serde(alias = "hasBonding")]
    pub bonding_stage: Option<String>,
}

/// Raw, unformatted market figures of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    /// Price in quote units.
    pub price: f64,
    /// Market capitalization.
    pub market_cap: f64,
    /// Trading volume.
    pub volume: f64,
    /// Holder count, never below 1.
    pub holders: u64,
}

/// One simulated market update for a token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUpdate {
    /// Identifier of the token this update belongs to.
    pub id: String,
    /// Price formatted with six decimals.
    pub price: String,
    /// Market cap formatted with a `K`/`M` unit.
    pub market_cap: String,
    /// Volume formatted with a `K`/`M` unit.
    pub volume: String,
    /// One hour change, two decimals.
    pub change_1h: f64,
    /// Six hour change, two decimals.
    pub change_6h: f64,
    /// Day change, two decimals.
    pub change_24h: f64,
    /// Holder count.
    pub holders: u64,
    /// UTC timestamp in milliseconds since Unix epoch.
    pub timestamp: u64,
    /// Raw figures the strings above were formatted from.
    pub snapshot: MarketSnapshot,
}

/// Which way the price moved when an update was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceDirection {
    /// New price is higher.
    Up,
    /// New price is lower.
    Down,
    /// Same price, unparseable prices, or an update for another token.
    Unchanged,
}

impl TokenRecord {
    /// Merge a live update into this record and report the price move.
    pub fn apply_update(&mut self, update: &TokenUpdate) -> PriceDirection {
        if update.id != self.id {
            return PriceDirection::Unchanged;
        }
        let direction = match (self.price.parse::<f64>(), update.price.parse::<f64>()) {
            (Ok(prev), Ok(next)) if next > prev => PriceDirection::Up,
            (Ok(prev), Ok(next)) if next < prev => PriceDirection::Down,
            _ => PriceDirection::Unchanged,
        };

        self.price = update.price.clone();
        self.market_cap = update.market_cap.clone();
        self.volume = update.volume.clone();
        self.holders = Some(update.holders);
        self.change_1h = Some(update.change_1h);
        self.change_6h = Some(update.change_6h);
        self.change_24h = Some(update.change_24h);
        direction
    }
}
