//! Client-side ordering of token columns.
//!
//! Columns are sorted on every render from whatever records the dashboard holds.
//! Several keys are display strings, so the comparison value is recovered through
//! the parsers in [`crate::format`]. Missing numeric fields count as zero.
use crate::format::{parse_age, parse_currency};
use crate::token::TokenRecord;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum_macros::{Display, EnumString};

/// Field a column is ordered by.
#[allow(missing_docs)]
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    Hash,
    Eq,
    PartialEq,
)]
#[value(rename_all = "kebab-case")]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum SortKey {
    Age,
    MarketCap,
    Volume,
    Holders,
    #[value(name = "change-1h")]
    #[serde(rename = "change1h")]
    #[strum(serialize = "change-1h")]
    Change1h,
    #[value(name = "change-24h")]
    #[serde(rename = "change24h")]
    #[strum(serialize = "change-24h")]
    Change24h,
}

/// Sort order for a column.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    ValueEnum,
    Display,
    EnumString,
    Hash,
    Eq,
    PartialEq,
)]
#[strum(ascii_case_insensitive)]
pub enum SortDirection {
    /// Lower values first.
    #[value(name = "asc")]
    #[serde(rename = "asc")]
    #[strum(serialize = "asc")]
    Ascending,
    /// Higher values first.
    #[value(name = "desc")]
    #[serde(rename = "desc")]
    #[strum(serialize = "desc")]
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl SortKey {
    /// Comparable value of `token` under this key.
    pub fn value_of(self, token: &TokenRecord) -> f64 {
        match self {
            SortKey::Age => parse_age(&token.age) as f64,
            SortKey::MarketCap => parse_currency(&token.market_cap),
            SortKey::Volume => parse_currency(&token.volume),
            SortKey::Holders => token.holders.unwrap_or(0) as f64,
            SortKey::Change1h => token.change_1h.unwrap_or(0.0),
            SortKey::Change24h => token.change_24h.unwrap_or(0.0),
        }
    }
}

/// Return `tokens` ordered by `key` in `direction`; the input is left untouched.
///
/// Equal keys keep their input order, but callers should not depend on that.
pub fn sort_tokens(
    tokens: &[TokenRecord],
    key: SortKey,
    direction: SortDirection,
) -> Vec<TokenRecord> {
    let mut keyed: Vec<(f64, &TokenRecord)> =
        tokens.iter().map(|token| (key.value_of(token), token)).collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ordering: Ordering = a.total_cmp(b);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    keyed.into_iter().map(|(_, token)| token.clone()).collect()
}

/// Current sort selection of a column, with the header toggle convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    /// Active key.
    pub key: SortKey,
    /// Active direction.
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::Age,
            direction: SortDirection::Descending,
        }
    }
}

impl SortState {
    /// Create a state with an explicit key and direction.
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Select `key`: the active key flips direction, any other key starts descending.
    pub fn select(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            self.key = key;
            self.direction = SortDirection::Descending;
        }
    }

    /// Sort `tokens` with the current selection.
    pub fn apply(&self, tokens: &[TokenRecord]) -> Vec<TokenRecord> {
        sort_tokens(tokens, self.key, self.direction)
    }
}
