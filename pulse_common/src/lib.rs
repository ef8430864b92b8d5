//!
//! Common types and rules shared by the feed simulator and the terminal dashboard.
//!
//! This crate aggregates:
//! - `error` — unified error type `PulseError` used across the workspace.
//! - `result` — handy `Result<T, PulseError>` alias.
//! - `token` — token display records, live updates and raw market snapshots.
//! - `format` — display formatting and the permissive parsers used for sorting.
//! - `sort` — sort keys, directions, the toggle state and `sort_tokens`.
//! - `board` — the three dashboard columns and the JSON board loader.
#![warn(missing_docs)]
pub mod board;
pub mod error;
pub mod format;
pub mod result;
pub mod sort;
pub mod token;

pub use board::{Board, BoardParser, Column};
pub use error::PulseError;
pub use result::Result;
pub use sort::{SortDirection, SortKey, SortState, sort_tokens};
pub use token::{MarketSnapshot, PriceDirection, TokenRecord, TokenUpdate};
