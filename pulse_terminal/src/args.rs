//! Command-line arguments for the pulse terminal.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use pulse_common::{Column, SortDirection, SortKey};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to a JSON board with `newPairs`, `finalStretch` and `migrated` token lists.
    /// The built-in demo board is used when omitted.
    #[arg(long)]
    pub board: Option<String>,

    /// Path to a JSON feed config. Missing fields keep their defaults.
    #[arg(long)]
    pub config: Option<String>,

    /// Field the columns are sorted by.
    #[arg(long, value_enum, default_value_t = SortKey::Age)]
    pub sort: SortKey,

    /// Sort direction.
    #[arg(long, value_enum, default_value_t = SortDirection::Descending)]
    pub direction: SortDirection,

    /// Render a single column instead of all three.
    #[arg(long, value_enum)]
    pub column: Option<Column>,

    /// Milliseconds between two renders.
    #[arg(long, default_value_t = 2000)]
    pub refresh_ms: u64,

    /// Exit after this many seconds instead of waiting for Ctrl+C.
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Seed for reproducible market walks.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    /// Columns selected for rendering, in display order.
    pub fn columns(&self) -> Vec<Column> {
        match self.column {
            Some(column) => vec![column],
            None => Column::ALL.to_vec(),
        }
    }
}
