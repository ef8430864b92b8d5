//! Dashboard columns and board loading.
//!
//! The pulse board has three fixed columns: freshly created pairs, tokens in the final
//! stretch of their bonding curve, and tokens that already migrated. A board can be
//! loaded from a JSON document or taken from the built-in demo set.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use strum_macros::{Display, EnumString};

use crate::error::PulseError;
use crate::token::{PriceDirection, TokenRecord, TokenUpdate};

/// Trait providing board loading from a reader.
pub trait BoardParser: Sized {
    /// Parses a board from a JSON document.
    ///
    /// The document is an object with optional `newPairs`, `finalStretch` and `migrated`
    /// arrays of token records. Missing columns are empty.
    fn parse_from_reader<R: Read>(reader: R) -> Result<Self, PulseError>;
}

/// Board column.
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
pub enum Column {
    NewPairs,
    FinalStretch,
    Migrated,
}

impl Column {
    /// All columns in display order.
    pub const ALL: [Column; 3] = [Column::NewPairs, Column::FinalStretch, Column::Migrated];

    /// Column heading.
    pub fn title(self) -> &'static str {
        match self {
            Column::NewPairs => "New Pairs",
            Column::FinalStretch => "Final Stretch",
            Column::Migrated => "Migrated",
        }
    }
}

/// The three columns of token records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Board {
    /// Newly created pairs.
    pub new_pairs: Vec<TokenRecord>,
    /// Tokens close to completing the bonding curve.
    pub final_stretch: Vec<TokenRecord>,
    /// Tokens that migrated to a DEX.
    pub migrated: Vec<TokenRecord>,
}

impl BoardParser for Board {
    fn parse_from_reader<R: Read>(reader: R) -> Result<Self, PulseError> {
        let board: Board = serde_json::from_reader(reader)?;
        if let Some(record) = Column::ALL
            .iter()
            .flat_map(|column| board.column(*column))
            .find(|record| record.id.trim().is_empty())
        {
            return Err(PulseError::Format(format!(
                "token {:?} has an empty id",
                record.name
            )));
        }
        Ok(board)
    }
}

impl Board {
    /// Records of `column`.
    pub fn column(&self, column: Column) -> &[TokenRecord] {
        match column {
            Column::NewPairs => &self.new_pairs,
            Column::FinalStretch => &self.final_stretch,
            Column::Migrated => &self.migrated,
        }
    }

    /// Mutable records of `column`.
    pub fn column_mut(&mut self, column: Column) -> &mut Vec<TokenRecord> {
        match column {
            Column::NewPairs => &mut self.new_pairs,
            Column::FinalStretch => &mut self.final_stretch,
            Column::Migrated => &mut self.migrated,
        }
    }

    /// Merge `update` into every record carrying its id.
    ///
    /// Returns the column and price move of the first match, `None` when no record has
    /// that id.
    pub fn apply_update(&mut self, update: &TokenUpdate) -> Option<(Column, PriceDirection)> {
        let mut first = None;
        for column in Column::ALL {
            for record in self
                .column_mut(column)
                .iter_mut()
                .filter(|record| record.id == update.id)
            {
                let direction = record.apply_update(update);
                first.get_or_insert((column, direction));
            }
        }
        first
    }

    /// Every distinct token id, column by column, first occurrence first.
    pub fn ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        Column::ALL
            .iter()
            .flat_map(|column| self.column(*column))
            .filter(|record| seen.insert(record.id.as_str()))
            .map(|record| record.id.clone())
            .collect()
    }

    /// Number of records across all columns.
    pub fn len(&self) -> usize {
        self.new_pairs.len() + self.final_stretch.len() + self.migrated.len()
    }

    /// True when no column has records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Built-in mock board used when no board file is given.
    pub fn demo() -> Self {
        Board {
            new_pairs: vec![
                demo_token("pcc1", "PCC1", "grapeseed compound, PCC1", "1m", "$4.84K", "$477", 1, 4.0, None)
                    .with_flags(true, true, false, Some("DS")),
                demo_token("nvidia", "NVIDIA", "NVIDIA MEME Token", "39s", "$145K", "$7K", 47, -15.0, Some(14.0)),
                demo_token("spirit", "spirit", "spirit in an air vent", "59s", "$335K", "$13K", 107, -17.0, None),
                demo_token("gmoon", "GMOON", "good morning moon", "12s", "$6.1K", "$890", 3, 2.0, None),
            ],
            final_stretch: vec![
                demo_token("wojak", "WOJAK", "wojak terminal", "14m", "$58.2K", "$21K", 312, 8.5, Some(22.0))
                    .with_flags(true, false, false, Some("FS")),
                demo_token("catnip", "CATNIP", "cat on nip", "27m", "$71K", "$33K", 421, -4.0, Some(-9.0)),
                demo_token("based", "BASED", "based department", "2h", "$49.9K", "$15K", 280, 1.0, None),
            ],
            migrated: vec![
                demo_token("pepe2", "PEPE2", "pepe the second", "1d", "$2.1M", "$640K", 5_210, 12.0, Some(48.0))
                    .with_flags(true, false, true, None),
                demo_token("lumen", "LUMEN", "lumen protocol", "6h", "$1.2M", "$210K", 2_380, -3.0, Some(5.5))
                    .with_flags(false, false, true, None),
                demo_token("rugged", "RUG", "totally not a rug", "3h", "$388K", "$96K", 940, -22.0, Some(-41.0))
                    .with_flags(false, true, true, None),
            ],
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn demo_token(
    id: &str,
    name: &str,
    ticker: &str,
    age: &str,
    market_cap: &str,
    volume: &str,
    holders: u64,
    change_1h: f64,
    change_24h: Option<f64>,
) -> TokenRecord {
    TokenRecord {
        id: id.to_string(),
        name: name.to_string(),
        ticker: ticker.to_string(),
        age: age.to_string(),
        market_cap: market_cap.to_string(),
        volume: volume.to_string(),
        price: volume.trim_start_matches('$').to_string(),
        holders: Some(holders),
        change_1h: Some(change_1h),
        change_6h: Some(0.0),
        change_24h,
        ..Default::default()
    }
}

trait DemoFlags {
    fn with_flags(self, verified: bool, flagged: bool, graduated: bool, bonding: Option<&str>) -> Self;
}

impl DemoFlags for TokenRecord {
    fn with_flags(mut self, verified: bool, flagged: bool, graduated: bool, bonding: Option<&str>) -> Self {
        self.verified = verified;
        self.flagged = flagged;
        self.graduated = graduated;
        self.bonding_stage = bonding.map(str::to_string);
        self
    }
}
