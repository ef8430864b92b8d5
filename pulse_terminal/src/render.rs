//! Plain-text rendering of board columns.
use pulse_common::{Column, SortState, TokenRecord};
use std::fmt::Write;

const NAME_WIDTH: usize = 10;

/// Render `records` of `column`, sorted by `state`, as a fixed-width table.
pub fn render_column(column: Column, records: &[TokenRecord], state: SortState) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "== {} ({}) sorted by {} {} ==",
        column.title(),
        records.len(),
        state.key,
        state.direction
    );
    let _ = writeln!(
        out,
        "{:<w$} {:>5} {:>9} {:>9} {:>12} {:>7} {:>8} {:>8}  flags",
        "name",
        "age",
        "mc",
        "vol",
        "price",
        "holders",
        "1h",
        "24h",
        w = NAME_WIDTH
    );
    for record in state.apply(records) {
        let _ = writeln!(out, "{}", render_row(&record));
    }
    out
}

fn render_row(record: &TokenRecord) -> String {
    format!(
        "{:<w$} {:>5} {:>9} {:>9} {:>12} {:>7} {:>8} {:>8}  {}",
        truncate(&record.name, NAME_WIDTH),
        record.age,
        record.market_cap,
        record.volume,
        record.price,
        record.holders.map(|h| h.to_string()).unwrap_or_else(|| "-".to_string()),
        percent(record.change_1h),
        percent(record.change_24h),
        flags(record),
        w = NAME_WIDTH
    )
}

fn percent(change: Option<f64>) -> String {
    match change {
        Some(value) if value > 0.0 => format!("+{}%", value),
        Some(value) => format!("{}%", value),
        None => "-".to_string(),
    }
}

fn flags(record: &TokenRecord) -> String {
    let mut flags = Vec::new();
    if record.verified {
        flags.push("verified".to_string());
    }
    if record.flagged {
        flags.push("flagged".to_string());
    }
    if record.graduated {
        flags.push("graduated".to_string());
    }
    if let Some(stage) = &record.bonding_stage {
        flags.push(format!("bonding:{stage}"));
    }
    flags.join(",")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(width - 1).collect();
        short.push('…');
        short
    }
}
