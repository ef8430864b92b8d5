//! Display formatting and the permissive parsers behind client-side sorting.
//!
//! Market cap and volume travel to the UI as short strings (`"145.00K"`, `"$2.1M"`),
//! ages as `"39s"` or `"2h"`. Formatting happens once at the boundary; the parsers
//! here recover a comparable number from such strings and never fail: anything they
//! cannot make sense of is worth `0`.

/// Format a market cap or volume figure with a `K`/`M` unit and two decimals.
///
/// `999.0` → `"999.00"`, `1500.0` → `"1.50K"`, `2_500_000.0` → `"2.50M"`.
/// Ties round up: `1125.0` → `"1.13K"`.
pub fn format_number(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.2}M", round2(value / 1_000_000.0))
    } else if value >= 1_000.0 {
        format!("{:.2}K", round2(value / 1_000.0))
    } else {
        format!("{:.2}", round2(value))
    }
}

/// Format a price with six decimals and no unit, ties rounded away from zero.
pub fn format_price(value: f64) -> String {
    format!("{:.6}", round_to(value, 1e6))
}

/// Round to two decimal places, ties away from zero. Never returns `-0.0`.
pub fn round2(value: f64) -> f64 {
    round_to(value, 100.0)
}

fn round_to(value: f64, scale: f64) -> f64 {
    // `+ 0.0` folds a negative zero into zero
    (value * scale).round() / scale + 0.0
}

/// Parse an age string such as `"39s"`, `"1m"`, `"2h"` or `"1d"` into seconds.
///
/// The magnitude is the leading integer; the unit is detected by the first of
/// `s`, `m`, `h`, `d` present in the string, checked in that order. A bare number
/// or an unknown unit yields `0`.
pub fn parse_age(age: &str) -> i64 {
    let Some(magnitude) = leading_int(age) else {
        return 0;
    };
    let unit = if age.contains('s') {
        1
    } else if age.contains('m') {
        60
    } else if age.contains('h') {
        3_600
    } else if age.contains('d') {
        86_400
    } else {
        return 0;
    };
    magnitude.saturating_mul(unit)
}

/// Parse a currency string such as `"$4.84K"` or `"$1.2M"` into a plain amount.
///
/// `$`, `,` and `K` are stripped before the numeric parse. The unit multiplier is
/// decided on the original string: `M` wins over `K`.
pub fn parse_currency(amount: &str) -> f64 {
    let stripped: String = amount
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | 'K'))
        .collect();
    let Some(value) = leading_float(&stripped) else {
        return 0.0;
    };
    if amount.contains('M') {
        value * 1_000_000.0
    } else if amount.contains('K') {
        value * 1_000.0
    } else {
        value
    }
}

/// Leading signed integer after optional whitespace, the way `parseInt` reads it.
fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    text[..end].parse().ok()
}

/// Longest leading decimal number after optional whitespace, the way `parseFloat` reads it.
fn leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
            digits += 1;
        }
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    // optional exponent, only consumed when it is complete
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    text[..end].trim_end_matches('.').parse().ok()
}
