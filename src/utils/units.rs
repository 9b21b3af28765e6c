//! Native value formatting

use alloy::primitives::{utils::format_units, U256};

/// Decimals of the chain's native asset
pub const NATIVE_DECIMALS: u8 = 18;

/// Fractional digits kept when displaying a native value
pub const DISPLAY_DECIMALS: usize = 6;

/// Formats a wei amount in base units, truncated to six fractional digits
///
/// Padding zeros are dropped first (`1.5` ether displays as `1.5`, one ether
/// as `1.0`), then truncation cuts without rounding up: `1.9999999` ether
/// displays as `1.999999`. Returns `None` for a zero amount.
pub fn format_native_value(wei: U256) -> Option<String> {
    if wei.is_zero() {
        return None;
    }
    let formatted = format_units(wei, NATIVE_DECIMALS).ok()?;
    Some(truncate_decimals(trim_padding(&formatted), DISPLAY_DECIMALS))
}

/// Strips trailing fractional zeros, keeping at least one fractional digit
fn trim_padding(value: &str) -> &str {
    match value.split_once('.') {
        Some((whole, fraction)) => {
            let kept = fraction.trim_end_matches('0').len().max(1);
            &value[..whole.len() + 1 + kept]
        }
        None => value,
    }
}

/// Cuts the fractional part of a decimal string to at most `max_digits`
pub fn truncate_decimals(value: &str, max_digits: usize) -> String {
    match value.split_once('.') {
        Some((whole, fraction)) => {
            let end = fraction
                .char_indices()
                .nth(max_digits)
                .map_or(fraction.len(), |(idx, _)| idx);
            format!("{whole}.{}", &fraction[..end])
        }
        None => value.to_string(),
    }
}
