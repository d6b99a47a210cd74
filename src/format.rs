use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places shown for percentages and used quantities.
pub const DISPLAY_DP: u32 = 2;

/// Round half-to-even to `dp` places.
pub fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
}

/// Format a percentage with exactly two decimal places (`42.5` → `42.50`).
pub fn format_percentage(value: Decimal) -> String {
    let mut out = round_dp(value, DISPLAY_DP).to_string();
    let decimals = match out.find('.') {
        Some(dot) => out.len() - dot - 1,
        None => {
            out.push('.');
            0
        }
    };
    // Padded on the string so values too large to rescale still get two places.
    for _ in decimals..DISPLAY_DP as usize {
        out.push('0');
    }
    out
}

/// Format a quantity rounded to two places, trailing zeros stripped but with
/// at least one decimal place (`42.50` → `42.5`, `7` → `7.0`).
pub fn format_quantity(value: Decimal) -> String {
    let s = round_dp(value, DISPLAY_DP).normalize().to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}
