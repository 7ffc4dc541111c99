//! Fixed-point amount utilities.
//!
//! ## Overview
//!
//! All amounts in the order book are `i64` values scaled by 10^7, the
//! 7-decimal "stroop" convention. Arithmetic inside the graph and the path
//! search is integer-only; `Decimal` conversion exists purely for the
//! request/response boundary and is never fed back into a computation.
//!
//! ## Why Fixed-Point?
//!
//! Floating-point arithmetic can produce different results on different
//! hardware, breaking determinism. Fixed-point ensures identical results
//! everywhere.
//!
//! ## Examples
//!
//! ```
//! use orderbook_graph::types::amount::{format_amount, parse_amount};
//!
//! assert_eq!(format_amount(500), "0.0000500");
//! assert_eq!(parse_amount("2.5"), Some(25_000_000));
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Scaling factor for fixed-point amounts: 10^7 (7 decimal places).
pub const SCALE: i64 = 10_000_000;

/// Largest representable amount, used as the saturation bound when
/// aggregating price levels.
pub const MAX_AMOUNT: i64 = i64::MAX;

/// Convert a decimal string to a raw fixed-point amount.
///
/// Returns `None` for negative values, unparsable input, or values that do
/// not fit in an `i64` at 10^7 scale.
pub fn parse_amount(s: &str) -> Option<i64> {
    let decimal = Decimal::from_str(s).ok()?;
    if decimal.is_sign_negative() {
        return None;
    }
    let scaled = decimal.checked_mul(Decimal::from(SCALE))?;
    if scaled.fract() != Decimal::ZERO {
        return None;
    }
    scaled.to_i64()
}

/// Format a raw fixed-point amount with the full 7 decimal places.
///
/// ```
/// use orderbook_graph::types::amount::format_amount;
///
/// assert_eq!(format_amount(10_000_000), "1.0000000");
/// assert_eq!(format_amount(500), "0.0000500");
/// ```
pub fn format_amount(value: i64) -> String {
    let decimal = Decimal::from(value) / Decimal::from(SCALE);
    format!("{:.7}", decimal)
}

/// Add two amounts, clamping at [`MAX_AMOUNT`] instead of overflowing.
///
/// Price level aggregation uses this so that a book holding offers near
/// `i64::MAX` reports a clamped total rather than panicking.
pub fn saturating_add_amount(a: i64, b: i64) -> i64 {
    a.saturating_add(b)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_constant() {
        assert_eq!(SCALE, 10_000_000);
    }

    #[test]
    fn test_parse_amount_basic() {
        assert_eq!(parse_amount("1"), Some(10_000_000));
        assert_eq!(parse_amount("1.0"), Some(10_000_000));
        assert_eq!(parse_amount("0.0000001"), Some(1));
        assert_eq!(parse_amount("922337203685.4775807"), Some(i64::MAX));
    }

    #[test]
    fn test_parse_amount_rejects() {
        assert_eq!(parse_amount("-1"), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        // More precision than a stroop
        assert_eq!(parse_amount("0.00000001"), None);
        // Out of range
        assert_eq!(parse_amount("922337203685.4775808"), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0.0000000");
        assert_eq!(format_amount(500), "0.0000500");
        assert_eq!(format_amount(10_000_000), "1.0000000");
        assert_eq!(format_amount(25_000_000), "2.5000000");
    }

    #[test]
    fn test_roundtrip() {
        for s in ["1.0000000", "0.0000500", "50000.1234567"] {
            let raw = parse_amount(s).unwrap();
            assert_eq!(format_amount(raw), s);
        }
    }

    #[test]
    fn test_saturating_add() {
        assert_eq!(saturating_add_amount(1, 2), 3);
        assert_eq!(saturating_add_amount(i64::MAX, 500), i64::MAX);
    }
}
