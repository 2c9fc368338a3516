//! Conversion between decimal display amounts and smallest units

use alloy_primitives::utils::{format_units, parse_units};
use alloy_primitives::U256;

use crate::error::{Error, Result};

/// Parse a user-entered decimal amount into smallest units
///
/// Accepts plain decimals only (`"1"`, `"0.5"`, `".25"`). Rejects signs,
/// exponents, empty input, more fractional digits than `decimals`, and zero.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256> {
    let invalid = |reason: &str| Error::InvalidAmount {
        amount: input.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("amount is empty"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("amount must be positive"));
    }
    if !trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(invalid("not a decimal number"));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    if fraction.contains('.') || (whole.is_empty() && fraction.is_empty()) {
        return Err(invalid("not a decimal number"));
    }
    if fraction.len() > decimals as usize {
        return Err(invalid(&format!(
            "more than {} fractional digits",
            decimals
        )));
    }

    let normalized = match (whole.is_empty(), fraction.is_empty()) {
        (true, _) => format!("0.{}", fraction),
        (false, true) => whole.to_string(),
        (false, false) => format!("{}.{}", whole, fraction),
    };

    let value = parse_units(&normalized, decimals)
        .map_err(|e| invalid(&e.to_string()))?
        .get_absolute();

    if value.is_zero() {
        return Err(invalid("amount must be greater than zero"));
    }

    Ok(value)
}

/// Format smallest units as a decimal string
///
/// Trailing fractional zeros are trimmed, keeping one digit (`"1.0"`).
pub fn format_amount(raw: U256, decimals: u8) -> Result<String> {
    let formatted = format_units(raw, decimals)
        .map_err(|e| Error::Internal(format!("Cannot format {}: {}", raw, e)))?;

    if !formatted.contains('.') {
        return Ok(formatted);
    }

    let mut trimmed = formatted.trim_end_matches('0').to_string();
    if trimmed.ends_with('.') {
        trimmed.push('0');
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const HALF_ETHER: u64 = 500_000_000_000_000_000;

    #[test]
    fn test_parse_amounts() {
        assert_eq!(parse_amount("0.5", 18).unwrap(), U256::from(HALF_ETHER));
        assert_eq!(parse_amount(".5", 18).unwrap(), U256::from(HALF_ETHER));
        assert_eq!(parse_amount(" 2 ", 18).unwrap(), U256::from(2_000_000_000_000_000_000u64));
        assert_eq!(parse_amount("3.", 6).unwrap(), U256::from(3_000_000u64));
        assert_eq!(parse_amount("0.000001", 6).unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_rejected_amounts() {
        for bad in ["", "   ", "abc", "-1", "-0.5", "0", "0.0", "1e18", "1.2.3", ".", "+1", "0x10", "1,5"] {
            let err = parse_amount(bad, 18).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_too_many_fraction_digits() {
        assert!(parse_amount("0.0000001", 6).is_err());
    }

    #[test]
    fn test_format_amounts() {
        assert_eq!(format_amount(U256::from(HALF_ETHER), 18).unwrap(), "0.5");
        assert_eq!(format_amount(U256::ZERO, 18).unwrap(), "0.0");
        assert_eq!(
            format_amount(U256::from(1_250_000_000_000_000_000u64), 18).unwrap(),
            "1.25"
        );
        assert_eq!(format_amount(U256::from(1_000_000u64), 6).unwrap(), "1.0");
    }
}
