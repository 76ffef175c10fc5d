// Copyright (c) 2025 The Critical Money developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Conversion between human readable decimal amounts and token units.

use alloy_primitives::U256;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitsError {
    /// Not a decimal number.
    Invalid(String),

    /// Negative amounts have no token representation.
    Negative,

    /// More fraction digits than the token has decimals.
    TooManyDecimals { decimals: u8 },
}

impl fmt::Display for UnitsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitsError::Invalid(input) => write!(f, "invalid decimal amount: {input:?}"),
            UnitsError::Negative => write!(f, "amount must not be negative"),
            UnitsError::TooManyDecimals { decimals } => {
                write!(f, "amount has more than {decimals} decimals")
            }
        }
    }
}

impl std::error::Error for UnitsError {}

/// Parses a decimal string into a human amount.
pub fn parse_decimal(input: &str) -> Result<Decimal, UnitsError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UnitsError::Invalid(input.to_owned()));
    }

    Decimal::from_str(trimmed).map_err(|_| UnitsError::Invalid(input.to_owned()))
}

/// Fixed point representation of `amount` with `decimals` digits.
pub fn decimal_to_units(amount: Decimal, decimals: u8) -> Result<U256, UnitsError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitsError::Negative);
    }

    let amount = amount.normalize();
    let scale = amount.scale();
    if scale > decimals as u32 {
        return Err(UnitsError::TooManyDecimals { decimals });
    }

    let mantissa = amount.mantissa().unsigned_abs();
    let exp = decimals as u32 - scale;
    Ok(U256::from(mantissa) * U256::from(10u64).pow(U256::from(exp)))
}

/// Formats token units as a decimal string, always keeping one fraction digit.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits)
    } else {
        digits
    };

    let (int, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{int}.0")
    } else {
        format!("{int}.{frac}")
    }
}

/// Display form of a balance: two fraction digits and thousands separators.
pub fn display_amount(value: U256, decimals: u8) -> String {
    let formatted = format_units(value, decimals);
    let amount = match Decimal::from_str(&formatted) {
        Ok(amount) => amount,
        Err(_) => return formatted,
    };

    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{rounded:.2}");
    let (int, frac) = text.split_once('.').unwrap_or((&text, "00"));

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{grouped}.{frac}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn units(input: &str, decimals: u8) -> Result<U256, UnitsError> {
        decimal_to_units(parse_decimal(input)?, decimals)
    }

    #[test]
    fn parses_usdc_amounts() {
        assert_eq!(units("1", 6).unwrap(), U256::from(1_000_000u64));
        assert_eq!(units("10.5", 6).unwrap(), U256::from(10_500_000u64));
        assert_eq!(units("0.000001", 6).unwrap(), U256::from(1u64));
        assert_eq!(units(" 2.50 ", 6).unwrap(), U256::from(2_500_000u64));
    }

    #[test]
    fn parses_ounces_with_eighteen_decimals() {
        let expected = U256::from(1000u64) * U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(units("1000", 18).unwrap(), expected);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(units("", 6), Err(UnitsError::Invalid(_))));
        assert!(matches!(units("abc", 6), Err(UnitsError::Invalid(_))));
        assert_eq!(units("-1", 6), Err(UnitsError::Negative));
        assert_eq!(
            units("0.0000001", 6),
            Err(UnitsError::TooManyDecimals { decimals: 6 })
        );
        assert_eq!(
            decimal_to_units(dec!(1.5), 0),
            Err(UnitsError::TooManyDecimals { decimals: 0 })
        );
    }

    #[test]
    fn formats_units() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_units(U256::ZERO, 6), "0.0");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn displays_two_decimals_with_grouping() {
        assert_eq!(display_amount(U256::from(1_234_567_890u64), 6), "1,234.57");
        assert_eq!(display_amount(U256::ZERO, 6), "0.00");
        assert_eq!(display_amount(U256::from(999_999u64), 6), "1.00");
        assert_eq!(
            display_amount(U256::from(1_000_000_000_000u64), 6),
            "1,000,000.00"
        );
    }
}
