// This file is part of the SORA network and Polkaswap app.

// Copyright (c) 2020, 2021, Polka Biome Ltd. All rights reserved.
// SPDX-License-Identifier: BSD-4-Clause

// Redistribution and use in source and binary forms, with or without modification,
// are permitted provided that the following conditions are met:

// Redistributions of source code must retain the above copyright notice, this list
// of conditions and the following disclaimer.
// Redistributions in binary form must reproduce the above copyright notice, this
// list of conditions and the following disclaimer in the documentation and/or other
// materials provided with the distribution.
//
// All advertising materials mentioning features or use of this software must display
// the following acknowledgement: This product includes software developed by Polka Biome
// Ltd., SORA, and Polkaswap.
//
// Neither the name of the Polka Biome Ltd. nor the names of its contributors may be used
// to endorse or promote products derived from this software without specific prior written permission.

// THIS SOFTWARE IS PROVIDED BY Polka Biome Ltd. AS IS AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR
// A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL Polka Biome Ltd. BE LIABLE FOR ANY
// DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING,
// BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR PROFITS;
// OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT,
// STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Conversions between raw chain units and human decimal amounts.
//!
//! Everything here works on the integer mantissa of [`BigDecimal`], binary floating point is
//! never involved. All functions are pure.

use crate::prelude::*;
use core::str::FromStr;
use num_bigint::{BigInt, Sign};
use num_format::{Locale, ToFormattedString};
use num_traits::{ToPrimitive, Zero};

/// Denominator of basis points.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Fraction digits shown when the caller does not ask for a precision.
pub const DEFAULT_DISPLAY_DIGITS: u32 = 4;

/// Significant digits kept after the leading zeros of values below one.
pub const SIGNIFICANT_DIGITS_BELOW_ONE: u32 = 4;

/// Upper limit of fraction digits in display strings.
pub const MAX_DISPLAY_DIGITS: u32 = 18;

/// Marker put in front of positive amounts that round to zero.
pub const APPROXIMATELY: &str = "~";

fn pow10(exp: u64) -> BigInt {
    num_traits::pow(BigInt::from(10u8), exp as usize)
}

fn abs_mantissa(value: &BigDecimal) -> (BigInt, i64, bool) {
    let (mantissa, scale) = value.as_bigint_and_exponent();
    let negative = mantissa.sign() == Sign::Minus;
    let mantissa = if negative { -mantissa } else { mantissa };
    (mantissa, scale, negative)
}

/// `floor(amount * 10^decimals)`. Fractions below one raw unit are dropped.
pub fn to_raw_units(amount: &BigDecimal, decimals: BalancePrecision) -> Result<Balance, InputError> {
    let (mantissa, scale) = amount.as_bigint_and_exponent();
    if mantissa.sign() == Sign::Minus {
        return Err(InputError::NegativeAmount);
    }
    let shift = decimals as i64 - scale;
    let raw = if shift >= 0 {
        mantissa * pow10(shift as u64)
    } else {
        mantissa / pow10(shift.unsigned_abs())
    };
    raw.to_u128().ok_or(InputError::Overflow)
}

/// `raw / 10^decimals`, exact.
pub fn from_raw_units(raw: Balance, decimals: BalancePrecision) -> BigDecimal {
    BigDecimal::new(BigInt::from(raw), decimals as i64)
}

/// Parses a user typed amount. Empty input is zero.
pub fn parse_amount(input: &str) -> Result<BigDecimal, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(BigDecimal::zero());
    }
    let invalid = || InputError::InvalidNumber {
        value: trimmed.to_string(),
    };
    let well_formed = trimmed != "."
        && trimmed.matches('.').count() <= 1
        && trimmed.chars().all(|c| c.is_ascii_digit() || c == '.');
    if !well_formed {
        return Err(invalid());
    }
    let normalized = if trimmed.starts_with('.') {
        format!("0{}", trimmed)
    } else if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    };
    BigDecimal::from_str(&normalized).map_err(|_| invalid())
}

/// Number of fractional digits of the value, trailing zeros do not count.
pub fn fractional_digits(amount: &BigDecimal) -> u64 {
    let (mut mantissa, mut scale, _) = abs_mantissa(amount);
    if mantissa.is_zero() {
        return 0;
    }
    let ten = BigInt::from(10u8);
    while scale > 0 && (&mantissa % &ten).is_zero() {
        mantissa /= &ten;
        scale -= 1;
    }
    scale.max(0) as u64
}

fn bps_factor(bps: u32) -> BigDecimal {
    BigDecimal::new(BigInt::from(bps), 4)
}

/// `amount * (1 - bps / 10000)`, never below zero.
pub fn reduce_by_slippage(amount: &BigDecimal, tolerance_bps: u32) -> BigDecimal {
    amount * &bps_factor(BPS_DENOMINATOR.saturating_sub(tolerance_bps))
}

/// `amount * (1 + bps / 10000)`.
pub fn increase_by_slippage(amount: &BigDecimal, tolerance_bps: u32) -> BigDecimal {
    amount * &bps_factor(BPS_DENOMINATOR.saturating_add(tolerance_bps))
}

/// Rounds half away from zero to `digits` fraction digits.
pub fn round_to(value: &BigDecimal, digits: u32) -> BigDecimal {
    let (mantissa, scale, negative) = abs_mantissa(value);
    let target = digits as i64;
    if scale <= target {
        return value.clone();
    }
    let divisor = pow10((scale - target) as u64);
    let half = &divisor / BigInt::from(2u8);
    let rounded = (mantissa + half) / divisor;
    let rounded = if negative { -rounded } else { rounded };
    BigDecimal::new(rounded, target)
}

/// Positional rendering of the value, never in exponent notation.
pub fn plain_string(value: &BigDecimal) -> String {
    let (mantissa, scale, negative) = abs_mantissa(value);
    let digits = mantissa.to_string();
    let body = if scale <= 0 {
        let zeros = if mantissa.is_zero() {
            String::new()
        } else {
            "0".repeat(scale.unsigned_abs() as usize)
        };
        format!("{}{}", digits, zeros)
    } else {
        let scale = scale as usize;
        let padded = if digits.len() <= scale {
            format!("{}{}", "0".repeat(scale - digits.len() + 1), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        format!("{}.{}", int_part, frac_part)
    };
    if negative && !mantissa.is_zero() {
        format!("-{}", body)
    } else {
        body
    }
}

fn leading_fraction_zeros(abs: &BigDecimal) -> u32 {
    let (mantissa, scale, _) = abs_mantissa(abs);
    let len = mantissa.to_string().len() as i64;
    (scale - len).max(0) as u32
}

fn display_digits(abs: &BigDecimal, fraction_digits: Option<u32>) -> u32 {
    match fraction_digits {
        Some(digits) if !abs.is_zero() && abs < &BigDecimal::from(1) => {
            let extended = leading_fraction_zeros(abs) + SIGNIFICANT_DIGITS_BELOW_ONE;
            digits.max(extended).min(MAX_DISPLAY_DIGITS)
        }
        Some(digits) => digits.min(MAX_DISPLAY_DIGITS),
        None => DEFAULT_DISPLAY_DIGITS,
    }
}

/// Display string with `en` grouping, see [`format_for_display_with_locale`].
pub fn format_for_display(
    value: &BigDecimal,
    fraction_digits: Option<u32>,
    as_currency: bool,
) -> String {
    format_for_display_with_locale(value, fraction_digits, as_currency, &Locale::en)
}

/// Groups the integer part, trims trailing zeros and marks positive values that would show as
/// zero with [`APPROXIMATELY`].
pub fn format_for_display_with_locale(
    value: &BigDecimal,
    fraction_digits: Option<u32>,
    as_currency: bool,
    locale: &Locale,
) -> String {
    let (mantissa, scale, negative) = abs_mantissa(value);
    let abs = BigDecimal::new(mantissa, scale);
    let digits = display_digits(&abs, fraction_digits);
    let rounded = round_to(&abs, digits);
    let rendered = plain_string(&rounded);
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((int_part, frac_part)) => (int_part.to_string(), frac_part.to_string()),
        None => (rendered.clone(), String::new()),
    };
    let mut frac_part = frac_part.trim_end_matches('0').to_string();
    if as_currency {
        while frac_part.len() < 2 {
            frac_part.push('0');
        }
    }
    let grouped = match int_part.parse::<u128>() {
        Ok(int_value) => int_value.to_formatted_string(locale),
        Err(_) => int_part,
    };
    let mut body = if as_currency {
        format!("${}", grouped)
    } else {
        grouped
    };
    if !frac_part.is_empty() {
        body.push_str(locale.decimal());
        body.push_str(&frac_part);
    }
    if rounded.is_zero() && !abs.is_zero() {
        if negative {
            return body;
        }
        return format!("{}{}", APPROXIMATELY, body);
    }
    if negative && !rounded.is_zero() {
        format!("-{}", body)
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn raw_units_round_trip() {
        assert_eq!(to_raw_units(&dec("1.2345"), 4), Ok(12345));
        assert_eq!(plain_string(&from_raw_units(12345, 4)), "1.2345");
        for (value, decimals) in [("0", 12), ("1", 0), ("0.000001", 6), ("123456.789", 12)] {
            let value = dec(value);
            let raw = to_raw_units(&value, decimals).unwrap();
            assert_eq!(from_raw_units(raw, decimals), value);
        }
    }

    #[test]
    fn raw_units_floor_extra_fraction() {
        assert_eq!(to_raw_units(&dec("1.23459"), 4), Ok(12345));
        assert_eq!(to_raw_units(&dec("0.0000000000000000001"), 12), Ok(0));
        assert_eq!(to_raw_units(&dec("1e3"), 2), Ok(100_000));
    }

    #[test]
    fn raw_units_reject_negative_and_overflow() {
        assert_eq!(to_raw_units(&dec("-1"), 4), Err(InputError::NegativeAmount));
        assert_eq!(
            to_raw_units(&dec("340282366920938463463374607431768211456"), 0),
            Err(InputError::Overflow)
        );
    }

    #[test]
    fn parse_amount_handles_empty_and_garbage() {
        assert_eq!(parse_amount(""), Ok(BigDecimal::zero()));
        assert_eq!(parse_amount("   "), Ok(BigDecimal::zero()));
        assert_eq!(parse_amount(".5"), Ok(dec("0.5")));
        assert_eq!(parse_amount("5."), Ok(dec("5")));
        assert_eq!(parse_amount("01.10"), Ok(dec("1.1")));
        assert!(parse_amount("1,5").is_err());
        assert!(parse_amount("1.2.3").is_err());
        assert!(parse_amount("-1").is_err());
        assert!(parse_amount("1e5").is_err());
        assert!(parse_amount(".").is_err());
    }

    #[test]
    fn fractional_digits_ignore_trailing_zeros() {
        assert_eq!(fractional_digits(&dec("1.23456")), 5);
        assert_eq!(fractional_digits(&dec("1.2300")), 2);
        assert_eq!(fractional_digits(&dec("100")), 0);
        assert_eq!(fractional_digits(&dec("0")), 0);
    }

    #[test]
    fn slippage_adjustments_are_linear() {
        assert_eq!(reduce_by_slippage(&dec("5"), 1500), dec("4.25"));
        assert_eq!(increase_by_slippage(&dec("5"), 1500), dec("5.75"));
        assert_eq!(reduce_by_slippage(&dec("5"), 0), dec("5"));
        assert_eq!(reduce_by_slippage(&dec("5"), 20_000), BigDecimal::zero());
    }

    #[test]
    fn slippage_compositions_never_exceed_input() {
        let x = dec("123.456789");
        for bps in [0, 1, 50, 1500, 5000, 9900] {
            let down_up = increase_by_slippage(&reduce_by_slippage(&x, bps), bps);
            let up_down = reduce_by_slippage(&increase_by_slippage(&x, bps), bps);
            assert!(up_down <= x, "bps {}", bps);
            assert!(down_up <= x, "bps {}", bps);
            if bps > 0 {
                assert!(reduce_by_slippage(&x, bps) < x, "bps {}", bps);
            }
        }
    }

    #[test]
    fn round_to_is_half_up() {
        assert_eq!(round_to(&dec("1.005"), 2), dec("1.01"));
        assert_eq!(round_to(&dec("1.004"), 2), dec("1"));
        assert_eq!(round_to(&dec("-1.005"), 2), dec("-1.01"));
        assert_eq!(round_to(&dec("7"), 2), dec("7"));
    }

    #[test]
    fn plain_string_has_no_exponent() {
        assert_eq!(plain_string(&dec("0.00000001")), "0.00000001");
        assert_eq!(plain_string(&dec("1e5")), "100000");
        assert_eq!(plain_string(&from_raw_units(5, 12)), "0.000000000005");
        assert_eq!(plain_string(&dec("-2.5")), "-2.5");
        assert_eq!(plain_string(&BigDecimal::zero()), "0");
    }

    #[test]
    fn display_groups_and_trims() {
        assert_eq!(format_for_display(&dec("1234567.891"), None, false), "1,234,567.891");
        assert_eq!(format_for_display(&dec("1234.5"), Some(2), false), "1,234.5");
        assert_eq!(format_for_display(&dec("1234.5"), Some(2), true), "$1,234.50");
        assert_eq!(format_for_display(&dec("2.00000"), Some(4), false), "2");
    }

    #[test]
    fn display_extends_precision_below_one() {
        assert_eq!(format_for_display(&dec("0.000012345"), Some(2), false), "0.00001235");
        assert_eq!(format_for_display(&dec("0.5"), Some(2), false), "0.5");
        assert_eq!(format_for_display(&dec("0.123456"), Some(2), false), "0.1235");
    }

    #[test]
    fn display_marks_hidden_dust() {
        assert_eq!(format_for_display(&dec("0.00001"), None, false), "~0");
        assert_eq!(format_for_display(&dec("0.00001"), None, true), "~$0.00");
        assert_eq!(format_for_display(&BigDecimal::zero(), None, false), "0");
        assert_eq!(
            format_for_display(&dec("0.0000000000000000000001"), Some(2), false),
            "~0"
        );
    }

    #[test]
    fn display_follows_locale_separators() {
        assert_eq!(
            format_for_display_with_locale(&dec("1234.5"), Some(2), false, &Locale::de),
            "1.234,5"
        );
    }
}
