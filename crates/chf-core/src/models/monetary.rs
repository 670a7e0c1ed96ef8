//! Exact fixed-point monetary values
//!
//! Tariffs travel as `(value_digits, exponent)` pairs where `exponent` is
//! the number of fractional digits: `"12.34"` is `(1234, 2)`, i.e. the value
//! is `value_digits × 10^-exponent`, and a negative exponent scales up.
//!
//! This is the inverse of the RFC 4006 Unit-Value sign convention
//! (`digits × 10^exponent`). A remote rating function answering
//! `RatingSv1.ServiceUsage` must send the exponent as a fractional digit
//! count. Conversion to [`Decimal`] is exact.

use crate::error::ChargingError;
use crate::ChargingResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest number of fractional digits a `Decimal` can carry
const MAX_EXPONENT: i32 = 28;

/// Fixed-point value made of integer digits and a decimal exponent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitValue {
    pub value_digits: i64,
    pub exponent: i32,
}

impl UnitValue {
    pub fn new(value_digits: i64, exponent: i32) -> Self {
        Self {
            value_digits,
            exponent,
        }
    }

    /// Parse a stored unit-cost string such as `"5"` or `"12.34"`
    ///
    /// Without a decimal point the exponent is 0 and the digits are the
    /// integer value. With a point the exponent is the count of digits after
    /// it and the digits are the integer formed by removing the point.
    pub fn parse(raw: &str) -> ChargingResult<Self> {
        let raw = raw.trim();
        let invalid = || ChargingError::InvalidTariff(format!("cannot parse unit cost '{}'", raw));

        let (integer_part, fraction_part) = match raw.split_once('.') {
            Some((integer, fraction)) => (integer, fraction),
            None => (raw, ""),
        };

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(integer_part) || !all_digits(fraction_part) {
            return Err(invalid());
        }
        if integer_part.is_empty() && fraction_part.is_empty() {
            return Err(invalid());
        }

        let exponent = i32::try_from(fraction_part.len()).map_err(|_| invalid())?;
        if exponent > MAX_EXPONENT {
            return Err(invalid());
        }

        let value_digits = format!("{}{}", integer_part, fraction_part)
            .parse::<i64>()
            .map_err(|_| invalid())?;

        Ok(Self {
            value_digits,
            exponent,
        })
    }

    /// Exact decimal value
    pub fn to_decimal(&self) -> ChargingResult<Decimal> {
        if self.exponent >= 0 {
            let scale = u32::try_from(self.exponent)
                .map_err(|_| ChargingError::InvalidTariff(self.to_string()))?;
            return Decimal::try_new(self.value_digits, scale)
                .map_err(|e| ChargingError::InvalidTariff(e.to_string()));
        }

        // Negative exponents scale the digits up
        let mut value = Decimal::from(self.value_digits);
        for _ in 0..self.exponent.unsigned_abs() {
            value = value
                .checked_mul(Decimal::TEN)
                .ok_or_else(|| ChargingError::InvalidTariff(self.to_string()))?;
        }
        Ok(value)
    }
}

impl fmt::Display for UnitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}e{}", self.value_digits, -i64::from(self.exponent))
    }
}
