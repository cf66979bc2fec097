//! Money value object stored as integer cents.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Non-negative amount in the smallest currency unit (centavos).
///
/// Serialized as a decimal number (`19.9`) to match the gateway wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest accepted amount: one billion in whole units.
    pub const MAX_CENTS: i64 = 100_000_000_000;

    /// Creates an amount from cents.
    pub fn from_cents(cents: i64) -> Result<Self, ValidationError> {
        if cents < 0 {
            return Err(ValidationError::invalid_format("amount", "must not be negative"));
        }
        if cents > Self::MAX_CENTS {
            return Err(ValidationError::invalid_format("amount", "exceeds the maximum amount"));
        }
        Ok(Self(cents))
    }

    /// Converts a decimal amount, rounding to the nearest cent.
    pub fn from_decimal(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::invalid_format("amount", "must be a finite number"));
        }
        let cents = (value * 100.0).round();
        if cents > Self::MAX_CENTS as f64 {
            return Err(ValidationError::invalid_format("amount", "exceeds the maximum amount"));
        }
        Self::from_cents(cents as i64)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// `self * percent / 100`, rounded half-up to the cent.
    pub fn percent(&self, percent: u8) -> Money {
        let scaled = (i128::from(self.0) * i128::from(percent) + 50) / 100;
        Money(i64::try_from(scaled).unwrap_or(i64::MAX))
    }

    /// Saturating subtraction, never below zero.
    pub fn saturating_sub(&self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }
}

impl TryFrom<f64> for Money {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Money> for f64 {
    fn from(money: Money) -> Self {
        money.as_decimal()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
