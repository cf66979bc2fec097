//! Gateway payment status and the amount floor.

use crate::domain::foundation::Money;

/// What a one-time payment status means for the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDisposition {
    /// `approved`: grant access.
    Approve,
    /// `rejected` / `cancelled`: record a failure, keep the row pending.
    Fail,
    /// Anything else (`pending`, `in_process`, `refunded`, ...): nothing to do.
    Ignore,
}

impl PaymentDisposition {
    pub fn from_gateway_status(status: &str) -> Self {
        match status {
            "approved" => PaymentDisposition::Approve,
            "rejected" | "cancelled" => PaymentDisposition::Fail,
            _ => PaymentDisposition::Ignore,
        }
    }
}

/// Lowest amount accepted for an approved purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountFloor {
    pub minimum: Money,
    pub margin: Money,
}

impl AmountFloor {
    pub fn new(minimum: Money, margin: Money) -> Self {
        Self { minimum, margin }
    }

    /// Effective threshold, `minimum - margin`.
    pub fn threshold(&self) -> Money {
        self.minimum.saturating_sub(self.margin)
    }

    /// A missing amount never passes.
    pub fn accepts(&self, amount: Option<Money>) -> bool {
        matches!(amount, Some(a) if a >= self.threshold())
    }
}

impl Default for AmountFloor {
    fn default() -> Self {
        Self {
            minimum: Money::from_cents(1600).unwrap_or(Money::ZERO),
            margin: Money::from_cents(1).unwrap_or(Money::ZERO),
        }
    }
}
