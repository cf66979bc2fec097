//! Shared helpers for mapping rows and driver errors.

use chrono::{DateTime, Utc};

use crate::domain::foundation::{DomainError, ErrorCode, Money, Timestamp};

/// Wraps a driver error with the operation that failed.
pub(super) fn db_error(operation: &str, err: sqlx::Error) -> DomainError {
    tracing::error!(operation, error = %err, "Database operation failed");
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Failed to {}: {}", operation, err),
    )
}

/// A stored value that no longer parses into its domain type.
pub(super) fn corrupt(column: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} value in database: {}", column, err),
    )
}

pub(super) fn money(column: &str, cents: i64) -> Result<Money, DomainError> {
    Money::from_cents(cents).map_err(|e| corrupt(column, e))
}

pub(super) fn timestamp(dt: DateTime<Utc>) -> Timestamp {
    Timestamp::from_datetime(dt)
}

pub(super) fn datetime(ts: &Timestamp) -> DateTime<Utc> {
    *ts.as_datetime()
}

pub(super) fn opt_datetime(ts: Option<&Timestamp>) -> Option<DateTime<Utc>> {
    ts.map(datetime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_cents_are_corrupt() {
        let err = money("amount_cents", -1).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.message.contains("amount_cents"));
    }

    #[test]
    fn datetime_round_trips_timestamp() {
        let now = Timestamp::now();
        assert_eq!(timestamp(datetime(&now)), now);
    }
}
