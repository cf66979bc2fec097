//! External reference wire format.
//!
//! The reference string round-trips through the payment gateway untouched
//! and is the only link between a gateway payment and a local ledger row:
//!
//! - one-time purchase: `<userId>|<subjectId>|<groupNumber>`
//! - subscription: `sub|<userId>`

use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{GroupNumber, SubjectId, UserId, REFERENCE_SEPARATOR};

const SUBSCRIPTION_PREFIX: &str = "sub";

/// Why a reference string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("expected {expected} fields, got {actual}")]
    WrongArity { expected: usize, actual: usize },

    #[error("field {0} is empty")]
    EmptyField(&'static str),

    #[error("group must be a positive integer between 1 and 10, got '{0}'")]
    InvalidGroup(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Reference attached to a one-time checkout preference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PurchaseReference {
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub group: GroupNumber,
}

impl PurchaseReference {
    pub fn new(user_id: UserId, subject_id: SubjectId, group: GroupNumber) -> Self {
        Self {
            user_id,
            subject_id,
            group,
        }
    }
}

impl fmt::Display for PurchaseReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.user_id,
            self.subject_id,
            self.group,
            sep = REFERENCE_SEPARATOR
        )
    }
}

impl FromStr for PurchaseReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(REFERENCE_SEPARATOR).collect();
        if parts.len() != 3 {
            return Err(ReferenceError::WrongArity {
                expected: 3,
                actual: parts.len(),
            });
        }
        let (user, subject, group) = (parts[0], parts[1], parts[2]);
        if user.is_empty() {
            return Err(ReferenceError::EmptyField("user_id"));
        }
        if subject.is_empty() {
            return Err(ReferenceError::EmptyField("subject_id"));
        }
        if group.is_empty() {
            return Err(ReferenceError::EmptyField("group"));
        }

        let group = group
            .parse::<i32>()
            .ok()
            .and_then(|n| GroupNumber::new(n).ok())
            .ok_or_else(|| ReferenceError::InvalidGroup(group.to_string()))?;
        let user_id =
            UserId::new(user).map_err(|e| ReferenceError::InvalidIdentifier(e.to_string()))?;
        let subject_id =
            SubjectId::new(subject).map_err(|e| ReferenceError::InvalidIdentifier(e.to_string()))?;

        Ok(Self::new(user_id, subject_id, group))
    }
}

/// Reference attached to a recurring preapproval.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionReference {
    pub user_id: UserId,
}

impl fmt::Display for SubscriptionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", SUBSCRIPTION_PREFIX, REFERENCE_SEPARATOR, self.user_id)
    }
}

impl FromStr for SubscriptionReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(REFERENCE_SEPARATOR).collect();
        if parts.len() != 2 || parts[0] != SUBSCRIPTION_PREFIX {
            return Err(ReferenceError::WrongArity {
                expected: 2,
                actual: parts.len(),
            });
        }
        if parts[1].is_empty() {
            return Err(ReferenceError::EmptyField("user_id"));
        }
        let user_id =
            UserId::new(parts[1]).map_err(|e| ReferenceError::InvalidIdentifier(e.to_string()))?;
        Ok(Self { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_purchase_reference() {
        let reference: PurchaseReference = "U|cm|5".parse().unwrap();
        assert_eq!(reference.user_id.as_str(), "U");
        assert_eq!(reference.subject_id.as_str(), "cm");
        assert_eq!(reference.group.value(), 5);
    }

    #[test]
    fn formats_purchase_reference() {
        let reference = PurchaseReference::new(
            UserId::new("U").unwrap(),
            SubjectId::new("cm").unwrap(),
            GroupNumber::new(5).unwrap(),
        );
        assert_eq!(reference.to_string(), "U|cm|5");
    }

    #[test]
    fn rejects_wrong_arity() {
        assert_eq!(
            "U|cm".parse::<PurchaseReference>(),
            Err(ReferenceError::WrongArity { expected: 3, actual: 2 })
        );
        assert!("U|cm|5|x".parse::<PurchaseReference>().is_err());
        assert!("".parse::<PurchaseReference>().is_err());
    }

    #[test]
    fn rejects_empty_fields() {
        assert_eq!(
            "|cm|5".parse::<PurchaseReference>(),
            Err(ReferenceError::EmptyField("user_id"))
        );
        assert_eq!(
            "U||5".parse::<PurchaseReference>(),
            Err(ReferenceError::EmptyField("subject_id"))
        );
        assert_eq!(
            "U|cm|".parse::<PurchaseReference>(),
            Err(ReferenceError::EmptyField("group"))
        );
    }

    #[test]
    fn rejects_non_positive_and_non_numeric_groups() {
        for bad in ["U|cm|0", "U|cm|-1", "U|cm|abc", "U|cm|2.5", "U|cm|11"] {
            assert!(
                matches!(bad.parse::<PurchaseReference>(), Err(ReferenceError::InvalidGroup(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn subscription_reference_round_trip() {
        let reference: SubscriptionReference = "sub|user-9".parse().unwrap();
        assert_eq!(reference.user_id.as_str(), "user-9");
        assert_eq!(reference.to_string(), "sub|user-9");
    }

    #[test]
    fn subscription_reference_requires_prefix() {
        assert!("U|cm".parse::<SubscriptionReference>().is_err());
        assert!("sub|".parse::<SubscriptionReference>().is_err());
        assert!("U|cm|5".parse::<SubscriptionReference>().is_err());
    }

    proptest! {
        #[test]
        fn arbitrary_strings_never_panic(input in ".*") {
            let _ = input.parse::<PurchaseReference>();
            let _ = input.parse::<SubscriptionReference>();
        }

        #[test]
        fn valid_triples_parse_back(
            user in "[a-z0-9-]{1,36}",
            subject in "[a-z]{1,8}",
            group in 1i32..=10,
        ) {
            let raw = format!("{}|{}|{}", user, subject, group);
            let parsed: PurchaseReference = raw.parse().unwrap();
            prop_assert_eq!(parsed.to_string(), raw);
        }
    }
}
