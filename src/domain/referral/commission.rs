//! Tiered affiliate commissions.
//!
//! The tier depends on how many distinct users the affiliate has referred
//! into a paid purchase, counting the referral being settled when it is new.
//!
//! | distinct referred users | percent |
//! |---|---|
//! | 1..=5 | 10 |
//! | 6..=20 | 20 |
//! | 21..=40 | 30 |
//! | 41.. | 40 |

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, SubjectId, Timestamp, UserId};

/// Percent paid for the referral that brings the total to `distinct_referred`.
pub fn commission_percent(distinct_referred: usize) -> u8 {
    match distinct_referred {
        0..=5 => 10,
        6..=20 => 20,
        21..=40 => 30,
        _ => 40,
    }
}

/// Distinct referred users including `referred` if it was not counted yet.
pub fn distinct_total(previously_referred: &[UserId], referred: &UserId) -> usize {
    let mut unique: Vec<&UserId> = previously_referred.iter().collect();
    unique.sort();
    unique.dedup();
    let is_new = !unique.contains(&referred);
    unique.len() + usize::from(is_new)
}

/// One commission per (affiliate, referred user, subject). Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralCommission {
    pub affiliate_user_id: UserId,
    pub referred_user_id: UserId,
    pub subject_id: SubjectId,
    pub sale_amount: Money,
    pub commission_percent: u8,
    pub commission_amount: Money,
    pub created_at: Timestamp,
}

impl ReferralCommission {
    /// Computes the commission for a sale at the tier given by `distinct_referred`.
    pub fn compute(
        affiliate_user_id: UserId,
        referred_user_id: UserId,
        subject_id: SubjectId,
        sale_amount: Money,
        distinct_referred: usize,
        now: Timestamp,
    ) -> Self {
        let percent = commission_percent(distinct_referred);
        Self {
            affiliate_user_id,
            referred_user_id,
            subject_id,
            sale_amount,
            commission_percent: percent,
            commission_amount: sale_amount.percent(percent),
            created_at: now,
        }
    }
}
