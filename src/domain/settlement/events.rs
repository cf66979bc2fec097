//! Audit events.
//!
//! Each event kind has its own fields. The serialized form is
//! `{"type": "<kind>", ...fields}` and is what the event log stores as
//! metadata. Every variant has a renderer, used for alert emails and logs.

use serde::{Deserialize, Serialize};

use crate::domain::access::AccessStatus;
use crate::domain::foundation::{GroupNumber, Money, SubjectId, Timestamp, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessEvent {
    TrialActivated {
        subject_id: SubjectId,
        group: GroupNumber,
        expires_at: Timestamp,
    },
    CheckoutCreated {
        subject_id: SubjectId,
        group: GroupNumber,
        payment_method: String,
        price: Money,
        preference_id: String,
    },
    PendingCancelled {
        subject_id: SubjectId,
        reverted_to_trial: bool,
    },
    PaymentSuccess {
        subject_id: SubjectId,
        group: GroupNumber,
        payment_id: String,
        amount: Money,
    },
    PaymentFailed {
        subject_id: SubjectId,
        group: GroupNumber,
        payment_id: String,
        gateway_status: String,
        status_detail: Option<String>,
    },
    PaymentSuspicious {
        subject_id: SubjectId,
        payment_id: String,
        amount: Option<Money>,
        floor: Money,
    },
    AffiliateCommission {
        affiliate_user_id: UserId,
        referred_user_id: UserId,
        subject_id: SubjectId,
        sale_amount: Money,
        commission_percent: u8,
        commission_amount: Money,
    },
    SubscriptionCreated {
        preapproval_id: String,
        amount: Money,
    },
    SubscriptionAuthorized {
        preapproval_id: String,
        current_period_end: Option<Timestamp>,
    },
    SubscriptionPaused {
        preapproval_id: String,
    },
    SubscriptionCancelled {
        preapproval_id: String,
    },
    SubscriptionPayment {
        preapproval_id: String,
        payment_id: String,
        current_period_end: Timestamp,
    },
    AccessOverridden {
        subject_id: SubjectId,
        status: AccessStatus,
        group: GroupNumber,
        admin_id: UserId,
    },
    VipChanged {
        is_vip: bool,
        admin_id: UserId,
    },
}

/// Human-readable rendering of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEvent {
    pub title: String,
    pub lines: Vec<String>,
}

impl AccessEvent {
    /// Stable snake_case name, identical to the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            AccessEvent::TrialActivated { .. } => "trial_activated",
            AccessEvent::CheckoutCreated { .. } => "checkout_created",
            AccessEvent::PendingCancelled { .. } => "pending_cancelled",
            AccessEvent::PaymentSuccess { .. } => "payment_success",
            AccessEvent::PaymentFailed { .. } => "payment_failed",
            AccessEvent::PaymentSuspicious { .. } => "payment_suspicious",
            AccessEvent::AffiliateCommission { .. } => "affiliate_commission",
            AccessEvent::SubscriptionCreated { .. } => "subscription_created",
            AccessEvent::SubscriptionAuthorized { .. } => "subscription_authorized",
            AccessEvent::SubscriptionPaused { .. } => "subscription_paused",
            AccessEvent::SubscriptionCancelled { .. } => "subscription_cancelled",
            AccessEvent::SubscriptionPayment { .. } => "subscription_payment",
            AccessEvent::AccessOverridden { .. } => "access_overridden",
            AccessEvent::VipChanged { .. } => "vip_changed",
        }
    }

    /// Events an operator should hear about by email.
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            AccessEvent::PaymentFailed { .. } | AccessEvent::PaymentSuspicious { .. }
        )
    }

    /// JSON metadata as stored by the event log.
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn render(&self) -> RenderedEvent {
        let (title, lines) = match self {
            AccessEvent::TrialActivated {
                subject_id,
                group,
                expires_at,
            } => (
                format!("Trial activated - {}", subject_id),
                vec![
                    format!("Group: {}", group),
                    format!("Expires at: {}", expires_at.to_rfc3339()),
                ],
            ),
            AccessEvent::CheckoutCreated {
                subject_id,
                group,
                payment_method,
                price,
                preference_id,
            } => (
                format!("Checkout created - {}", subject_id),
                vec![
                    format!("Group: {}", group),
                    format!("Method: {}", payment_method),
                    format!("Price: R$ {}", price),
                    format!("Preference: {}", preference_id),
                ],
            ),
            AccessEvent::PendingCancelled {
                subject_id,
                reverted_to_trial,
            } => (
                format!("Checkout cancelled - {}", subject_id),
                vec![format!("Reverted to trial: {}", reverted_to_trial)],
            ),
            AccessEvent::PaymentSuccess {
                subject_id,
                group,
                payment_id,
                amount,
            } => (
                format!("Payment approved - {}", subject_id),
                vec![
                    format!("Group: {}", group),
                    format!("Payment: {}", payment_id),
                    format!("Amount: R$ {}", amount),
                ],
            ),
            AccessEvent::PaymentFailed {
                subject_id,
                group,
                payment_id,
                gateway_status,
                status_detail,
            } => (
                format!("Payment failure - {}", subject_id),
                vec![
                    format!("Group: {}", group),
                    format!("Payment: {}", payment_id),
                    format!("Status: {}", gateway_status),
                    format!("Detail: {}", status_detail.as_deref().unwrap_or("-")),
                ],
            ),
            AccessEvent::PaymentSuspicious {
                subject_id,
                payment_id,
                amount,
                floor,
            } => (
                format!("Suspicious payment - {}", subject_id),
                vec![
                    format!("Payment: {}", payment_id),
                    format!(
                        "Amount: {}",
                        amount.map_or_else(|| "missing".to_string(), |a| format!("R$ {}", a))
                    ),
                    format!("Floor: R$ {}", floor),
                ],
            ),
            AccessEvent::AffiliateCommission {
                affiliate_user_id,
                referred_user_id,
                subject_id,
                sale_amount,
                commission_percent,
                commission_amount,
            } => (
                format!("Affiliate commission - {}", subject_id),
                vec![
                    format!("Affiliate: {}", affiliate_user_id),
                    format!("Referred: {}", referred_user_id),
                    format!("Sale: R$ {}", sale_amount),
                    format!("Commission: {}% = R$ {}", commission_percent, commission_amount),
                ],
            ),
            AccessEvent::SubscriptionCreated {
                preapproval_id,
                amount,
            } => (
                "Subscription created".to_string(),
                vec![
                    format!("Preapproval: {}", preapproval_id),
                    format!("Amount: R$ {}", amount),
                ],
            ),
            AccessEvent::SubscriptionAuthorized {
                preapproval_id,
                current_period_end,
            } => (
                "Subscription authorized".to_string(),
                vec![
                    format!("Preapproval: {}", preapproval_id),
                    format!(
                        "Period end: {}",
                        current_period_end.map_or_else(|| "-".to_string(), |t| t.to_rfc3339())
                    ),
                ],
            ),
            AccessEvent::SubscriptionPaused { preapproval_id } => (
                "Subscription paused".to_string(),
                vec![format!("Preapproval: {}", preapproval_id)],
            ),
            AccessEvent::SubscriptionCancelled { preapproval_id } => (
                "Subscription cancelled".to_string(),
                vec![format!("Preapproval: {}", preapproval_id)],
            ),
            AccessEvent::SubscriptionPayment {
                preapproval_id,
                payment_id,
                current_period_end,
            } => (
                "Subscription payment".to_string(),
                vec![
                    format!("Preapproval: {}", preapproval_id),
                    format!("Payment: {}", payment_id),
                    format!("Period end: {}", current_period_end.to_rfc3339()),
                ],
            ),
            AccessEvent::AccessOverridden {
                subject_id,
                status,
                group,
                admin_id,
            } => (
                format!("Access overridden - {}", subject_id),
                vec![
                    format!("Status: {}", status),
                    format!("Group: {}", group),
                    format!("Admin: {}", admin_id),
                ],
            ),
            AccessEvent::VipChanged { is_vip, admin_id } => (
                "VIP flag changed".to_string(),
                vec![format!("VIP: {}", is_vip), format!("Admin: {}", admin_id)],
            ),
        };
        RenderedEvent { title, lines }
    }
}

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub user_id: Option<UserId>,
    pub event: AccessEvent,
    pub occurred_at: Timestamp,
}

impl EventRecord {
    pub fn new(user_id: Option<UserId>, event: AccessEvent, occurred_at: Timestamp) -> Self {
        Self {
            user_id,
            event,
            occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> SubjectId {
        SubjectId::new("cm").unwrap()
    }

    fn group() -> GroupNumber {
        GroupNumber::new(5).unwrap()
    }

    #[test]
    fn kind_matches_serialized_tag() {
        let events = vec![
            AccessEvent::PaymentSuccess {
                subject_id: subject(),
                group: group(),
                payment_id: "1".into(),
                amount: Money::from_cents(1690).unwrap(),
            },
            AccessEvent::SubscriptionPaused {
                preapproval_id: "pre".into(),
            },
            AccessEvent::VipChanged {
                is_vip: true,
                admin_id: UserId::new("admin").unwrap(),
            },
        ];
        for event in events {
            assert_eq!(event.metadata()["type"], event.kind());
        }
    }

    #[test]
    fn metadata_carries_variant_fields() {
        let event = AccessEvent::PaymentFailed {
            subject_id: subject(),
            group: group(),
            payment_id: "99".into(),
            gateway_status: "rejected".into(),
            status_detail: Some("cc_rejected_insufficient_amount".into()),
        };
        let meta = event.metadata();
        assert_eq!(meta["subject_id"], "cm");
        assert_eq!(meta["gateway_status"], "rejected");
        assert_eq!(meta["group"], 5);
    }

    #[test]
    fn failures_and_suspicious_amounts_are_alerts() {
        let suspicious = AccessEvent::PaymentSuspicious {
            subject_id: subject(),
            payment_id: "1".into(),
            amount: None,
            floor: Money::from_cents(1600).unwrap(),
        };
        assert!(suspicious.is_alert());
        assert!(!AccessEvent::SubscriptionCancelled {
            preapproval_id: "p".into()
        }
        .is_alert());
    }

    #[test]
    fn render_includes_amounts() {
        let event = AccessEvent::AffiliateCommission {
            affiliate_user_id: UserId::new("A").unwrap(),
            referred_user_id: UserId::new("U").unwrap(),
            subject_id: SubjectId::new("go").unwrap(),
            sale_amount: Money::from_cents(1990).unwrap(),
            commission_percent: 10,
            commission_amount: Money::from_cents(199).unwrap(),
        };
        let rendered = event.render();
        assert_eq!(rendered.title, "Affiliate commission - go");
        assert!(rendered.lines.contains(&"Commission: 10% = R$ 1.99".to_string()));
    }

    #[test]
    fn suspicious_without_amount_renders_missing() {
        let event = AccessEvent::PaymentSuspicious {
            subject_id: subject(),
            payment_id: "1".into(),
            amount: None,
            floor: Money::from_cents(1600).unwrap(),
        };
        assert!(event.render().lines.contains(&"Amount: missing".to_string()));
    }
}
