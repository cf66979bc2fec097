//! Inbound notification routing.
//!
//! The gateway sends either query parameters (`topic`/`type`, `data.id`/`id`)
//! or a JSON body `{ "type": .., "data": { "id": .. } }`. Query parameters win
//! when both are present. The payload carries nothing else we trust.

use std::collections::HashMap;

use serde_json::Value;

/// Kind of gateway object the notification refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTopic {
    /// One-time payment (`payment`).
    Payment,
    /// Preapproval status change (`preapproval`, `subscription_preapproval`).
    Preapproval,
    /// Recurring charge of a preapproval (`subscription_authorized_payment`).
    AuthorizedPayment,
    /// Anything else. Acknowledged and dropped.
    Other(String),
}

impl NotificationTopic {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "payment" => NotificationTopic::Payment,
            "preapproval" | "subscription_preapproval" => NotificationTopic::Preapproval,
            "subscription_authorized_payment" => NotificationTopic::AuthorizedPayment,
            other => NotificationTopic::Other(other.to_string()),
        }
    }
}

/// Topic and object id extracted from a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub topic: NotificationTopic,
    pub data_id: String,
}

impl Notification {
    /// Extracts topic and id. `None` means there is nothing to process.
    pub fn extract(query: &HashMap<String, String>, body: &[u8]) -> Option<Self> {
        let body: Option<Value> = if body.is_empty() {
            None
        } else {
            serde_json::from_slice(body).ok()
        };

        let topic = non_empty(query.get("topic"))
            .or_else(|| non_empty(query.get("type")))
            .or_else(|| body.as_ref().and_then(|b| json_string(b.get("type"))))
            .or_else(|| body.as_ref().and_then(|b| json_string(b.get("topic"))))?;

        let data_id = non_empty(query.get("data.id"))
            .or_else(|| non_empty(query.get("id")))
            .or_else(|| {
                body.as_ref()
                    .and_then(|b| json_string(b.get("data").and_then(|d| d.get("id"))))
            })
            .or_else(|| body.as_ref().and_then(|b| json_string(b.get("id"))))?;

        Some(Self {
            topic: NotificationTopic::parse(&topic),
            data_id,
        })
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

/// Ids may arrive as JSON strings or numbers.
fn json_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
