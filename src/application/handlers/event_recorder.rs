//! Best-effort audit recording shared by the handlers.
//!
//! Appends each event to the event log and, for alert kinds, emails the
//! operator. Both are side effects of an already committed transition, so
//! failures are logged and never returned.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::settlement::{AccessEvent, EventRecord};
use crate::ports::{EmailMessage, EmailSender, EventLog};

const ALERT_SUBJECT_PREFIX: &str = "[Rotation Access]";

pub struct EventRecorder {
    event_log: Arc<dyn EventLog>,
    email_sender: Arc<dyn EmailSender>,
    admin_alert_email: Option<String>,
}

impl EventRecorder {
    pub fn new(
        event_log: Arc<dyn EventLog>,
        email_sender: Arc<dyn EmailSender>,
        admin_alert_email: Option<String>,
    ) -> Self {
        Self {
            event_log,
            email_sender,
            admin_alert_email: admin_alert_email.filter(|e| !e.trim().is_empty()),
        }
    }

    pub async fn record(&self, user_id: Option<&UserId>, event: AccessEvent, now: Timestamp) {
        let kind = event.kind();
        let record = EventRecord::new(user_id.cloned(), event, now);

        if let Err(err) = self.event_log.append(&record).await {
            tracing::error!(event = kind, error = %err, "Failed to append audit event");
        }

        if record.event.is_alert() {
            self.send_alert(&record).await;
        }
    }

    async fn send_alert(&self, record: &EventRecord) {
        let Some(to) = &self.admin_alert_email else {
            return;
        };

        let rendered = record.event.render();
        let mut html = format!("<h2>{}</h2><ul>", rendered.title);
        if let Some(user_id) = &record.user_id {
            html.push_str(&format!("<li><strong>User:</strong> {}</li>", user_id));
        }
        for line in &rendered.lines {
            html.push_str(&format!("<li>{}</li>", line));
        }
        html.push_str(&format!(
            "</ul><p>{}</p>",
            record.occurred_at.to_rfc3339()
        ));

        let message = EmailMessage {
            to: to.clone(),
            subject: format!("{} {}", ALERT_SUBJECT_PREFIX, record.event.kind()),
            html,
        };
        if let Err(err) = self.email_sender.send(&message).await {
            tracing::warn!(event = record.event.kind(), error = %err, "Failed to send admin alert");
        }
    }
}
