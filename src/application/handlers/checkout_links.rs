//! URLs handed to the gateway when creating hosted checkouts.

use reqwest::Url;

use crate::ports::BackUrls;

use super::HandlerError;

/// Where the gateway redirects the payer and where it posts notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLinks {
    /// Frontend origin the payer returns to.
    pub app_url: String,
    /// Absolute URL of the notification endpoint.
    pub notification_url: String,
}

impl CheckoutLinks {
    pub fn new(app_url: impl Into<String>, notification_url: impl Into<String>) -> Self {
        Self {
            app_url: app_url.into(),
            notification_url: notification_url.into(),
        }
    }

    /// Return URLs for a one-time checkout carrying `external_reference`.
    pub fn back_urls(&self, external_reference: &str) -> Result<BackUrls, HandlerError> {
        Ok(BackUrls {
            success: self.app_with(&[
                ("status", "approved"),
                ("external_reference", external_reference),
            ])?,
            failure: self.app_with(&[("status", "failure")])?,
            pending: self.app_with(&[
                ("status", "pending"),
                ("external_reference", external_reference),
            ])?,
        })
    }

    /// Return URL after authorizing a subscription.
    pub fn subscription_back_url(&self) -> Result<String, HandlerError> {
        self.app_with(&[("subscription", "pending")])
    }

    fn app_with(&self, params: &[(&str, &str)]) -> Result<String, HandlerError> {
        Url::parse_with_params(&self.app_url, params)
            .map(String::from)
            .map_err(|e| HandlerError::validation("app_url", e.to_string()))
    }
}
