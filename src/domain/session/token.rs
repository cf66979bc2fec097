use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{Timestamp, UserId};

pub const MAX_DEVICE_INFO: usize = 200;

/// One admitted login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub user_id: UserId,
    pub token: String,
    pub device_info: Option<String>,
    pub created_at: Timestamp,
    pub last_seen_at: Timestamp,
}

impl SessionToken {
    /// Issues a fresh random (v4) token. Device info is capped at
    /// `MAX_DEVICE_INFO` characters.
    pub fn issue(user_id: UserId, device_info: Option<String>, now: Timestamp) -> Self {
        Self {
            user_id,
            token: Uuid::new_v4().to_string(),
            device_info: device_info.map(|d| d.chars().take(MAX_DEVICE_INFO).collect()),
            created_at: now,
            last_seen_at: now,
        }
    }

    pub fn is_stale(&self, cutoff: &Timestamp) -> bool {
        self.last_seen_at.is_before(cutoff)
    }
}
