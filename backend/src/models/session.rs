use chrono::{DateTime, Utc};
use serde::Serialize;

use super::user::UserRole;

/// An authenticated login held by the session manager.
#[derive(Debug, Clone, Serialize)]
pub struct SessionData {
    pub username: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Bearer token of the current request, inserted by the auth middleware.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);
