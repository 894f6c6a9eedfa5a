//! In-memory registry of bearer sessions.
//!
//! Sessions are not persisted; a restart logs everyone out. Expiry is detected lazily when a
//! token is validated, there is no background sweeper.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::{
    models::{session::SessionData, user::UserRole},
    utils::generate_session_token,
};

pub struct SessionManager {
    sessions: RwLock<HashMap<String, SessionData>>,
    timeout: Duration,
}

impl SessionManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn create(&self, username: &str, role: UserRole) -> String {
        self.create_at(username, role, Utc::now())
    }

    pub fn create_at(&self, username: &str, role: UserRole, now: DateTime<Utc>) -> String {
        let token = generate_session_token();
        let session = SessionData {
            username: username.to_string(),
            role,
            created_at: now,
            last_activity: now,
            expires_at: now + self.timeout,
        };
        self.sessions.write().insert(token.clone(), session);
        tracing::debug!(username, role = %role, "Session created");
        token
    }

    pub fn validate(&self, token: &str) -> Option<SessionData> {
        self.validate_at(token, Utc::now())
    }

    /// Returns the session and refreshes `last_activity`; an expired session is evicted.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Option<SessionData> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(token)?;
        if session.is_expired_at(now) {
            let username = session.username.clone();
            sessions.remove(token);
            tracing::debug!(username = %username, "Session expired");
            return None;
        }
        session.last_activity = now;
        Some(session.clone())
    }

    pub fn destroy(&self, token: &str) {
        if let Some(session) = self.sessions.write().remove(token) {
            tracing::debug!(username = %session.username, "Session destroyed");
        }
    }

    pub fn active_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn clear(&self) {
        self.sessions.write().clear();
    }
}
