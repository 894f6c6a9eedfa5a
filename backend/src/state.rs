use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::{
    config::Config,
    db::DocumentStore,
    repositories::Repositories,
    services::{AuditLogService, SessionManager},
    utils::now_in_timezone,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub repos: Arc<Repositories>,
    pub sessions: Arc<SessionManager>,
    pub audit: Arc<AuditLogService>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        let repos = Arc::new(Repositories::new(store.clone()));
        let sessions = Arc::new(SessionManager::new(Duration::minutes(
            config.session_timeout_minutes,
        )));
        let audit = Arc::new(AuditLogService::new(repos.clone(), config.max_activity_logs));
        Self {
            config,
            store,
            repos,
            sessions,
            audit,
        }
    }

    /// Wall clock in the institution's timezone.
    pub fn now_local(&self) -> DateTime<Tz> {
        now_in_timezone(&self.config.time_zone)
    }
}
