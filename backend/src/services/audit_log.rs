//! Capped activity trail of state-changing operations.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    db::StoreError,
    models::audit_log::{ActivityQuery, ActivityRecord, NewActivity},
    repositories::Repositories,
};

pub const SYSTEM_ACTOR: &str = "SYSTEM";
pub const DEFAULT_QUERY_LIMIT: usize = 100;

pub mod actions {
    pub const USER_ADDED: &str = "USER_ADDED";
    pub const USER_STATUS_CHANGED: &str = "USER_STATUS_CHANGED";
    pub const PASSWORD_CHANGED: &str = "PASSWORD_CHANGED";
    pub const PASSWORD_RESET: &str = "PASSWORD_RESET";
    pub const PROFILE_UPDATED: &str = "PROFILE_UPDATED";
    pub const ACADEMIC_ADDED: &str = "ACADEMIC_ADDED";
    pub const ACADEMIC_UPDATED: &str = "ACADEMIC_UPDATED";
    pub const ACADEMIC_DELETED: &str = "ACADEMIC_DELETED";
    pub const STUDENT_ADDED: &str = "STUDENT_ADDED";
    pub const STUDENT_UPDATED: &str = "STUDENT_UPDATED";
    pub const STUDENT_DELETED: &str = "STUDENT_DELETED";
    pub const EVENT_ADDED: &str = "EVENT_ADDED";
    pub const EVENT_REGISTERED: &str = "EVENT_REGISTERED";
    pub const TIMETABLE_ADDED: &str = "TIMETABLE_ADDED";
    pub const TIMETABLE_UPDATED: &str = "TIMETABLE_UPDATED";
    pub const TIMETABLE_DELETED: &str = "TIMETABLE_DELETED";
    pub const DATA_CLEARED: &str = "DATA_CLEARED";
    pub const BACKUP_CREATED: &str = "BACKUP_CREATED";
    pub const ERROR_EXCEPTION: &str = "ERROR_EXCEPTION";

    pub const USER_LOGIN: &str = "USER_LOGIN";
    pub const USER_LOGOUT: &str = "USER_LOGOUT";
    pub const LOGIN_ATTEMPT: &str = "LOGIN_ATTEMPT";
    pub const THEME_CHANGED: &str = "THEME_CHANGED";
    pub const SESSION_HEARTBEAT: &str = "SESSION_HEARTBEAT";
}

/// Noise that is never written to the trail.
pub const EXCLUDED_ACTIONS: &[&str] = &[
    actions::USER_LOGIN,
    actions::USER_LOGOUT,
    actions::LOGIN_ATTEMPT,
    actions::THEME_CHANGED,
    actions::SESSION_HEARTBEAT,
];

pub fn is_excluded(action: &str) -> bool {
    EXCLUDED_ACTIONS.contains(&action)
}

/// Appends with the next sequential id, then drops the oldest records beyond `max_entries`.
pub fn append_record(
    records: &mut Vec<ActivityRecord>,
    activity: NewActivity,
    now: DateTime<Utc>,
    max_entries: usize,
) -> ActivityRecord {
    let next = records.iter().map(ActivityRecord::sequence).max().unwrap_or(0) + 1;
    let record = ActivityRecord {
        id: format!("ACT_{:06}", next),
        timestamp: now,
        user: activity.user,
        action: activity.action.to_string(),
        entity_type: activity.entity_type.map(str::to_string),
        entity_id: activity.entity_id,
        description: activity.description,
        status: activity.status,
        details: activity.details,
    };
    records.push(record.clone());
    if records.len() > max_entries {
        let overflow = records.len() - max_entries;
        records.drain(..overflow);
    }
    record
}

/// Most recent first, filtered by exact user and action.
pub fn select_recent(records: &[ActivityRecord], query: &ActivityQuery) -> Vec<ActivityRecord> {
    let mut selected: Vec<ActivityRecord> = records
        .iter()
        .filter(|r| !is_excluded(&r.action))
        .filter(|r| query.user.as_deref().map_or(true, |user| r.user == user))
        .filter(|r| query.action.as_deref().map_or(true, |action| r.action == action))
        .cloned()
        .collect();
    selected.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.sequence().cmp(&a.sequence()))
    });
    selected.truncate(query.limit.unwrap_or(DEFAULT_QUERY_LIMIT));
    selected
}

pub struct AuditLogService {
    repos: Arc<Repositories>,
    max_entries: usize,
}

impl AuditLogService {
    pub fn new(repos: Arc<Repositories>, max_entries: usize) -> Self {
        Self { repos, max_entries }
    }

    /// Records an activity. Failures are logged and swallowed so that a completed
    /// operation is never reported as failed because of its audit entry.
    pub async fn record(&self, activity: NewActivity) -> Option<ActivityRecord> {
        if is_excluded(activity.action) {
            return None;
        }
        let action = activity.action;
        match self.try_record(activity).await {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(action, error = %err, "Failed to record activity");
                None
            }
        }
    }

    async fn try_record(&self, activity: NewActivity) -> Result<ActivityRecord, StoreError> {
        let guard = self.repos.activities.lock().await;
        let mut records = guard.load().await?;
        let record = append_record(&mut records, activity, Utc::now(), self.max_entries);
        guard.save(&records).await?;
        tracing::info!(
            id = %record.id,
            user = %record.user,
            action = %record.action,
            status = record.status.as_str(),
            "Activity recorded"
        );
        Ok(record)
    }

    pub async fn query(&self, query: &ActivityQuery) -> Result<Vec<ActivityRecord>, StoreError> {
        let records = self.repos.activities.read().await?;
        Ok(select_recent(&records, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::MemoryDocumentStore, models::audit_log::ActivityStatus};
    use chrono::Duration;

    fn activity(user: &str, action: &'static str) -> NewActivity {
        NewActivity::success(user, action, "test")
    }

    #[test]
    fn ids_are_sequential_and_zero_padded() {
        let mut records = Vec::new();
        let now = Utc::now();
        let first = append_record(&mut records, activity("ADMIN", actions::USER_ADDED), now, 10);
        let second = append_record(&mut records, activity("ADMIN", actions::USER_ADDED), now, 10);
        assert_eq!(first.id, "ACT_000001");
        assert_eq!(second.id, "ACT_000002");
    }

    #[test]
    fn cap_drops_oldest_and_ids_stay_unique() {
        let mut records = Vec::new();
        let now = Utc::now();
        for _ in 0..5 {
            append_record(&mut records, activity("ADMIN", actions::EVENT_ADDED), now, 3);
        }
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ACT_000003", "ACT_000004", "ACT_000005"]);
    }

    #[test]
    fn query_filters_and_orders_newest_first() {
        let mut records = Vec::new();
        let start = Utc::now();
        append_record(&mut records, activity("ADMIN", actions::USER_ADDED), start, 100);
        append_record(
            &mut records,
            activity("jane", actions::EVENT_REGISTERED),
            start + Duration::seconds(1),
            100,
        );
        append_record(
            &mut records,
            activity("ADMIN", actions::EVENT_ADDED),
            start + Duration::seconds(2),
            100,
        );

        let all = select_recent(&records, &ActivityQuery::default());
        assert_eq!(all[0].action, actions::EVENT_ADDED);
        assert_eq!(all.len(), 3);

        let admin_only = select_recent(
            &records,
            &ActivityQuery {
                user: Some("ADMIN".into()),
                limit: Some(1),
                ..Default::default()
            },
        );
        assert_eq!(admin_only.len(), 1);
        assert_eq!(admin_only[0].action, actions::EVENT_ADDED);

        let by_action = select_recent(
            &records,
            &ActivityQuery {
                action: Some(actions::USER_ADDED.into()),
                ..Default::default()
            },
        );
        assert_eq!(by_action.len(), 1);
    }

    #[tokio::test]
    async fn excluded_actions_are_never_written() {
        let repos = Arc::new(Repositories::new(Arc::new(MemoryDocumentStore::new())));
        let audit = AuditLogService::new(repos.clone(), 10);
        assert!(audit.record(activity("jane", actions::USER_LOGIN)).await.is_none());
        assert!(audit.record(activity("jane", actions::THEME_CHANGED)).await.is_none());
        let recorded = audit
            .record(activity("jane", actions::PASSWORD_CHANGED).status(ActivityStatus::Success))
            .await
            .unwrap();
        assert_eq!(recorded.id, "ACT_000001");
        assert_eq!(repos.activities.read().await.unwrap().len(), 1);
    }
}
