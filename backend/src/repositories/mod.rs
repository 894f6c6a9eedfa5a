//! Per-collection repositories.
//!
//! Operations spanning several collections take their guards in the order of the fields
//! below (users first, activities last).

use std::sync::Arc;

use crate::{
    db::DocumentStore,
    models::{
        academic::AcademicDirectory, audit_log::ActivityRecord, event::EventDirectory,
        student::StudentDirectory, timetable::Timetable, user::UserDirectory,
    },
};

pub mod documents;
pub mod repository;

pub use repository::{Document, Repository, RepositoryGuard};

pub struct Repositories {
    pub users: Repository<UserDirectory>,
    pub academics: Repository<AcademicDirectory>,
    pub students: Repository<StudentDirectory>,
    pub events: Repository<EventDirectory>,
    pub timetable: Repository<Timetable>,
    pub activities: Repository<Vec<ActivityRecord>>,
}

impl Repositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: Repository::new(store.clone()),
            academics: Repository::new(store.clone()),
            students: Repository::new(store.clone()),
            events: Repository::new(store.clone()),
            timetable: Repository::new(store.clone()),
            activities: Repository::new(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{Collection, MemoryDocumentStore, MockDocumentStore, StoreError},
        models::timetable::Weekday,
    };
    use serde_json::{json, Value};

    #[tokio::test]
    async fn missing_collections_load_as_defaults() {
        let repos = Repositories::new(Arc::new(MemoryDocumentStore::new()));
        assert!(repos.users.read().await.unwrap().is_empty());
        let timetable = repos.timetable.read().await.unwrap();
        assert_eq!(timetable.0.len(), Weekday::ALL.len());
    }

    #[tokio::test]
    async fn corrupt_collection_decodes_to_default() {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .save(Collection::Activities.key(), &json!({"not": "a list"}))
            .await
            .unwrap();
        let repos = Repositories::new(store);
        assert!(repos.activities.read().await.unwrap().is_empty());
    }

    fn stored_class(id: &str, day: &str) -> Value {
        json!({
            "id": id,
            "day": day,
            "section": "A",
            "start_time": "09:00",
            "start_time_12": "9:00 AM",
            "end_time": "10:00",
            "end_time_12": "10:00 AM",
            "class_name": "Algebra",
            "faculty_name": "R. Rao",
            "subject": "Maths",
            "created_at": "2026-01-05T08:00:00Z",
            "created_by": "ADMIN",
        })
    }

    #[tokio::test]
    async fn timetable_keeps_readable_entries_when_some_are_broken() {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .save(
                Collection::Timetable.key(),
                &json!({
                    "Monday": [stored_class("TT_1", "Monday"), {"id": "TT_broken"}],
                    "Tuesday": [stored_class("TT_2", "Tuesday")],
                    "Sunday": [stored_class("TT_3", "Monday")],
                }),
            )
            .await
            .unwrap();
        let repos = Repositories::new(store);

        let timetable = repos.timetable.read().await.unwrap();
        let ids: Vec<&str> = timetable.entries().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["TT_1", "TT_2"]);
        assert_eq!(timetable.0.len(), Weekday::ALL.len());
    }

    #[tokio::test]
    async fn activity_trail_drops_only_malformed_records() {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .save(
                Collection::Activities.key(),
                &json!([
                    {"id": "ACT_000001", "timestamp": "2026-01-05T08:00:00Z", "user": "ADMIN", "action": "EVENT_ADDED"},
                    {"id": "ACT_000002", "timestamp": "yesterday"},
                ]),
            )
            .await
            .unwrap();
        let repos = Repositories::new(store);

        let records = repos.activities.read().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "ACT_000001");
    }

    #[tokio::test]
    async fn guard_saves_under_collection_key() {
        let store = Arc::new(MemoryDocumentStore::new());
        let repos = Repositories::new(store.clone());
        {
            let guard = repos.timetable.lock().await;
            let timetable = guard.load().await.unwrap();
            guard.save(&timetable).await.unwrap();
        }
        let saved = store.load("timetable").await.unwrap();
        assert_eq!(saved["Monday"], json!([]));
    }

    #[tokio::test]
    async fn save_failures_surface_as_store_errors() {
        let mut store = MockDocumentStore::new();
        store.expect_load().returning(|_| Ok(Value::Null));
        store.expect_save().returning(|_, _| {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        });
        let repos = Repositories::new(Arc::new(store));
        let guard = repos.users.lock().await;
        let users = guard.load().await.unwrap();
        assert!(matches!(guard.save(&users).await, Err(StoreError::Io(_))));
    }
}
