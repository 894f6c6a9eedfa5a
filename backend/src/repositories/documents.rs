use serde_json::Value;

use crate::{
    db::Collection,
    models::{
        academic::AcademicDirectory,
        audit_log::ActivityRecord,
        event::EventDirectory,
        student::StudentDirectory,
        timetable::{Timetable, TimetableEntry, Weekday},
        user::UserDirectory,
    },
};

use super::repository::{salvage_array, salvage_object, Document};

impl Document for UserDirectory {
    const COLLECTION: Collection = Collection::Users;

    fn salvage(raw: &Value) -> Option<Self> {
        salvage_object(Self::COLLECTION, raw).map(|records| Self(records.into_iter().collect()))
    }
}

impl Document for AcademicDirectory {
    const COLLECTION: Collection = Collection::Academics;

    fn salvage(raw: &Value) -> Option<Self> {
        salvage_object(Self::COLLECTION, raw).map(|records| Self(records.into_iter().collect()))
    }
}

impl Document for StudentDirectory {
    const COLLECTION: Collection = Collection::Students;

    fn salvage(raw: &Value) -> Option<Self> {
        salvage_object(Self::COLLECTION, raw).map(|records| Self(records.into_iter().collect()))
    }
}

impl Document for EventDirectory {
    const COLLECTION: Collection = Collection::Events;

    fn salvage(raw: &Value) -> Option<Self> {
        salvage_object(Self::COLLECTION, raw).map(|records| Self(records.into_iter().collect()))
    }
}

impl Document for Timetable {
    const COLLECTION: Collection = Collection::Timetable;

    fn normalize(&mut self) {
        self.ensure_all_days();
    }

    /// Unknown day keys and malformed entries are dropped; everything else is kept.
    fn salvage(raw: &Value) -> Option<Self> {
        let buckets = salvage_object::<Value>(Self::COLLECTION, raw)?;
        let mut timetable = Timetable::default();
        for (key, entries) in buckets {
            let Ok(day) = key.parse::<Weekday>() else {
                tracing::warn!(
                    collection = %Self::COLLECTION,
                    day = %key,
                    "Dropped unknown day bucket"
                );
                continue;
            };
            let entries: Vec<TimetableEntry> =
                salvage_array(Self::COLLECTION, &entries).unwrap_or_default();
            timetable.day_mut(day).extend(entries);
        }
        Some(timetable)
    }
}

impl Document for Vec<ActivityRecord> {
    const COLLECTION: Collection = Collection::Activities;

    fn salvage(raw: &Value) -> Option<Self> {
        salvage_array(Self::COLLECTION, raw)
    }
}
