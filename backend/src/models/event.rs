use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::RecordStatus;

pub const MAX_EVENT_CAPACITY: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub student_name: String,
    pub section: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("Already registered for this event")]
    AlreadyRegistered,
    #[error("Event is full")]
    EventFull,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    /// `HH:MM`
    pub time: String,
    pub time_12: String,
    pub organizer_name: String,
    pub club_name: String,
    #[serde(default)]
    pub chief_guest: String,
    #[serde(default)]
    pub description: String,
    pub capacity: u32,
    #[serde(default)]
    pub registered_count: usize,
    #[serde(default)]
    pub registrations: Vec<Registration>,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
}

impl Event {
    pub fn is_registered(&self, username: &str) -> bool {
        self.registrations.iter().any(|r| r.username == username)
    }

    /// Appends a registration, keeping usernames unique and the count within capacity.
    pub fn register(&mut self, registration: Registration) -> Result<(), RegistrationError> {
        if self.is_registered(&registration.username) {
            return Err(RegistrationError::AlreadyRegistered);
        }
        if self.registrations.len() >= self.capacity as usize {
            return Err(RegistrationError::EventFull);
        }
        self.updated_at = registration.registered_at;
        self.registrations.push(registration);
        self.registered_count = self.registrations.len();
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventDirectory(pub BTreeMap<String, Event>);

#[derive(Debug, Default, Deserialize)]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub organizer_name: Option<String>,
    pub club_name: Option<String>,
    #[serde(default, deserialize_with = "crate::validation::string_or_number")]
    pub capacity: Option<String>,
    pub chief_guest: Option<String>,
    pub description: Option<String>,
    pub venue: Option<String>,
}

/// Row of `GET /api/events/list`.
#[derive(Debug, Serialize)]
pub struct EventSummary {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub time: String,
    pub time_12: String,
    pub organizer_name: String,
    pub club_name: String,
    pub chief_guest: String,
    pub description: String,
    pub capacity: u32,
    pub registered_count: usize,
    pub venue: String,
    pub status: RecordStatus,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            date: event.date,
            time: event.time.clone(),
            time_12: event.time_12.clone(),
            organizer_name: event.organizer_name.clone(),
            club_name: event.club_name.clone(),
            chief_guest: event.chief_guest.clone(),
            description: event.description.clone(),
            capacity: event.capacity,
            registered_count: event.registered_count,
            venue: event.venue.clone(),
            status: event.status,
        }
    }
}
