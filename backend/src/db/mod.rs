//! Document storage.
//!
//! Every collection is persisted as one JSON document addressed by a key. Backends only
//! guarantee that a single `load` or `save` call is atomic; read-modify-write sequences are
//! serialised one level up, in [`crate::repositories`].

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

pub mod connection;
pub mod file;
pub mod memory;

pub use connection::PgDocumentStore;
pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Named collections owned by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Academics,
    Students,
    Events,
    Timetable,
    Activities,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Users,
        Collection::Academics,
        Collection::Students,
        Collection::Events,
        Collection::Timetable,
        Collection::Activities,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Academics => "academics",
            Collection::Students => "students",
            Collection::Events => "events",
            Collection::Timetable => "timetable",
            Collection::Activities => "activities",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Key-value store of whole JSON documents.
///
/// `load` yields `Value::Null` for a missing or unreadable document so callers can fall
/// back to an empty collection; only infrastructure failures surface as errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Value, StoreError>;

    async fn save(&self, key: &str, document: &Value) -> Result<(), StoreError>;
}
