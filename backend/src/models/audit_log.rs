use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    #[default]
    Success,
    Failure,
    Warning,
    Error,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Success => "success",
            ActivityStatus::Failure => "failure",
            ActivityStatus::Warning => "warning",
            ActivityStatus::Error => "error",
        }
    }
}

/// One entry of the activity trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// `ACT_000001`
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ActivityStatus,
    #[serde(default = "empty_details")]
    pub details: Value,
}

fn empty_details() -> Value {
    Value::Object(Default::default())
}

impl ActivityRecord {
    /// Numeric part of the id; 0 for ids that do not follow the `ACT_` pattern.
    pub fn sequence(&self) -> u64 {
        self.id
            .strip_prefix("ACT_")
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }
}

/// Activity about to be recorded; the id and timestamp are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user: String,
    pub action: &'static str,
    pub entity_type: Option<&'static str>,
    pub entity_id: Option<String>,
    pub description: String,
    pub status: ActivityStatus,
    pub details: Value,
}

impl NewActivity {
    pub fn success(user: impl Into<String>, action: &'static str, description: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            action,
            entity_type: None,
            entity_id: None,
            description: description.into(),
            status: ActivityStatus::Success,
            details: empty_details(),
        }
    }

    pub fn entity(mut self, entity_type: &'static str, entity_id: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type);
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn entity_type(mut self, entity_type: &'static str) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    pub fn status(mut self, status: ActivityStatus) -> Self {
        self.status = status;
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
    pub user: Option<String>,
    pub action: Option<String>,
}
