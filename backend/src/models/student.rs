use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{user::Profile, RecordStatus};

/// Student record; `login_id` is the username of the linked `Student` account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Student {
    pub id: String,
    pub student_name: String,
    pub login_id: String,
    pub section: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub gender: String,
    pub father_name: String,
    pub mother_name: String,
    pub email: String,
    pub phone: String,
    pub status: RecordStatus,
    pub registration_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentDirectory(pub BTreeMap<String, Student>);

impl StudentDirectory {
    pub fn find_by_login(&self, username: &str) -> Option<&Student> {
        self.0.values().find(|s| s.login_id == username)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateStudentRequest {
    pub student_name: Option<String>,
    pub section: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStudentRequest {
    pub student_name: Option<String>,
    pub section: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StudentSummary {
    pub id: String,
    pub student_name: String,
    pub login_id: String,
    pub section: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: String,
    pub gender: String,
    pub email: String,
    pub status: RecordStatus,
    pub registration_id: String,
}

impl From<&Student> for StudentSummary {
    fn from(s: &Student) -> Self {
        Self {
            id: s.id.clone(),
            student_name: s.student_name.clone(),
            login_id: s.login_id.clone(),
            section: s.section.clone(),
            first_name: s.first_name.clone(),
            last_name: s.last_name.clone(),
            dob: s.dob.clone(),
            gender: s.gender.clone(),
            email: s.email.clone(),
            status: s.status,
            registration_id: s.registration_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StudentView {
    #[serde(flatten)]
    pub student: Student,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}
