use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use super::{user::Profile, RecordStatus};
use crate::validation::rules::validate_phone;

pub const MAX_EXPERIENCE_YEARS: u8 = 60;

/// Faculty member record; linked to a `Faculty` user through `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Academic {
    pub id: String,
    pub name: String,
    pub username: String,
    pub department: String,
    pub qualification: String,
    pub experience: u8,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub status: RecordStatus,
    pub registration_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AcademicDirectory(pub BTreeMap<String, Academic>);

impl AcademicDirectory {
    pub fn email_in_use(&self, email: &str, except_id: Option<&str>) -> bool {
        self.0
            .values()
            .any(|a| Some(a.id.as_str()) != except_id && a.email.eq_ignore_ascii_case(email))
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateAcademicRequest {
    pub name: Option<String>,
    pub department: Option<String>,
    pub qualification: Option<String>,
    #[serde(default, deserialize_with = "crate::validation::string_or_number")]
    pub experience: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_phone", message = "Invalid phone number format"))]
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAcademicRequest {
    pub name: Option<String>,
    pub department: Option<String>,
    pub qualification: Option<String>,
    #[serde(default, deserialize_with = "crate::validation::string_or_number")]
    pub experience: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AcademicSummary {
    pub id: String,
    pub name: String,
    pub username: Option<String>,
    pub department: String,
    pub qualification: String,
    pub experience: u8,
    pub email: String,
    pub phone: String,
    pub status: RecordStatus,
    pub registration_id: String,
}

impl AcademicSummary {
    pub fn new(academic: &Academic, username: Option<String>) -> Self {
        Self {
            id: academic.id.clone(),
            name: academic.name.clone(),
            username,
            department: academic.department.clone(),
            qualification: academic.qualification.clone(),
            experience: academic.experience,
            email: academic.email.clone(),
            phone: academic.phone.clone(),
            status: academic.status,
            registration_id: academic.registration_id.clone(),
        }
    }
}

/// Record joined with its linked account.
#[derive(Debug, Serialize)]
pub struct AcademicView {
    #[serde(flatten)]
    pub academic: Academic,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

/// Parses years of experience in `0..=60`.
pub fn parse_experience(raw: &str) -> Result<u8, &'static str> {
    let years: i64 = raw
        .trim()
        .parse()
        .map_err(|_| "Experience must be a number")?;
    if !(0..=MAX_EXPERIENCE_YEARS as i64).contains(&years) {
        return Err("Experience must be between 0 and 60 years");
    }
    Ok(years as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experience_bounds() {
        assert_eq!(parse_experience("0"), Ok(0));
        assert_eq!(parse_experience(" 60 "), Ok(60));
        assert!(parse_experience("61").is_err());
        assert!(parse_experience("-1").is_err());
        assert_eq!(parse_experience("ten"), Err("Experience must be a number"));
    }

    #[test]
    fn request_validation_flags_email_and_phone() {
        let request = CreateAcademicRequest {
            email: Some("nope".into()),
            phone: Some("123".into()),
            ..Default::default()
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
    }
}
