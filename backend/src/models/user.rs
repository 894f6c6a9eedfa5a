//! User accounts, credentials and lockout state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeMap, fmt, str::FromStr};

use super::RecordStatus;

pub const ADMIN_USERNAME: &str = "ADMIN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UserRole {
    Admin,
    Faculty,
    #[default]
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Faculty => "Faculty",
            UserRole::Student => "Student",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            // "Academic" is the label the staff pages use for faculty accounts.
            "faculty" | "academic" => Ok(UserRole::Faculty),
            "student" => Ok(UserRole::Student),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl Serialize for UserRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|_| {
            serde::de::Error::unknown_variant(&raw, &["Admin", "Faculty", "Student"])
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Personal details completed by the account holder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Profile {
    pub fn email_only(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            ..Self::default()
        }
    }

    pub fn dob_year(&self) -> Option<&str> {
        self.dob
            .as_deref()
            .and_then(|dob| dob.split('-').next())
            .filter(|year| !year.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Shared with the linked academic or student record.
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
    pub registration_id: String,
    pub status: RecordStatus,
    pub profile_completed: bool,
    /// `None` until the first successful login records it.
    pub password_changed: Option<bool>,
    pub profile: Profile,
    pub theme: Theme,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub login_count: u64,
    pub failed_login_attempts: u32,
    pub account_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        id: String,
        username: String,
        password_hash: String,
        role: UserRole,
        registration_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            password_hash,
            role,
            registration_id,
            status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.account_locked && self.locked_until.is_some_and(|until| now < until)
    }

    /// Counts a bad password; returns true when this attempt locked the account.
    pub fn register_failed_login(
        &mut self,
        now: DateTime<Utc>,
        max_attempts: u32,
        lockout: Duration,
    ) -> bool {
        self.failed_login_attempts += 1;
        if self.failed_login_attempts >= max_attempts {
            self.account_locked = true;
            self.locked_until = Some(now + lockout);
            return true;
        }
        false
    }

    pub fn clear_lockout(&mut self) {
        self.failed_login_attempts = 0;
        self.account_locked = false;
        self.locked_until = None;
    }

    pub fn register_successful_login(&mut self, now: DateTime<Utc>, is_default_password: bool) {
        self.clear_lockout();
        self.last_login = Some(now);
        self.login_count += 1;
        if self.password_changed.is_none() {
            self.password_changed = Some(!is_default_password);
        }
    }

    pub fn set_password_hash(&mut self, hash: String, now: DateTime<Utc>) {
        self.password_hash = hash;
        self.password_changed = Some(true);
        self.updated_at = now;
    }
}

/// The `users` collection, keyed by username.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserDirectory(pub BTreeMap<String, User>);

impl UserDirectory {
    /// Exact match first, then a case-insensitive scan.
    pub fn find_key_ci(&self, username: &str) -> Option<String> {
        if username.is_empty() {
            return None;
        }
        if self.0.contains_key(username) {
            return Some(username.to_string());
        }
        self.0
            .keys()
            .find(|key| key.eq_ignore_ascii_case(username))
            .cloned()
    }

    pub fn is_taken(&self, username: &str) -> bool {
        self.find_key_ci(username).is_some()
    }

    /// Linear scan for the account linked to an academic or student record.
    pub fn find_by_linked_id(&self, id: &str, role: UserRole) -> Option<&User> {
        self.0
            .values()
            .find(|user| user.role == role && user.id == id)
    }

    pub fn get(&self, username: &str) -> Option<&User> {
        self.0.get(username)
    }

    pub fn get_mut(&mut self, username: &str) -> Option<&mut User> {
        self.0.get_mut(username)
    }

    pub fn insert(&mut self, user: User) {
        self.0.insert(user.username.clone(), user);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub username: String,
    pub role: UserRole,
    pub profile_completed: bool,
    pub password_changed: bool,
    pub is_default_password: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub session_token: String,
    pub user: LoginUser,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default, deserialize_with = "crate::validation::string_or_number")]
    pub dob_year: Option<String>,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    #[serde(default)]
    pub theme: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub marital_status: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub email: Option<String>,
}

/// Row of `GET /api/users/list`.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub role: UserRole,
    pub password_hash: String,
    pub status: RecordStatus,
    pub email: String,
    pub last_login: Option<DateTime<Utc>>,
    pub registration_id: String,
    pub profile_completed: bool,
    pub profile_status: &'static str,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            password_hash: user.password_hash.clone(),
            status: user.status,
            email: user.profile.email.clone().unwrap_or_default(),
            last_login: user.last_login,
            registration_id: user.registration_id.clone(),
            profile_completed: user.profile_completed,
            profile_status: if user.profile_completed {
                "Completed"
            } else {
                "Incomplete"
            },
        }
    }
}

/// Detailed account view; `password_hash` is only filled for admins.
#[derive(Debug, Serialize)]
pub struct UserDetails {
    pub username: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub status: RecordStatus,
    pub registration_id: String,
    pub profile_completed: bool,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub login_count: u64,
}

impl UserDetails {
    pub fn from_user(user: &User, include_credentials: bool) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role,
            password_hash: include_credentials.then(|| user.password_hash.clone()),
            status: user.status,
            registration_id: user.registration_id.clone(),
            profile_completed: user.profile_completed,
            profile: user.profile.clone(),
            created_at: user.created_at,
            last_login: user.last_login,
            login_count: user.login_count,
        }
    }
}
