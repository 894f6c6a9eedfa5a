use anyhow::anyhow;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, str::FromStr};

use crate::models::user::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    File,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" | "json" => Ok(StorageBackend::File),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => Err(anyhow!("Invalid STORAGE_BACKEND value: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub storage_backend: StorageBackend,
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    pub time_zone: Tz,
    pub session_timeout_minutes: i64,
    pub password_min_length: usize,
    pub max_login_attempts: u32,
    pub lockout_duration_minutes: i64,
    pub max_activity_logs: usize,
    pub default_admin_password: String,
    pub default_faculty_password: String,
    pub default_student_password: String,
    pub cors_allow_origins: Vec<String>,
    pub production_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "127.0.0.1:5000".to_string(),
            storage_backend: StorageBackend::File,
            data_dir: PathBuf::from("./data"),
            database_url: None,
            time_zone: chrono_tz::UTC,
            session_timeout_minutes: 15,
            password_min_length: 6,
            max_login_attempts: 5,
            lockout_duration_minutes: 15,
            max_activity_logs: 10_000,
            default_admin_password: "admin123".to_string(),
            default_faculty_password: "acad123".to_string(),
            default_student_password: "stud123".to_string(),
            cors_allow_origins: Vec::new(),
            production_mode: false,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let bind_addr = env::var("APP_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.storage_backend,
        };

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL is required when STORAGE_BACKEND=postgres"));
        }

        let time_zone_name = env::var("APP_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();

        Ok(Config {
            bind_addr,
            storage_backend,
            data_dir,
            database_url,
            time_zone,
            session_timeout_minutes: parse_env("SESSION_TIMEOUT_MINUTES", 15).max(1),
            password_min_length: parse_env("PASSWORD_MIN_LENGTH", 6).max(1),
            max_login_attempts: parse_env("MAX_LOGIN_ATTEMPTS", 5).max(1),
            lockout_duration_minutes: parse_env("LOCKOUT_DURATION_MINUTES", 15).max(1),
            max_activity_logs: parse_env("MAX_ACTIVITY_LOGS", 10_000).max(1),
            default_admin_password: env::var("DEFAULT_ADMIN_PASSWORD")
                .unwrap_or(defaults.default_admin_password),
            default_faculty_password: env::var("DEFAULT_FACULTY_PASSWORD")
                .unwrap_or(defaults.default_faculty_password),
            default_student_password: env::var("DEFAULT_STUDENT_PASSWORD")
                .unwrap_or(defaults.default_student_password),
            cors_allow_origins,
            production_mode: parse_env("PRODUCTION_MODE", false),
        })
    }

    pub fn session_timeout_seconds(&self) -> i64 {
        self.session_timeout_minutes * 60
    }

    /// Initial password handed out with new accounts of `role`.
    pub fn default_password_for(&self, role: UserRole) -> &str {
        match role {
            UserRole::Admin => &self.default_admin_password,
            UserRole::Faculty => &self.default_faculty_password,
            UserRole::Student => &self.default_student_password,
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
