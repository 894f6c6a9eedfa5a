//! Input rules shared across request payloads.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use validator::{ValidateEmail, ValidationError};

pub const PHONE_DIGITS: usize = 10;

/// Trims and HTML-escapes free text before it is stored.
pub fn sanitize_input(text: &str) -> String {
    text.trim()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    email.validate_email() && email.rsplit_once('.').is_some_and(|(_, tld)| tld.len() >= 2)
}

/// Ten digits, ignoring dashes and spaces.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits: String = phone.chars().filter(|c| *c != '-' && *c != ' ').collect();
    digits.len() == PHONE_DIGITS && digits.chars().all(|c| c.is_ascii_digit())
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if is_valid_phone(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("phone_invalid"))
    }
}

/// Accepts `"12"` or `12` for fields that clients send either way.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Trimmed, non-empty value of an optional field.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
