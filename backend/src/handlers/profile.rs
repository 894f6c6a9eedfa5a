use axum::extract::{Extension, State};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    handlers::extract::Json,
    models::{
        audit_log::NewActivity,
        session::SessionData,
        user::{Profile, UpdateProfileRequest, UserRole},
    },
    services::{access::ensure_self_or_admin, audit_log::actions},
    state::AppState,
    utils::today_local,
    validation::{is_valid_email, non_empty, sanitize_input},
};

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
) -> Result<Json<Value>, AppError> {
    let users = state.repos.users.read().await?;
    let user = users
        .get(&session.username)
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(json!({
        "profile": user.profile,
        "registration_id": user.registration_id,
        "profile_completed": user.profile_completed,
        "username": user.username,
        "role": user.role,
    })))
}

fn required(value: Option<&str>, label: &str) -> Result<String, AppError> {
    non_empty(value)
        .map(sanitize_input)
        .ok_or_else(|| AppError::BadRequest(format!("{} is required", label)))
}

fn parse_dob(raw: &str, today: NaiveDate) -> Result<(), AppError> {
    let dob = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date format".into()))?;
    if dob > today {
        return Err(AppError::BadRequest(
            "Date of birth must be in the past".into(),
        ));
    }
    Ok(())
}

/// Completes the caller's profile, or any profile when the caller is an admin. Faculty members
/// editing their own profile keep the email an administrator assigned.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let target = non_empty(payload.username.as_deref())
        .unwrap_or(&session.username)
        .to_string();
    ensure_self_or_admin(&session, &target)?;

    let guard = state.repos.users.lock().await;
    let mut users = guard.load().await?;
    let user = users
        .get(&target)
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let is_self_faculty = session.role == UserRole::Faculty && target == session.username;
    let assigned_email = if is_self_faculty {
        match non_empty(user.profile.email.as_deref()) {
            Some(email) => Some(email.to_lowercase()),
            None => {
                let academics = state.repos.academics.read().await?;
                academics
                    .0
                    .get(&user.id)
                    .and_then(|academic| non_empty(Some(academic.email.as_str())))
                    .map(str::to_lowercase)
            }
        }
    } else {
        None
    };

    let mut profile = Profile {
        first_name: Some(required(payload.first_name.as_deref(), "First Name")?),
        last_name: Some(required(payload.last_name.as_deref(), "Last Name")?),
        dob: Some(required(payload.dob.as_deref(), "Dob")?),
        gender: Some(required(payload.gender.as_deref(), "Gender")?),
        marital_status: Some(required(payload.marital_status.as_deref(), "Marital Status")?),
        father_name: Some(required(payload.father_name.as_deref(), "Father Name")?),
        mother_name: Some(required(payload.mother_name.as_deref(), "Mother Name")?),
        email: None,
    };

    let email = if is_self_faculty {
        let email = assigned_email.ok_or_else(|| {
            AppError::BadRequest(
                "Email must be assigned by an administrator before completing your profile."
                    .into(),
            )
        })?;
        if !is_valid_email(&email) {
            return Err(AppError::BadRequest(
                "Invalid email format. Please contact an administrator to correct it.".into(),
            ));
        }
        email
    } else {
        let email = required(payload.email.as_deref(), "Email")?.to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::BadRequest("Invalid email format".into()));
        }
        email
    };
    profile.email = Some(email);

    if let Some(dob) = profile.dob.as_deref() {
        parse_dob(dob, today_local(&state.config.time_zone))?;
    }

    let user = users
        .get_mut(&target)
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    user.profile = profile.clone();
    user.profile_completed = true;
    user.updated_at = Utc::now();
    guard.save(&users).await?;
    drop(guard);

    state
        .audit
        .record(
            NewActivity::success(&session.username, actions::PROFILE_UPDATED, "Profile updated")
                .entity("User", target),
        )
        .await;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "profile": profile,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dob_must_parse_and_not_be_in_the_future() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert!(parse_dob("1999-04-12", today).is_ok());
        assert!(parse_dob("2026-03-01", today).is_ok());
        assert!(matches!(
            parse_dob("2026-03-02", today),
            Err(AppError::BadRequest(msg)) if msg == "Date of birth must be in the past"
        ));
        assert!(matches!(
            parse_dob("12/04/1999", today),
            Err(AppError::BadRequest(msg)) if msg == "Invalid date format"
        ));
    }

    #[test]
    fn required_fields_name_the_missing_label() {
        assert_eq!(required(Some("  Jane "), "First Name").unwrap(), "Jane");
        assert!(matches!(
            required(Some("   "), "Marital Status"),
            Err(AppError::BadRequest(msg)) if msg == "Marital Status is required"
        ));
    }
}
