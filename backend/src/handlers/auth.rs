use axum::extract::{Extension, State};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    handlers::extract::Json,
    models::{
        audit_log::NewActivity,
        session::{SessionData, SessionToken},
        user::{
            ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse, LoginUser,
            User, UserRole,
        },
    },
    services::audit_log::actions,
    state::AppState,
    utils::{hash_password, meets_length_policy, verify_password},
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

fn invalid_credentials() -> AppError {
    AppError::Unauthorized(INVALID_CREDENTIALS.to_string())
}

fn password_too_short(min_length: usize) -> AppError {
    AppError::BadRequest(format!(
        "New password must be at least {} characters.",
        min_length
    ))
}

/// Unreadable hashes count as a mismatch.
fn password_matches(password: &str, user: &User) -> bool {
    match verify_password(password, &user.password_hash) {
        Ok(matches) => matches,
        Err(err) => {
            tracing::warn!(username = %user.username, error = %err, "Stored password hash is unreadable");
            false
        }
    }
}

/// Called after `password` has been verified against the stored hash.
fn is_default_password(state: &AppState, password: &str, role: UserRole) -> bool {
    role != UserRole::Admin && password == state.config.default_password_for(role)
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".into(),
        ));
    }

    let guard = state.repos.users.lock().await;
    let mut users = guard.load().await?;
    let key = users.find_key_ci(username).ok_or_else(invalid_credentials)?;
    let now = Utc::now();
    let user = users.get_mut(&key).ok_or_else(invalid_credentials)?;

    if user.is_locked_at(now) {
        return Err(AppError::Forbidden(
            "Account is locked. Please try again later.".into(),
        ));
    }
    if user.account_locked {
        // Lock window elapsed; the next attempt starts a fresh count.
        user.clear_lockout();
    }
    if !user.is_active() {
        return Err(AppError::Forbidden(
            "Account is inactive. Please contact administrator.".into(),
        ));
    }

    if !password_matches(&payload.password, user) {
        let locked = user.register_failed_login(
            now,
            state.config.max_login_attempts,
            Duration::minutes(state.config.lockout_duration_minutes),
        );
        if locked {
            tracing::warn!(username = %key, "Account locked after repeated failed logins");
        } else {
            tracing::debug!(
                username = %key,
                attempts = user.failed_login_attempts,
                "Failed login"
            );
        }
        guard.save(&users).await?;
        return Err(invalid_credentials());
    }

    let is_default = is_default_password(&state, &payload.password, user.role);
    user.register_successful_login(now, is_default);
    let response_user = LoginUser {
        username: user.username.clone(),
        role: user.role,
        profile_completed: user.profile_completed,
        password_changed: user.password_changed.unwrap_or(false),
        is_default_password: is_default,
    };
    guard.save(&users).await?;
    drop(guard);

    let session_token = state
        .sessions
        .create(&response_user.username, response_user.role);
    tracing::info!(username = %response_user.username, role = %response_user.role, "Login successful");

    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        session_token,
        user: response_user,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
) -> Json<Value> {
    state.sessions.destroy(&token.0);
    Json(json!({ "message": "Logout successful" }))
}

pub async fn session_status(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
) -> Json<Value> {
    Json(json!({
        "remaining_seconds": session.remaining_seconds(Utc::now()),
        "total_seconds": state.config.session_timeout_seconds(),
        "user": {
            "username": session.username,
            "role": session.role,
        },
    }))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let username = payload.username.trim();
    let dob_year = payload.dob_year.as_deref().map(str::trim).unwrap_or_default();
    if username.is_empty() || dob_year.is_empty() || payload.new_password.is_empty() {
        return Err(AppError::BadRequest(
            "Username, year of birth, and new password are required.".into(),
        ));
    }
    if dob_year.len() != 4 || !dob_year.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest(
            "Enter a valid 4-digit year of birth.".into(),
        ));
    }
    let min_length = state.config.password_min_length;
    if !meets_length_policy(&payload.new_password, min_length) {
        return Err(password_too_short(min_length));
    }

    let guard = state.repos.users.lock().await;
    let mut users = guard.load().await?;
    let not_verified = || AppError::NotFound("Unable to verify the provided details.".into());
    let key = users.find_key_ci(username).ok_or_else(not_verified)?;
    let user = users.get_mut(&key).ok_or_else(not_verified)?;

    let Some(stored_year) = user.profile.dob_year() else {
        return Err(AppError::BadRequest(
            "DOB is not available. Please contact the administrator.".into(),
        ));
    };
    if stored_year != dob_year {
        tracing::debug!(username = %key, "Password reset rejected: year of birth mismatch");
        return Err(AppError::Forbidden(
            "The provided details do not match our records.".into(),
        ));
    }

    user.set_password_hash(hash_password(&payload.new_password)?, Utc::now());
    user.clear_lockout();
    guard.save(&users).await?;
    drop(guard);

    state
        .audit
        .record(
            NewActivity::success(&key, actions::PASSWORD_RESET, "Password reset via forgot password")
                .entity("User", key.clone()),
        )
        .await;

    Ok(Json(json!({
        "message": "Password reset successfully. You can now log in with your new password."
    })))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        return Err(AppError::BadRequest(
            "Current and new passwords are required".into(),
        ));
    }
    let min_length = state.config.password_min_length;
    if !meets_length_policy(&payload.new_password, min_length) {
        return Err(password_too_short(min_length));
    }

    let guard = state.repos.users.lock().await;
    let mut users = guard.load().await?;
    let user = users
        .get_mut(&session.username)
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if !password_matches(&payload.current_password, user) {
        return Err(AppError::Unauthorized(
            "Current password is incorrect".into(),
        ));
    }

    user.set_password_hash(hash_password(&payload.new_password)?, Utc::now());
    guard.save(&users).await?;
    drop(guard);

    state
        .audit
        .record(
            NewActivity::success(&session.username, actions::PASSWORD_CHANGED, "Password changed")
                .entity("User", session.username.clone()),
        )
        .await;

    Ok(Json(json!({
        "message": "Password changed successfully",
        "password_changed": true,
    })))
}
