use axum::extract::{Extension, Path, State};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    handlers::extract::Json,
    models::{
        session::SessionData,
        user::{Theme, ThemeRequest, UserDetails, UserRole},
    },
    services::access::{ensure_role, STAFF},
    state::AppState,
};

/// Admins also receive the password hash; students are refused.
pub async fn user_details(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Path(username): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&session, STAFF)?;
    let users = state.repos.users.read().await?;
    let user = users
        .get(&username)
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let details = UserDetails::from_user(user, session.role == UserRole::Admin);
    Ok(Json(json!({ "user": details })))
}

pub async fn get_theme(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
) -> Result<Json<Value>, AppError> {
    let users = state.repos.users.read().await?;
    let theme = users
        .get(&session.username)
        .map(|user| user.theme)
        .unwrap_or_default();
    Ok(Json(json!({ "theme": theme })))
}

pub async fn update_theme(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Json(payload): Json<ThemeRequest>,
) -> Result<Json<Value>, AppError> {
    let theme = match payload.theme.as_deref() {
        Some("light") => Theme::Light,
        Some("dark") => Theme::Dark,
        _ => {
            return Err(AppError::BadRequest(
                r#"Invalid theme. Use "light" or "dark""#.into(),
            ))
        }
    };

    let guard = state.repos.users.lock().await;
    let mut users = guard.load().await?;
    let user = users
        .get_mut(&session.username)
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    user.theme = theme;
    user.updated_at = Utc::now();
    guard.save(&users).await?;

    Ok(Json(json!({ "message": "Theme updated successfully", "theme": theme })))
}
