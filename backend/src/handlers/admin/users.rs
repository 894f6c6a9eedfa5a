use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    handlers::extract::Json,
    models::{
        audit_log::NewActivity,
        session::SessionData,
        user::{CreateUserRequest, UpdateStatusRequest, User, UserRole, UserSummary},
        ListResponse, RecordStatus,
    },
    services::audit_log::actions,
    state::AppState,
    utils::{generate_id, generate_registration_id, generate_username, hash_password},
};

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<UserSummary>>, AppError> {
    let users = state.repos.users.read().await?;
    let rows = users.0.values().map(UserSummary::from).collect();
    Ok(Json(ListResponse::new(rows)))
}

/// Creates a standalone login. Staff and student records create their own accounts.
pub async fn add_user(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let name = payload.name.trim();
    let role = payload.role.trim();
    if name.is_empty() || role.is_empty() {
        return Err(AppError::BadRequest("Name and role are required".into()));
    }
    let role = match role.parse::<UserRole>() {
        Ok(role @ (UserRole::Faculty | UserRole::Student)) => role,
        _ => {
            return Err(AppError::BadRequest(
                "Role must be Faculty or Student".into(),
            ))
        }
    };

    let guard = state.repos.users.lock().await;
    let mut users = guard.load().await?;
    let local_now = state.now_local();
    let id = generate_id("USR", &local_now);
    let registration_id = generate_registration_id(&local_now);
    let username = generate_username(name, |candidate| users.is_taken(candidate));
    let default_password = state.config.default_password_for(role).to_string();

    let mut user = User::new(
        id.clone(),
        username.clone(),
        hash_password(&default_password)?,
        role,
        registration_id.clone(),
        Utc::now(),
    );
    user.created_by = Some(session.username.clone());
    users.insert(user);
    guard.save(&users).await?;
    drop(guard);

    tracing::info!(username = %username, role = %role, "User created");
    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::USER_ADDED,
                format!("User {} created", username),
            )
            .entity("User", username.clone()),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": {
                "id": id,
                "username": username,
                "role": role,
                "registration_id": registration_id,
                "default_password": default_password,
            },
        })),
    ))
}

pub async fn update_user_status(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Path(username): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let status = match payload.status.as_deref() {
        Some("active") => RecordStatus::Active,
        Some("inactive") => RecordStatus::Inactive,
        _ => return Err(AppError::BadRequest("Invalid status".into())),
    };

    let guard = state.repos.users.lock().await;
    let mut users = guard.load().await?;
    let user = users
        .get_mut(&username)
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let previous = user.status;
    user.status = status;
    user.updated_at = Utc::now();
    guard.save(&users).await?;
    drop(guard);

    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::USER_STATUS_CHANGED,
                format!(
                    "Status changed from {} to {}",
                    previous.as_str(),
                    status.as_str()
                ),
            )
            .entity("User", username.clone()),
        )
        .await;

    Ok(Json(json!({
        "message": "User status updated",
        "user": {
            "username": username,
            "status": status,
        },
    })))
}
