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
        academic::{
            parse_experience, Academic, AcademicSummary, AcademicView, CreateAcademicRequest,
            UpdateAcademicRequest,
        },
        audit_log::NewActivity,
        session::SessionData,
        user::{Profile, User, UserRole},
        ListResponse, RecordStatus,
    },
    services::{
        access::{ensure_role, STAFF},
        audit_log::actions,
    },
    state::AppState,
    utils::{generate_id, generate_registration_id, generate_username, hash_password},
    validation::{is_valid_email, is_valid_phone, non_empty, sanitize_input, Validate},
};

fn academic_not_found() -> AppError {
    AppError::NotFound("Academic not found".into())
}

pub async fn list_academics(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<AcademicSummary>>, AppError> {
    let academics = state.repos.academics.read().await?;
    let users = state.repos.users.read().await?;
    let rows = academics
        .0
        .values()
        .map(|academic| {
            let username = users
                .find_by_linked_id(&academic.id, UserRole::Faculty)
                .map(|user| user.username.clone());
            AcademicSummary::new(academic, username)
        })
        .collect();
    Ok(Json(ListResponse::new(rows)))
}

pub async fn view_academic(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let academics = state.repos.academics.read().await?;
    let mut academic = academics.0.get(&id).cloned().ok_or_else(academic_not_found)?;
    let users = state.repos.users.read().await?;
    let linked = users.find_by_linked_id(&id, UserRole::Faculty);
    if let Some(user) = linked {
        academic.username = user.username.clone();
    }

    let view = AcademicView {
        academic,
        user_profile: linked.map(|user| user.profile.clone()),
        profile_completed: linked.map(|user| user.profile_completed),
        password_hash: linked
            .filter(|_| session.role == UserRole::Admin)
            .map(|user| user.password_hash.clone()),
    };
    Ok(Json(json!({ "academic": view })))
}

/// Creates the academic record together with its `Faculty` login.
pub async fn add_academic(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Json(payload): Json<CreateAcademicRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    ensure_role(&session, STAFF)?;
    let request = CreateAcademicRequest {
        name: non_empty(payload.name.as_deref()).map(str::to_string),
        department: non_empty(payload.department.as_deref()).map(str::to_string),
        qualification: non_empty(payload.qualification.as_deref()).map(str::to_string),
        experience: non_empty(payload.experience.as_deref()).map(str::to_string),
        email: non_empty(payload.email.as_deref()).map(str::to_lowercase),
        phone: non_empty(payload.phone.as_deref()).map(str::to_string),
    };
    let (
        Some(name),
        Some(department),
        Some(qualification),
        Some(experience),
        Some(email),
        Some(phone),
    ) = (
        request.name.as_deref(),
        request.department.as_deref(),
        request.qualification.as_deref(),
        request.experience.as_deref(),
        request.email.as_deref(),
        request.phone.as_deref(),
    ) else {
        return Err(AppError::BadRequest("All fields are required".into()));
    };
    request.validate()?;
    if !is_valid_email(email) {
        return Err(AppError::BadRequest("Invalid email format".into()));
    }
    let experience =
        parse_experience(experience).map_err(|msg| AppError::BadRequest(msg.into()))?;

    let users_guard = state.repos.users.lock().await;
    let academics_guard = state.repos.academics.lock().await;
    let mut users = users_guard.load().await?;
    let mut academics = academics_guard.load().await?;

    if academics.email_in_use(email, None) {
        return Err(AppError::Conflict("Email already exists".into()));
    }

    let local_now = state.now_local();
    let now = Utc::now();
    let id = generate_id("ACM", &local_now);
    let registration_id = generate_registration_id(&local_now);
    let username = generate_username(name, |candidate| users.is_taken(candidate));
    let default_password = state.config.default_password_for(UserRole::Faculty).to_string();

    let academic = Academic {
        id: id.clone(),
        name: sanitize_input(name),
        username: username.clone(),
        department: sanitize_input(department),
        qualification: sanitize_input(qualification),
        experience,
        email: email.to_string(),
        phone: phone.to_string(),
        status: RecordStatus::Active,
        registration_id: registration_id.clone(),
        created_at: now,
        updated_at: now,
        created_by: session.username.clone(),
    };

    let mut user = User::new(
        id.clone(),
        username.clone(),
        hash_password(&default_password)?,
        UserRole::Faculty,
        registration_id.clone(),
        now,
    );
    user.profile = Profile::email_only(email);
    user.created_by = Some(session.username.clone());

    let display_name = academic.name.clone();
    academics.0.insert(id.clone(), academic);
    users.insert(user);
    academics_guard.save(&academics).await?;
    users_guard.save(&users).await?;
    drop(academics_guard);
    drop(users_guard);

    tracing::info!(id = %id, username = %username, "Academic added");
    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::ACADEMIC_ADDED,
                format!("Academic {} added", display_name),
            )
            .entity("Academic", id.clone()),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Academic added successfully",
            "academic": {
                "id": id,
                "name": display_name,
                "username": username,
                "registration_id": registration_id,
                "default_password": default_password,
            },
        })),
    ))
}

/// Applies the provided fields; any invalid value rejects the whole update.
pub async fn update_academic(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAcademicRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&session, STAFF)?;
    let guard = state.repos.academics.lock().await;
    let mut academics = guard.load().await?;
    if !academics.0.contains_key(&id) {
        return Err(academic_not_found());
    }

    let experience = payload
        .experience
        .as_deref()
        .map(parse_experience)
        .transpose()
        .map_err(|msg| AppError::BadRequest(msg.into()))?;
    let email = match payload.email.as_deref().map(|e| e.trim().to_lowercase()) {
        Some(email) if !is_valid_email(&email) => {
            return Err(AppError::BadRequest("Invalid email format".into()))
        }
        Some(email) if academics.email_in_use(&email, Some(id.as_str())) => {
            return Err(AppError::Conflict("Email already exists".into()))
        }
        other => other,
    };
    let phone = match payload.phone.as_deref().map(str::trim) {
        Some(phone) if !is_valid_phone(phone) => {
            return Err(AppError::BadRequest("Invalid phone number format".into()))
        }
        other => other.map(str::to_string),
    };

    let academic = academics.0.get_mut(&id).ok_or_else(academic_not_found)?;
    if let Some(name) = payload.name.as_deref() {
        academic.name = sanitize_input(name);
    }
    if let Some(department) = payload.department.as_deref() {
        academic.department = sanitize_input(department);
    }
    if let Some(qualification) = payload.qualification.as_deref() {
        academic.qualification = sanitize_input(qualification);
    }
    if let Some(experience) = experience {
        academic.experience = experience;
    }
    if let Some(email) = email {
        academic.email = email;
    }
    if let Some(phone) = phone {
        academic.phone = phone;
    }
    academic.updated_at = Utc::now();
    let updated = academic.clone();
    guard.save(&academics).await?;
    drop(guard);

    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::ACADEMIC_UPDATED,
                format!("Academic {} updated", updated.name),
            )
            .entity("Academic", id),
        )
        .await;

    Ok(Json(json!({
        "message": "Academic updated successfully",
        "academic": updated,
    })))
}

/// Soft delete: the record is kept with status `inactive`.
pub async fn delete_academic(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&session, STAFF)?;
    let guard = state.repos.academics.lock().await;
    let mut academics = guard.load().await?;
    let academic = academics.0.get_mut(&id).ok_or_else(academic_not_found)?;
    academic.status = RecordStatus::Inactive;
    academic.updated_at = Utc::now();
    let name = academic.name.clone();
    guard.save(&academics).await?;
    drop(guard);

    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::ACADEMIC_DELETED,
                format!("Academic {} deleted", name),
            )
            .entity("Academic", id),
        )
        .await;

    Ok(Json(json!({ "message": "Academic deleted successfully" })))
}
