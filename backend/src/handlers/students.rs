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
        student::{
            CreateStudentRequest, Student, StudentSummary, StudentView, UpdateStudentRequest,
        },
        user::{User, UserRole},
        ListResponse, RecordStatus,
    },
    services::{
        access::{ensure_role, STAFF},
        audit_log::actions,
    },
    state::AppState,
    utils::{generate_id, generate_registration_id, generate_username, hash_password},
    validation::{is_valid_email, is_valid_phone, non_empty, sanitize_input},
};

fn student_not_found() -> AppError {
    AppError::NotFound("Student not found".into())
}

pub async fn list_students(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<StudentSummary>>, AppError> {
    let students = state.repos.students.read().await?;
    let rows = students.0.values().map(StudentSummary::from).collect();
    Ok(Json(ListResponse::new(rows)))
}

/// Creates the student record together with its `Student` login.
pub async fn add_student(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Json(payload): Json<CreateStudentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    ensure_role(&session, STAFF)?;
    let (Some(student_name), Some(section)) = (
        non_empty(payload.student_name.as_deref()),
        non_empty(payload.section.as_deref()),
    ) else {
        return Err(AppError::BadRequest(
            "Student name and section are required".into(),
        ));
    };
    let section = section.to_uppercase();

    let users_guard = state.repos.users.lock().await;
    let students_guard = state.repos.students.lock().await;
    let mut users = users_guard.load().await?;
    let mut students = students_guard.load().await?;

    let local_now = state.now_local();
    let now = Utc::now();
    let id = generate_id("STU", &local_now);
    let registration_id = generate_registration_id(&local_now);
    let username = generate_username(student_name, |candidate| users.is_taken(candidate));
    let default_password = state.config.default_password_for(UserRole::Student).to_string();

    let student = Student {
        id: id.clone(),
        student_name: sanitize_input(student_name),
        login_id: username.clone(),
        section: section.clone(),
        status: RecordStatus::Active,
        registration_id: registration_id.clone(),
        created_at: now,
        updated_at: now,
        created_by: session.username.clone(),
        ..Student::default()
    };
    let mut user = User::new(
        id.clone(),
        username.clone(),
        hash_password(&default_password)?,
        UserRole::Student,
        registration_id.clone(),
        now,
    );
    user.created_by = Some(session.username.clone());

    let display_name = student.student_name.clone();
    students.0.insert(id.clone(), student);
    users.insert(user);
    students_guard.save(&students).await?;
    users_guard.save(&users).await?;
    drop(students_guard);
    drop(users_guard);

    tracing::info!(id = %id, username = %username, section = %section, "Student added");
    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::STUDENT_ADDED,
                format!("Student {} added", display_name),
            )
            .entity("Student", id.clone()),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Student added successfully",
            "student": {
                "id": id,
                "student_name": display_name,
                "username": username,
                "section": section,
                "registration_id": registration_id,
                "default_password": default_password,
            },
        })),
    ))
}

pub async fn view_student(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&session, STAFF)?;
    let students = state.repos.students.read().await?;
    let student = students.0.get(&id).cloned().ok_or_else(student_not_found)?;
    let users = state.repos.users.read().await?;
    let linked = users.get(&student.login_id);

    let view = StudentView {
        student,
        user_profile: linked.map(|user| user.profile.clone()),
        profile_completed: linked.map(|user| user.profile_completed),
        password_hash: linked
            .filter(|_| session.role == UserRole::Admin)
            .map(|user| user.password_hash.clone()),
    };
    Ok(Json(json!({ "student": view })))
}

/// Applies the provided fields; any invalid value rejects the whole update.
pub async fn update_student(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStudentRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&session, STAFF)?;

    let email = match payload.email.as_deref().map(|e| e.trim().to_lowercase()) {
        Some(email) if !email.is_empty() && !is_valid_email(&email) => {
            return Err(AppError::BadRequest("Invalid email format".into()))
        }
        other => other,
    };
    let phone = match payload.phone.as_deref().map(str::trim) {
        Some(phone) if !phone.is_empty() && !is_valid_phone(phone) => {
            return Err(AppError::BadRequest("Invalid phone number format".into()))
        }
        other => other.map(str::to_string),
    };

    let guard = state.repos.students.lock().await;
    let mut students = guard.load().await?;
    let student = students.0.get_mut(&id).ok_or_else(student_not_found)?;

    let text_fields = [
        (&payload.student_name, &mut student.student_name),
        (&payload.first_name, &mut student.first_name),
        (&payload.last_name, &mut student.last_name),
        (&payload.father_name, &mut student.father_name),
        (&payload.mother_name, &mut student.mother_name),
    ];
    for (provided, stored) in text_fields {
        if let Some(value) = provided {
            *stored = sanitize_input(value);
        }
    }
    if let Some(section) = payload.section.as_deref() {
        student.section = section.trim().to_uppercase();
    }
    if let Some(dob) = payload.dob.as_deref() {
        student.dob = dob.trim().to_string();
    }
    if let Some(gender) = payload.gender.as_deref() {
        student.gender = gender.trim().to_string();
    }
    if let Some(email) = email {
        student.email = email;
    }
    if let Some(phone) = phone {
        student.phone = phone;
    }
    student.updated_at = Utc::now();
    let updated = student.clone();
    guard.save(&students).await?;
    drop(guard);

    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::STUDENT_UPDATED,
                format!("Student {} updated", updated.student_name),
            )
            .entity("Student", id),
        )
        .await;

    Ok(Json(json!({
        "message": "Student updated successfully",
        "student": updated,
    })))
}

/// Soft delete; the linked login is deactivated as well.
pub async fn delete_student(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&session, STAFF)?;

    let users_guard = state.repos.users.lock().await;
    let students_guard = state.repos.students.lock().await;
    let mut users = users_guard.load().await?;
    let mut students = students_guard.load().await?;

    let now = Utc::now();
    let student = students.0.get_mut(&id).ok_or_else(student_not_found)?;
    student.status = RecordStatus::Inactive;
    student.updated_at = now;
    let name = student.student_name.clone();
    let login_id = student.login_id.clone();

    let mut user_changed = false;
    if let Some(user) = users.get_mut(&login_id) {
        user.status = RecordStatus::Inactive;
        user.updated_at = now;
        user_changed = true;
    }

    students_guard.save(&students).await?;
    if user_changed {
        users_guard.save(&users).await?;
    }
    drop(students_guard);
    drop(users_guard);

    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::STUDENT_DELETED,
                format!("Student {} deleted", name),
            )
            .entity("Student", id),
        )
        .await;

    Ok(Json(json!({ "message": "Student deleted successfully" })))
}
