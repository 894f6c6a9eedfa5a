use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    handlers::extract::Json,
    models::{audit_log::NewActivity, session::SessionData, timetable::TimetableEntryInput},
    services::{
        access::{ensure_role, STAFF},
        audit_log::actions,
        timetable::{add_entry, delete_entry, purge_expired, update_entry},
    },
    state::AppState,
    utils::generate_id,
};

/// Returns the weekly timetable after dropping classes that already ended today.
pub async fn list_timetable(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let guard = state.repos.timetable.lock().await;
    let mut timetable = guard.load().await?;
    let removed = purge_expired(&mut timetable, &state.now_local());
    if removed > 0 {
        guard.save(&timetable).await?;
        tracing::debug!(removed, "Purged expired timetable entries");
    }
    Ok(Json(json!({ "data": timetable })))
}

pub async fn add_timetable_entry(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Json(payload): Json<TimetableEntryInput>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    ensure_role(&session, STAFF)?;

    let guard = state.repos.timetable.lock().await;
    let mut timetable = guard.load().await?;
    let id = generate_id("TT", &state.now_local());
    let entry = add_entry(&mut timetable, &payload, id, &session.username, Utc::now())?;
    guard.save(&timetable).await?;
    drop(guard);

    tracing::info!(
        id = %entry.id,
        day = %entry.day,
        section = %entry.section,
        "Timetable entry added"
    );
    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::TIMETABLE_ADDED,
                format!(
                    "Class {} added to {} for section {}",
                    entry.class_name, entry.day, entry.section
                ),
            )
            .entity("Timetable", entry.id.clone()),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Class added successfully",
            "timetable_entry": entry,
        })),
    ))
}

pub async fn update_timetable_entry(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Path(id): Path<String>,
    Json(payload): Json<TimetableEntryInput>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&session, STAFF)?;

    let guard = state.repos.timetable.lock().await;
    let mut timetable = guard.load().await?;
    let entry = update_entry(&mut timetable, &id, &payload, Utc::now())?;
    guard.save(&timetable).await?;
    drop(guard);

    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::TIMETABLE_UPDATED,
                format!("Class {} updated", entry.class_name),
            )
            .entity("Timetable", id),
        )
        .await;

    Ok(Json(json!({
        "message": "Timetable entry updated",
        "timetable_entry": entry,
    })))
}

pub async fn delete_timetable_entry(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_role(&session, STAFF)?;

    let guard = state.repos.timetable.lock().await;
    let mut timetable = guard.load().await?;
    let removed = delete_entry(&mut timetable, &id)?;
    guard.save(&timetable).await?;
    drop(guard);

    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::TIMETABLE_DELETED,
                format!("Class {} deleted", removed.class_name),
            )
            .entity("Timetable", id),
        )
        .await;

    Ok(Json(json!({ "message": "Class deleted successfully" })))
}
