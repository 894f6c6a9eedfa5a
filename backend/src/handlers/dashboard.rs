use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{error::AppError, services::timetable::todays_active, state::AppState};

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_users: usize,
    pub total_academics: usize,
    pub total_students: usize,
    pub total_events: usize,
    pub active_sessions: usize,
    pub today_classes: usize,
}

/// Counts of active records plus today's classes that have not ended yet.
pub async fn dashboard_stats(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let users = state.repos.users.read().await?;
    let academics = state.repos.academics.read().await?;
    let students = state.repos.students.read().await?;
    let events = state.repos.events.read().await?;
    let timetable = state.repos.timetable.read().await?;

    let stats = DashboardStats {
        total_users: users.len(),
        total_academics: academics.0.values().filter(|a| a.status.is_active()).count(),
        total_students: students.0.values().filter(|s| s.status.is_active()).count(),
        total_events: events.0.values().filter(|e| e.status.is_active()).count(),
        active_sessions: state.sessions.active_count(),
        today_classes: todays_active(&timetable, &state.now_local()).len(),
    };
    Ok(Json(json!({ "stats": stats })))
}
