use axum::extract::{Extension, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    db::Collection,
    error::AppError,
    handlers::extract::Json,
    models::{
        academic::AcademicDirectory,
        audit_log::NewActivity,
        event::EventDirectory,
        session::SessionData,
        student::StudentDirectory,
        timetable::Timetable,
        user::{UserDirectory, ADMIN_USERNAME},
    },
    services::{audit_log::actions, timetable::clear_sections},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ClearDataRequest {
    #[serde(rename = "type", default)]
    pub clear_type: Option<String>,
    #[serde(default)]
    pub sections: Vec<String>,
}

/// `all` keeps only the `ADMIN` account; `partial` removes the students of the given
/// sections with their logins, and those sections' classes.
pub async fn clear_data(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Json(payload): Json<ClearDataRequest>,
) -> Result<Json<Value>, AppError> {
    let (cleared, description) = match payload.clear_type.as_deref().unwrap_or("partial") {
        "all" => (clear_all(&state).await?, "All data cleared".to_string()),
        "partial" => {
            let sections: Vec<String> = payload
                .sections
                .iter()
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if sections.is_empty() {
                return Err(AppError::BadRequest(
                    "Sections required for partial clear".into(),
                ));
            }
            let cleared = clear_partial(&state, &sections).await?;
            (
                cleared,
                format!("Partial data cleared for sections: {}", sections.join(", ")),
            )
        }
        _ => return Err(AppError::BadRequest("Invalid clear type".into())),
    };

    tracing::warn!(user = %session.username, cleared = ?cleared, "Data cleared");
    state
        .audit
        .record(
            NewActivity::success(&session.username, actions::DATA_CLEARED, description)
                .entity_type("System"),
        )
        .await;

    Ok(Json(json!({
        "message": "Data cleared successfully",
        "cleared": cleared,
    })))
}

async fn clear_all(state: &AppState) -> Result<Vec<String>, AppError> {
    let repos = &state.repos;
    let users_guard = repos.users.lock().await;
    let academics_guard = repos.academics.lock().await;
    let students_guard = repos.students.lock().await;
    let events_guard = repos.events.lock().await;
    let timetable_guard = repos.timetable.lock().await;
    let activities_guard = repos.activities.lock().await;

    academics_guard.save(&AcademicDirectory::default()).await?;
    students_guard.save(&StudentDirectory::default()).await?;
    events_guard.save(&EventDirectory::default()).await?;
    timetable_guard.save(&Timetable::empty()).await?;
    activities_guard.save(&Vec::new()).await?;

    let users = users_guard.load().await?;
    let mut remaining = UserDirectory::default();
    if let Some(admin) = users.get(ADMIN_USERNAME) {
        remaining.insert(admin.clone());
    }
    users_guard.save(&remaining).await?;

    Ok([
        Collection::Academics,
        Collection::Students,
        Collection::Events,
        Collection::Timetable,
        Collection::Activities,
        Collection::Users,
    ]
    .iter()
    .map(|collection| collection.key().to_string())
    .collect())
}

async fn clear_partial(state: &AppState, sections: &[String]) -> Result<Vec<String>, AppError> {
    let repos = &state.repos;
    let users_guard = repos.users.lock().await;
    let students_guard = repos.students.lock().await;
    let timetable_guard = repos.timetable.lock().await;

    let mut users = users_guard.load().await?;
    let mut students = students_guard.load().await?;
    let mut timetable = timetable_guard.load().await?;

    let in_sections = |section: &str| sections.iter().any(|s| s.eq_ignore_ascii_case(section));
    let mut removed_logins = Vec::new();
    students.0.retain(|_, student| {
        if in_sections(&student.section) {
            removed_logins.push(student.login_id.clone());
            false
        } else {
            true
        }
    });
    for login in &removed_logins {
        users.0.remove(login);
    }
    let removed_classes = clear_sections(&mut timetable, sections);

    users_guard.save(&users).await?;
    students_guard.save(&students).await?;
    timetable_guard.save(&timetable).await?;
    tracing::debug!(
        students = removed_logins.len(),
        classes = removed_classes,
        "Sections cleared"
    );

    let label = sections.join(", ");
    let mut cleared = Vec::new();
    if !removed_logins.is_empty() {
        cleared.push(format!("students (sections: {})", label));
    }
    cleared.push(format!("timetable (sections: {})", label));
    Ok(cleared)
}

/// Copies every stored collection under `backups/backup_<timestamp>/`.
pub async fn create_backup(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
) -> Result<Json<Value>, AppError> {
    let folder = format!("backup_{}", state.now_local().format("%Y%m%d_%H%M%S"));
    let mut files = Vec::new();
    for collection in Collection::ALL {
        let document = state.store.load(collection.key()).await?;
        if document.is_null() {
            continue;
        }
        let key = format!("backups/{}/{}", folder, collection.key());
        state.store.save(&key, &document).await?;
        files.push(collection.key().to_string());
    }

    tracing::info!(folder = %folder, files = files.len(), "Backup created");
    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::BACKUP_CREATED,
                format!("Backup created: {}", folder),
            )
            .entity_type("System"),
        )
        .await;

    Ok(Json(json!({
        "message": "Backup created successfully",
        "backup_folder": folder,
        "files": files,
    })))
}
