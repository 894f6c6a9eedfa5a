use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::str::FromStr;

use crate::{
    error::AppError,
    handlers::extract::Query,
    models::audit_log::ActivityQuery,
    state::AppState,
    utils::csv::render_csv,
};

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Users,
    Academics,
    Students,
    Timetable,
    Activities,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Users => "users",
            ExportKind::Academics => "academics",
            ExportKind::Students => "students",
            ExportKind::Timetable => "timetable",
            ExportKind::Activities => "activities",
        }
    }

    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            ExportKind::Users => &[
                "Username",
                "Role",
                "Status",
                "Email",
                "Profile Completed",
                "Registration ID",
                "Last Login",
                "Login Count",
            ],
            ExportKind::Academics => &[
                "ID",
                "Name",
                "Username",
                "Department",
                "Qualification",
                "Experience",
                "Email",
                "Phone",
                "Status",
                "Registration ID",
            ],
            ExportKind::Students => &[
                "ID",
                "Student Name",
                "Username",
                "Section",
                "First Name",
                "Last Name",
                "DOB",
                "Gender",
                "Email",
                "Phone",
                "Father Name",
                "Mother Name",
                "Status",
                "Registration ID",
            ],
            ExportKind::Timetable => &[
                "Day",
                "Section",
                "Start Time",
                "End Time",
                "Class Name",
                "Faculty",
                "Subject",
                "Topic",
                "Classroom",
                "Building",
            ],
            ExportKind::Activities => &[
                "Timestamp",
                "User",
                "Action",
                "Description",
                "Status",
                "Entity Type",
                "Entity ID",
            ],
        }
    }
}

impl FromStr for ExportKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(ExportKind::Users),
            "academics" => Ok(ExportKind::Academics),
            "students" => Ok(ExportKind::Students),
            "timetable" => Ok(ExportKind::Timetable),
            "activities" => Ok(ExportKind::Activities),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Csv,
    Json,
}

async fn collect_rows(state: &AppState, kind: ExportKind) -> Result<Vec<Vec<String>>, AppError> {
    let repos = &state.repos;
    let rows = match kind {
        ExportKind::Users => repos
            .users
            .read()
            .await?
            .0
            .values()
            .map(|user| {
                vec![
                    user.username.clone(),
                    user.role.to_string(),
                    user.status.as_str().to_string(),
                    user.profile.email.clone().unwrap_or_default(),
                    if user.profile_completed { "Yes" } else { "No" }.to_string(),
                    user.registration_id.clone(),
                    user.last_login
                        .map(|at| at.to_rfc3339())
                        .unwrap_or_default(),
                    user.login_count.to_string(),
                ]
            })
            .collect(),
        ExportKind::Academics => repos
            .academics
            .read()
            .await?
            .0
            .values()
            .map(|a| {
                vec![
                    a.id.clone(),
                    a.name.clone(),
                    a.username.clone(),
                    a.department.clone(),
                    a.qualification.clone(),
                    a.experience.to_string(),
                    a.email.clone(),
                    a.phone.clone(),
                    a.status.as_str().to_string(),
                    a.registration_id.clone(),
                ]
            })
            .collect(),
        ExportKind::Students => repos
            .students
            .read()
            .await?
            .0
            .values()
            .map(|s| {
                vec![
                    s.id.clone(),
                    s.student_name.clone(),
                    s.login_id.clone(),
                    s.section.clone(),
                    s.first_name.clone(),
                    s.last_name.clone(),
                    s.dob.clone(),
                    s.gender.clone(),
                    s.email.clone(),
                    s.phone.clone(),
                    s.father_name.clone(),
                    s.mother_name.clone(),
                    s.status.as_str().to_string(),
                    s.registration_id.clone(),
                ]
            })
            .collect(),
        ExportKind::Timetable => repos
            .timetable
            .read()
            .await?
            .entries()
            .map(|entry| {
                vec![
                    entry.day.to_string(),
                    entry.section.clone(),
                    entry.start_time_12.clone(),
                    entry.end_time_12.clone(),
                    entry.class_name.clone(),
                    entry.faculty_name.clone(),
                    entry.subject.clone(),
                    entry.topic_covered.clone(),
                    entry.classroom.clone(),
                    entry.building.clone(),
                ]
            })
            .collect(),
        ExportKind::Activities => {
            let query = ActivityQuery {
                limit: Some(state.config.max_activity_logs),
                ..ActivityQuery::default()
            };
            state
                .audit
                .query(&query)
                .await?
                .into_iter()
                .map(|record| {
                    vec![
                        record.timestamp.to_rfc3339(),
                        record.user,
                        record.action,
                        record.description,
                        record.status.as_str().to_string(),
                        record.entity_type.unwrap_or_default(),
                        record.entity_id.unwrap_or_default(),
                    ]
                })
                .collect()
        }
    };
    Ok(rows)
}

fn rows_as_objects(headers: &[&str], rows: Vec<Vec<String>>) -> Vec<Value> {
    rows.into_iter()
        .map(|row| {
            let object: Map<String, Value> = headers
                .iter()
                .zip(row)
                .map(|(header, cell)| (header.to_string(), Value::String(cell)))
                .collect();
            Value::Object(object)
        })
        .collect()
}

/// `GET /api/export/{data_type}?format=csv|json`
pub async fn export_data(
    State(state): State<AppState>,
    Path(data_type): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let kind: ExportKind = data_type
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid data type".into()))?;
    let format = match query.format.as_deref().unwrap_or("csv") {
        "csv" => ExportFormat::Csv,
        "json" => ExportFormat::Json,
        _ => return Err(AppError::BadRequest("Invalid format".into())),
    };

    let rows = collect_rows(&state, kind).await?;
    let filename = format!(
        "{}_{}",
        kind.as_str(),
        state.now_local().format("%Y%m%d")
    );
    tracing::info!(data_type = kind.as_str(), rows = rows.len(), "Export generated");

    match format {
        ExportFormat::Csv => {
            let body = render_csv(kind.headers(), &rows)?;
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            );
            let disposition = format!("attachment; filename={}.csv", filename);
            headers.insert(
                header::CONTENT_DISPOSITION,
                HeaderValue::from_str(&disposition)
                    .map_err(|e| AppError::InternalServerError(e.into()))?,
            );
            Ok((headers, body).into_response())
        }
        ExportFormat::Json => Ok(Json(json!({
            "data": rows_as_objects(kind.headers(), rows),
            "filename": kind.as_str(),
            "format": "json",
        }))
        .into_response()),
    }
}
