use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    handlers::extract::Json,
    models::{
        audit_log::NewActivity,
        event::{
            CreateEventRequest, Event, EventSummary, Registration, RegistrationError,
            MAX_EVENT_CAPACITY,
        },
        session::SessionData,
        user::UserRole,
        ListResponse, RecordStatus,
    },
    services::{
        access::{ensure_role, STAFF},
        audit_log::actions,
    },
    state::AppState,
    utils::{generate_id, today_local, ClockTime},
    validation::{non_empty, sanitize_input},
};

fn event_not_found() -> AppError {
    AppError::NotFound("Event not found".into())
}

fn parse_capacity(raw: &str) -> Result<u32, AppError> {
    let capacity: i64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Capacity must be a number".into()))?;
    if !(1..=MAX_EVENT_CAPACITY as i64).contains(&capacity) {
        return Err(AppError::BadRequest(
            "Capacity must be between 1 and 10000".into(),
        ));
    }
    Ok(capacity as u32)
}

fn parse_event_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, AppError> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date format".into()))?;
    if date < today {
        return Err(AppError::BadRequest(
            "Event date must be today or in the future".into(),
        ));
    }
    Ok(date)
}

/// Events ordered by date, then creation order.
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<EventSummary>>, AppError> {
    let events = state.repos.events.read().await?;
    let mut rows: Vec<EventSummary> = events.0.values().map(EventSummary::from).collect();
    rows.sort_by_key(|event| event.date);
    Ok(Json(ListResponse::new(rows)))
}

pub async fn add_event(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    ensure_role(&session, STAFF)?;
    let (
        Some(title),
        Some(date),
        Some(time),
        Some(organizer_name),
        Some(club_name),
        Some(capacity),
    ) = (
        non_empty(payload.title.as_deref()),
        non_empty(payload.date.as_deref()),
        non_empty(payload.time.as_deref()),
        non_empty(payload.organizer_name.as_deref()),
        non_empty(payload.club_name.as_deref()),
        non_empty(payload.capacity.as_deref()),
    ) else {
        return Err(AppError::BadRequest(
            "All required fields must be provided".into(),
        ));
    };

    let capacity = parse_capacity(capacity)?;
    let date = parse_event_date(date, today_local(&state.config.time_zone))?;
    let time = ClockTime::parse(time)
        .ok_or_else(|| AppError::BadRequest("Invalid time format".into()))?;
    let optional = |value: Option<&str>| non_empty(value).map(sanitize_input).unwrap_or_default();

    let guard = state.repos.events.lock().await;
    let mut events = guard.load().await?;
    let now = Utc::now();
    let id = generate_id("EVT", &state.now_local());
    let event = Event {
        id: id.clone(),
        title: sanitize_input(title),
        date,
        time: time.hhmm,
        time_12: time.display,
        organizer_name: sanitize_input(organizer_name),
        club_name: sanitize_input(club_name),
        chief_guest: optional(payload.chief_guest.as_deref()),
        description: optional(payload.description.as_deref()),
        capacity,
        registered_count: 0,
        registrations: Vec::new(),
        venue: optional(payload.venue.as_deref()),
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
        created_by: session.username.clone(),
    };
    let title = event.title.clone();
    let time_12 = event.time_12.clone();
    events.0.insert(id.clone(), event);
    guard.save(&events).await?;
    drop(guard);

    tracing::info!(id = %id, date = %date, capacity, "Event created");
    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::EVENT_ADDED,
                format!("Event {} added", title),
            )
            .entity("Event", id.clone()),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Event created successfully",
            "event": {
                "id": id,
                "title": title,
                "time_12": time_12,
            },
        })),
    ))
}

/// Registers the calling student; identity always comes from the session.
pub async fn register_for_event(
    State(state): State<AppState>,
    Extension(session): Extension<SessionData>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if session.role != UserRole::Student {
        return Err(AppError::Forbidden(
            "Only students can register for events".into(),
        ));
    }

    let students = state.repos.students.read().await?;
    let (student_name, section) = match students.find_by_login(&session.username) {
        Some(student) => (student.student_name.clone(), student.section.clone()),
        None => (session.username.clone(), String::new()),
    };

    let guard = state.repos.events.lock().await;
    let mut events = guard.load().await?;
    let event = events.0.get_mut(&id).ok_or_else(event_not_found)?;
    event
        .register(Registration {
            username: session.username.clone(),
            student_name,
            section,
            registered_at: Utc::now(),
        })
        .map_err(|err| match err {
            RegistrationError::AlreadyRegistered | RegistrationError::EventFull => {
                AppError::Conflict(err.to_string())
            }
        })?;
    let title = event.title.clone();
    guard.save(&events).await?;
    drop(guard);

    state
        .audit
        .record(
            NewActivity::success(
                &session.username,
                actions::EVENT_REGISTERED,
                format!("Registered for event {}", title),
            )
            .entity("Event", id),
        )
        .await;

    Ok(Json(json!({ "message": "Successfully registered for event" })))
}

pub async fn event_registrations(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let events = state.repos.events.read().await?;
    let event = events.0.get(&id).ok_or_else(event_not_found)?;
    Ok(Json(json!({
        "registrations": event.registrations,
        "total": event.registrations.len(),
        "capacity": event.capacity,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_must_be_numeric_and_in_range() {
        assert_eq!(parse_capacity(" 50 ").unwrap(), 50);
        assert_eq!(parse_capacity("10000").unwrap(), 10_000);
        assert!(matches!(
            parse_capacity("0"),
            Err(AppError::BadRequest(msg)) if msg == "Capacity must be between 1 and 10000"
        ));
        assert!(matches!(
            parse_capacity("lots"),
            Err(AppError::BadRequest(msg)) if msg == "Capacity must be a number"
        ));
    }

    #[test]
    fn event_date_may_be_today_but_not_earlier() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();
        assert_eq!(parse_event_date("2026-05-10", today).unwrap(), today);
        assert!(parse_event_date("2026-05-09", today).is_err());
        assert!(matches!(
            parse_event_date("10/05/2026", today),
            Err(AppError::BadRequest(msg)) if msg == "Invalid date format"
        ));
    }
}
