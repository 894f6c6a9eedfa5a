use axum::extract::State;

use crate::{
    error::AppError,
    handlers::extract::{Json, Query},
    models::{
        audit_log::{ActivityQuery, ActivityRecord},
        ListResponse,
    },
    state::AppState,
};

/// Most recent activities first; `limit` defaults to 100.
pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ListResponse<ActivityRecord>>, AppError> {
    let records = state.audit.query(&query).await?;
    Ok(Json(ListResponse::new(records)))
}
