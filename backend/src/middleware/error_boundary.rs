//! Last line of defence for unexpected failures.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::any::Any;

use crate::{
    error::{AppError, ErrorResponse, InternalErrorDetail, INTERNAL_ERROR_MESSAGE},
    models::audit_log::{ActivityStatus, NewActivity},
    services::audit_log::{actions, SYSTEM_ACTOR},
    state::AppState,
};

/// Records internal errors in the activity trail under the `SYSTEM` actor. Outside
/// production mode the failure detail is also returned to the caller.
pub async fn error_boundary(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    let Some(InternalErrorDetail(detail)) = response.extensions().get::<InternalErrorDetail>().cloned()
    else {
        return response;
    };

    state
        .audit
        .record(
            NewActivity::success(
                SYSTEM_ACTOR,
                actions::ERROR_EXCEPTION,
                format!("Unhandled exception: {}", detail),
            )
            .entity_type("System")
            .status(ActivityStatus::Error),
        )
        .await;

    if state.config.production_mode {
        return response;
    }

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: INTERNAL_ERROR_MESSAGE.to_string(),
            code: "INTERNAL_SERVER_ERROR".to_string(),
            details: Some(json!({ "exception": detail })),
        }),
    )
        .into_response()
}

/// Turns a handler panic into the standard internal error response.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    AppError::InternalServerError(anyhow::anyhow!("panic: {}", message)).into_response()
}
