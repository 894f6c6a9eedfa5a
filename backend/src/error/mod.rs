use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::{db::StoreError, services::timetable::TimetableError};

pub const SCHEDULE_CLASH_CODE: &str = "TT_CLASH_001";
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Detail of an unexpected failure, carried on the response so the boundary
/// middleware can record it without exposing it to the caller.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    BadRequest(String),
    ScheduleClash {
        conflicting_class: String,
        conflicting_time: String,
    },
    InternalServerError(anyhow::Error),
    Validation(Vec<String>),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) | AppError::ScheduleClash { .. } => StatusCode::CONFLICT,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut internal_detail = None;
        let (error_message, code, details) = match self {
            AppError::NotFound(msg) => (msg, "NOT_FOUND".to_string(), None),
            AppError::Unauthorized(msg) => (msg, "UNAUTHORIZED".to_string(), None),
            AppError::Forbidden(msg) => (msg, "FORBIDDEN".to_string(), None),
            AppError::Conflict(msg) => (msg, "CONFLICT".to_string(), None),
            AppError::BadRequest(msg) => (msg, "BAD_REQUEST".to_string(), None),
            AppError::ScheduleClash {
                conflicting_class,
                conflicting_time,
            } => (
                format!(
                    "Time clash detected! {} is scheduled from {}",
                    conflicting_class, conflicting_time
                ),
                "SCHEDULE_CLASH".to_string(),
                Some(serde_json::json!({
                    "error_code": SCHEDULE_CLASH_CODE,
                    "conflicting_class": conflicting_class,
                    "conflicting_time": conflicting_time,
                })),
            ),
            AppError::InternalServerError(err) => {
                tracing::error!("Internal server error: {:?}", err);
                internal_detail = Some(InternalErrorDetail(format!("{:#}", err)));
                (
                    INTERNAL_ERROR_MESSAGE.to_string(),
                    "INTERNAL_SERVER_ERROR".to_string(),
                    None,
                )
            }
            AppError::Validation(errors) => (
                "Validation failed".to_string(),
                "VALIDATION_ERROR".to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code,
            details,
        });

        let mut response = (status, body).into_response();
        if let Some(detail) = internal_detail {
            response.extensions_mut().insert(detail);
        }
        response
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::InternalServerError(err.into())
    }
}

impl From<TimetableError> for AppError {
    fn from(err: TimetableError) -> Self {
        match err {
            TimetableError::NotFound(_) => AppError::NotFound(err.to_string()),
            TimetableError::ScheduleClash {
                conflicting_class,
                conflicting_time,
            } => AppError::ScheduleClash {
                conflicting_class,
                conflicting_time,
            },
            TimetableError::InvalidDay(_)
            | TimetableError::InvalidInterval
            | TimetableError::InvalidTime(_)
            | TimetableError::MissingFields => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn app_error_into_response_maps_status_and_body() {
        let response = AppError::BadRequest("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"], "bad");
        assert_eq!(json["code"], "BAD_REQUEST");

        let response = AppError::Unauthorized("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = response_json(response).await;
        assert_eq!(json["code"], "UNAUTHORIZED");

        let response = AppError::Forbidden("denied".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = response_json(response).await;
        assert_eq!(json["code"], "FORBIDDEN");

        let response = AppError::NotFound("missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = response_json(response).await;
        assert_eq!(json["error"], "missing");
    }

    #[tokio::test]
    async fn schedule_clash_carries_conflict_details() {
        let response = AppError::ScheduleClash {
            conflicting_class: "Physics".to_string(),
            conflicting_time: "9:00 AM - 10:00 AM".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = response_json(response).await;
        assert_eq!(json["code"], "SCHEDULE_CLASH");
        assert_eq!(json["details"]["error_code"], SCHEDULE_CLASH_CODE);
        assert_eq!(json["details"]["conflicting_class"], "Physics");
        assert_eq!(json["details"]["conflicting_time"], "9:00 AM - 10:00 AM");
    }

    #[tokio::test]
    async fn app_error_internal_maps_to_generic_message() {
        let response = AppError::InternalServerError(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response
            .extensions()
            .get::<InternalErrorDetail>()
            .cloned()
            .expect("detail extension");
        assert_eq!(detail.0, "boom");
        let json = response_json(response).await;
        assert_eq!(json["code"], "INTERNAL_SERVER_ERROR");
        assert!(json["details"].is_null());
    }

    #[test]
    fn timetable_errors_map_onto_http_taxonomy() {
        assert_eq!(
            AppError::from(TimetableError::InvalidInterval).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(TimetableError::NotFound("TT_1".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(TimetableError::ScheduleClash {
                conflicting_class: "Math".into(),
                conflicting_time: "9:00 AM - 10:00 AM".into(),
            })
            .status(),
            StatusCode::CONFLICT
        );
    }
}
