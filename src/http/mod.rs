//! HTTP layer: axum routers for the two services.
//!
//! Handlers are thin. They hand store and model work to the blocking pool
//! and map [`HealthdeskError`] onto status codes. Validation and lookup
//! failures carry a descriptive message; storage and model failures are
//! logged here and answered with a generic message.

pub mod prediction;
pub mod records;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::HealthdeskError;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error response: `{"<field>": "<message>"}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    field: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            field: "detail",
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    /// Status code this error responds with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<HealthdeskError> for ApiError {
    fn from(err: HealthdeskError) -> Self {
        match err {
            HealthdeskError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Patient not found"),
            HealthdeskError::Conflict(_) => Self::new(
                StatusCode::BAD_REQUEST,
                "Patient with this ID already exists",
            ),
            HealthdeskError::Validation(errors) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, errors.join("; "))
            }
            HealthdeskError::InvalidArgument(message) => {
                Self::new(StatusCode::BAD_REQUEST, message)
            }
            HealthdeskError::Prediction(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                field: "error",
                message: "Prediction failed".to_string(),
            },
            other => {
                tracing::error!("Request failed: {}", other);
                Self::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ self.field: self.message }));
        (self.status, body).into_response()
    }
}

/// Run synchronous service work on the blocking pool.
pub(crate) async fn run_blocking<T, F>(task: F) -> ApiResult<T>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            tracing::error!("Blocking task failed: {}", e);
            Err(ApiError::internal())
        }
    }
}

/// `{"message": ...}` body used by informational and mutation responses.
pub(crate) fn message(text: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": text }))
}
