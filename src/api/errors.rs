#[cfg(feature = "ssr")]
use crate::error::AppError;
#[cfg(feature = "ssr")]
use axum::http::StatusCode;
#[cfg(feature = "ssr")]
use axum::response::{IntoResponse, Response};

/// Converts AppError into HTTP responses.
///
/// Validation failures (including unknown scopes) become 422 with the
/// offending field, an unreachable store becomes a retryable 503.
#[cfg(feature = "ssr")]
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation { .. } | AppError::UnknownScope(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let mut body = serde_json::json!({
            "error": self.to_string()
        });
        if let Some(field) = self.field() {
            body["field"] = serde_json::Value::from(field);
        }
        if self.is_retryable() {
            body["retryable"] = serde_json::Value::Bool(true);
        }

        (status, axum::Json(body)).into_response()
    }
}
