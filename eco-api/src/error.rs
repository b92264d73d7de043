use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use eco_order::OrderError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    UnavailableError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::UnavailableError(msg) => {
                tracing::error!("Upstream unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let msg = err.to_string();
        match err {
            OrderError::Validation(_)
            | OrderError::InvalidProductIds(_)
            | OrderError::UnknownStatus(_) => AppError::ValidationError(msg),
            OrderError::NotFound(_) => AppError::NotFoundError(msg),
            OrderError::InvalidTransition { .. } | OrderError::ConcurrentModification(_) => {
                AppError::ConflictError(msg)
            }
            OrderError::Unavailable(_) => AppError::UnavailableError(msg),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
