use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("{0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error("index {index} is out of range for {kind} (length {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: i64,
        len: usize,
    },
    #[error("trip {id} was modified concurrently (expected version {expected}, found {actual})")]
    Conflict {
        id: String,
        expected: u64,
        actual: u64,
    },
    #[error("no route available (upstream status {status})")]
    RouteUnavailable { status: String },
    #[error("upstream service rate limited the request")]
    UpstreamRateLimited,
    #[error("upstream service failed: {0}")]
    Upstream(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Json(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::IndexOutOfRange { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::RouteUnavailable { .. } | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    /// Short machine-readable code used as the `error` field of the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Json(_)
            | AppError::Other(_) => "InternalError",
            AppError::Validation(_) => "ValidationError",
            AppError::NotFound => "NotFound",
            AppError::IndexOutOfRange { .. } => "IndexOutOfRange",
            AppError::Conflict { .. } => "Conflict",
            AppError::RouteUnavailable { .. } => "RouteUnavailable",
            AppError::UpstreamRateLimited => "UpstreamRateLimited",
            AppError::Upstream(_) => "UpstreamError",
            AppError::Unauthorized => "Unauthorized",
            AppError::Forbidden => "Forbidden",
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }

        let body = match &self {
            AppError::NotFound | AppError::Unauthorized | AppError::Forbidden => {
                json!({ "error": self.code() })
            }
            AppError::RouteUnavailable { status: upstream } => json!({
                "error": self.code(),
                "message": self.to_string(),
                "upstreamStatus": upstream,
            }),
            _ => json!({ "error": self.code(), "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
