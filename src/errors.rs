use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use tracing::error;

use crate::integrations::IntegrationError;
use crate::services::admin_tasks::TaskError;
use crate::services::batch::BatchError;
use crate::services::resolver::ResolveError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
    #[error("{0}")]
    BadRequest(String),
    #[error("Authentication required: {0}")]
    Unauthorized(String),
    #[error("Forbidden")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("{0} is not configured")]
    ServiceUnavailable(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl ApiError {
    /// Classifies a repository error, surfacing constraint violations and
    /// missing rows as client errors instead of a blanket 500
    pub fn from_repo(err: anyhow::Error, what: &str) -> Self {
        match err.downcast_ref::<DieselError>() {
            Some(DieselError::NotFound) => ApiError::NotFound(what.to_string()),
            Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                ApiError::Conflict(format!("{} already exists", what))
            }
            Some(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
                ApiError::NotFound(format!("{} reference", what))
            }
            _ => ApiError::Database(err),
        }
    }
}

impl From<IntegrationError> for ApiError {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::NotConfigured(service) => ApiError::ServiceUnavailable(service.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<BatchError> for ApiError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Invalid(msg) => ApiError::BadRequest(msg),
            BatchError::Provider(err) => err.into(),
            BatchError::Store(err) => ApiError::from_repo(err, "Batch job"),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::UnknownTask(key) => ApiError::NotFound(format!("Task {}", key)),
            TaskError::AdminOnly(_) => ApiError::Forbidden,
            TaskError::InvalidParam { .. } | TaskError::UnknownParam(_) => ApiError::BadRequest(err.to_string()),
            TaskError::Store(err) => ApiError::Database(err),
            TaskError::Batch(err) => err.into(),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Database(err) => {
                error!("Database error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string()),
            ApiError::ServiceUnavailable(service) => {
                (StatusCode::SERVICE_UNAVAILABLE, format!("{} is not configured", service))
            }
            ApiError::Upstream(msg) => {
                error!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Upstream service error".to_string())
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Parses a numeric path identifier, rejecting anything else with a 400
pub fn parse_id(raw: &str, what: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid {} id: {}", what, raw)))
}
