//! API error taxonomy.
//!
//! Every variant renders the same JSON envelope `{message, status, code}`.
//! Store failures are logged server-side and reported with a generic message.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid room PIN.")]
    InvalidPin,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Expired(String),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) | ApiError::Forbidden(_) | ApiError::InvalidPin => {
                StatusCode::FORBIDDEN
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Expired(_) => StatusCode::GONE,
            ApiError::Persistence(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn authentication_failed() -> Self {
        ApiError::Authentication("Authentication Failed.".into())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub message: String,
    pub status: &'static str,
    pub code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::Persistence(err) => {
                tracing::error!(error = %err, "store operation failed");
                "There was an error while processing the request, please try again.".to_string()
            }
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                "Unknown error occurred.".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorEnvelope {
            message,
            status: "error",
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Persistence(format!("{e:#}"))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        ApiError::BadRequest(r.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self {
        ApiError::BadRequest(r.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(r: PathRejection) -> Self {
        ApiError::BadRequest(r.body_text())
    }
}

pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("Could not find this route.".into())
}

pub type ApiResult<T> = Result<T, ApiError>;
