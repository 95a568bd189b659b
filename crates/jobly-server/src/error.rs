//! API error type and its JSON rendering.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jobly::JoblyError;
use serde_json::json;

use crate::auth::JwtError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized("Unauthorized".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JoblyError> for ApiError {
    fn from(err: JoblyError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err.to_string())
        } else if err.is_bad_request() {
            Self::BadRequest(err.to_string())
        } else {
            tracing::error!(error = %err, "request failed");
            Self::Internal
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Encode(_) => {
                tracing::error!(error = %err, "token signing failed");
                Self::Internal
            }
            _ => Self::unauthorized(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "error": {
                "message": self.to_string(),
                "status": status.as_u16(),
            }
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_errors_map_to_status() {
        assert_eq!(
            ApiError::from(JoblyError::EmptyPayload).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(JoblyError::not_found("No job: 1")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(JoblyError::Connection("refused".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = ApiError::from(JoblyError::Connection("password=hunter2".into()));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
