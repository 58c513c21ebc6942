// Error taxonomy and the HTTP translation boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Every failure the API can report, tagged by kind. Handlers and the
/// domain layer return these; nothing business-level is allowed to
/// surface as an unstructured 500.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// Malformed input, rejected before it reaches business logic.
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation (username, email, team tag, odds pair).
    #[error("{0}")]
    Conflict(String),

    /// Referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Missing, malformed, expired or revoked credential.
    #[error("{0}")]
    Unauthorized(String),

    /// Login with a bad username/password pair. Deliberately does not
    /// say which of the two was wrong.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Authenticated but not entitled: wrong owner, or not an admin.
    #[error("{0}")]
    Forbidden(String),

    /// Well-formed request that violates a domain rule (betting on a
    /// live match, insufficient balance, team not in match, ...).
    #[error("{0}")]
    BusinessRule(String),

    /// Genuine infrastructure failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::BusinessRule(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::Conflict(_) => "conflict",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::BusinessRule(_) => "business_rule_violation",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal error");
        }
        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::BusinessRule("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_credentials_does_not_name_the_field() {
        let msg = ApiError::InvalidCredentials.to_string();
        assert!(!msg.contains("username only"));
        assert!(!msg.contains("password only"));
        assert_eq!(ApiError::InvalidCredentials.code(), "invalid_credentials");
    }
}
