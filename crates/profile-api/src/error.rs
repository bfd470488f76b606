//! Error taxonomy and envelope mapping
//!
//! Every error the pipeline can produce renders as the uniform envelope. The
//! [`IntoResponse`] impl is the global translator: whichever stage fails, the
//! client still receives `{success, code, message, data}` and internal detail
//! stays in the log.

use crate::codes;
use crate::response::Envelope;
use crate::validate::FieldError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Request-terminating error
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable bearer credential in the request
    #[error("authorization credentials are missing")]
    MissingCredentials,

    /// Credential presented but rejected by the identity provider
    #[error("credential rejected: {0}")]
    InvalidCredentials(String),

    /// One or more body fields failed validation
    #[error("request validation failed")]
    Validation(Vec<FieldError>),

    /// Client exceeded its per-IP quota
    #[error("rate limit exceeded")]
    RateLimited,

    /// Store failures and anything else unexpected; detail is logged, never
    /// sent to the client
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Wrap a lower-level failure with handler context
    pub fn internal(err: impl Into<anyhow::Error>, context: &'static str) -> Self {
        Self::Internal(err.into().context(context))
    }

    /// Numeric body code for this error
    pub fn code(&self) -> u16 {
        match self {
            Self::MissingCredentials => 401,
            Self::InvalidCredentials(_) => 403,
            Self::Validation(_) => 400,
            Self::RateLimited => 429,
            Self::Internal(_) => 500,
        }
    }

    /// HTTP status for this error.
    ///
    /// Validation failures ship inside HTTP 200; clients branch on the body
    /// `code`, not the HTTP status.
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials => StatusCode::UNAUTHORIZED,
            Self::InvalidCredentials(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::OK,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let status = self.http_status();

        let data = match &self {
            Self::Validation(errors) => json!({ "errors": errors }),
            _ => json!({}),
        };

        if let Self::Internal(err) = &self {
            tracing::error!(error = ?err, "request failed");
        }

        Envelope::payload(false, code, codes::table().message(code), data).output(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_mapping() {
        assert_eq!(ApiError::MissingCredentials.code(), 401);
        assert_eq!(ApiError::InvalidCredentials("bad".into()).code(), 403);
        assert_eq!(ApiError::Validation(vec![]).code(), 400);
        assert_eq!(ApiError::RateLimited.code(), 429);
        assert_eq!(ApiError::Internal(anyhow::anyhow!("boom")).code(), 500);
    }

    #[test]
    fn test_validation_ships_inside_http_200() {
        assert_eq!(ApiError::Validation(vec![]).http_status(), StatusCode::OK);
    }

    #[test]
    fn test_internal_detail_never_reaches_the_body() {
        let err = ApiError::internal(anyhow::anyhow!("password=hunter2"), "error updating user");
        let code = err.code();
        let message = codes::table().message(code).to_string();
        assert_eq!(message, "Internal server error");
        assert!(!message.contains("hunter2"));
    }
}
