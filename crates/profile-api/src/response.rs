//! Uniform response envelope
//!
//! Every response this service emits, success or failure, is the same JSON
//! object: `{success, code, message, data}`. All stages of the pipeline end a
//! request by building an [`Envelope`] and calling [`Envelope::output`], so no
//! path can produce a differently shaped body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Uniform response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub code: u16,
    pub message: String,
    pub data: Value,
}

impl Envelope {
    /// Build an envelope
    pub fn payload(success: bool, code: u16, message: impl Into<String>, data: Value) -> Self {
        Self {
            success,
            code,
            message: message.into(),
            data,
        }
    }

    /// Envelope for a timed-out request
    pub fn timeout(code: u16, message: impl Into<String>) -> Self {
        Self::payload(false, code, message, json!({}))
    }

    /// Envelope for an unmatched route
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::payload(false, 404, message, json!({}))
    }

    /// Serialize and send with the given HTTP status.
    ///
    /// This is the single path by which a request ends; the content type is
    /// always `application/json`.
    pub fn output(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}
