//! Service-level handlers: landing route and the 404 fallback

use crate::response::Envelope;
use axum::extract::OriginalUri;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;

/// GET / - unconditional success, no side effects
pub async fn index() -> Response {
    Envelope::payload(true, 200, "nft market api", json!({})).output(StatusCode::OK)
}

/// Catch-all for unmatched routes
pub async fn route_not_found(OriginalUri(uri): OriginalUri) -> Response {
    let message = format!("No service is associated with the url => {uri}");
    tracing::error!("{message}");
    Envelope::not_found(message).output(StatusCode::NOT_FOUND)
}
