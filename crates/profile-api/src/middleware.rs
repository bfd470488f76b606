//! HTTP middleware: request context, trailing slash, rate limiting, auth
//!
//! Stages run in the order they are layered in `routes.rs`; each stage may end
//! the request with its own envelope, otherwise it calls through to the next.

use crate::auth::extract_bearer_token;
use crate::codes;
use crate::error::ApiError;
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Terminal states are mutually exclusive; the first one entered wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Active = 0,
    Completed = 1,
    TimedOut = 2,
    Closed = 3,
}

/// Per-request lifecycle state machine
#[derive(Debug)]
pub struct RequestLifecycle {
    state: AtomicU8,
}

impl RequestLifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Active as u8),
        }
    }

    /// Attempt a transition out of `Active`. Returns false if a terminal
    /// state was already entered; later attempts are no-ops.
    pub fn transition(&self, to: LifecycleState) -> bool {
        self.state
            .compare_exchange(
                LifecycleState::Active as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn state(&self) -> LifecycleState {
        match self.state.load(Ordering::Acquire) {
            1 => LifecycleState::Completed,
            2 => LifecycleState::TimedOut,
            3 => LifecycleState::Closed,
            _ => LifecycleState::Active,
        }
    }
}

impl Default for RequestLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Ephemeral per-request context, inserted as an extension
#[derive(Clone)]
pub struct RequestContext {
    /// Correlation id carried by every log line of this request
    pub request_id: String,
    pub lifecycle: Arc<RequestLifecycle>,
}

/// Logs "closed connection" when the request future is dropped before any
/// terminal state was entered, i.e. the client went away.
struct CloseGuard {
    lifecycle: Arc<RequestLifecycle>,
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        if self.lifecycle.transition(LifecycleState::Closed) {
            tracing::info!("closed connection");
        }
    }
}

/// Session/logging context: correlation id, lifecycle events, timeout.
///
/// On a configured timeout the inner future is dropped before the timeout
/// envelope is written, so the first write always wins.
pub async fn request_context_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let lifecycle = Arc::new(RequestLifecycle::new());
    request.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
        lifecycle: Arc::clone(&lifecycle),
    });

    let method = request.method().clone();
    let uri = request.uri().clone();
    let remote = client_addr(&request)
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let timeout = state.config.timeout;

    let span = tracing::info_span!("request", id = %request_id);
    async move {
        tracing::info!(%method, %remote, %uri, "started processing request");
        let start = Instant::now();
        let _close_guard = CloseGuard {
            lifecycle: Arc::clone(&lifecycle),
        };

        let response = match timeout {
            Some(limit) => match tokio::time::timeout(limit, next.run(request)).await {
                Ok(response) => response,
                Err(_) => {
                    if lifecycle.transition(LifecycleState::TimedOut) {
                        tracing::error!(%remote, %uri, "request timeout");
                    }
                    return Envelope::timeout(408, codes::table().message(408))
                        .output(StatusCode::REQUEST_TIMEOUT);
                }
            },
            None => next.run(request).await,
        };

        if lifecycle.transition(LifecycleState::Completed) {
            tracing::info!(
                %method,
                %remote,
                %uri,
                status = response.status().as_u16(),
                duration_ms = start.elapsed().as_millis() as u64,
                "finished processing request"
            );
        }
        response
    }
    .instrument(span)
    .await
}

/// Trailing slash is canonical: any non-root path without one is redirected
/// with a 307 preserving the query string. OPTIONS requests pass through so
/// CORS preflights are never bounced.
pub async fn trailing_slash_middleware(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        let path = request.uri().path();
        if path.len() > 1 && !path.ends_with('/') {
            let location = match request.uri().query() {
                Some(query) => format!("{path}/?{query}"),
                None => format!("{path}/"),
            };
            return Redirect::temporary(&location).into_response();
        }
    }
    next.run(request).await
}

/// Rate limiter type, keyed by client IP
pub type KeyedRateLimiter =
    RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Create a rate limiter allowing `max_requests` per `window` per client IP.
///
/// GCRA equivalent of a fixed window: a burst of `max_requests` replenishing
/// one permit per `window / max_requests`.
pub fn create_rate_limiter(max_requests: u32, window: Duration) -> Arc<KeyedRateLimiter> {
    let max = NonZeroU32::new(max_requests.max(1)).unwrap();
    let replenish = window / max.get();
    let quota = Quota::with_period(replenish)
        .unwrap_or_else(|| Quota::per_second(max))
        .allow_burst(max);
    Arc::new(RateLimiter::keyed(quota))
}

/// Rate limiting middleware; advisory, not a security boundary
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<KeyedRateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = client_addr(&request)
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if limiter.check_key(&ip).is_err() {
        return Err(ApiError::RateLimited);
    }

    Ok(next.run(request).await)
}

/// Authorization gate: resolves the bearer credential into an `Identity`
/// extension, or ends the request with a 401/403 envelope.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::MissingCredentials)?;

    let token = extract_bearer_token(header).ok_or(ApiError::MissingCredentials)?;
    let identity = state.identity.verify(token).await?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn client_addr(request: &Request) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_terminal_transition_wins() {
        let lifecycle = RequestLifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Active);

        assert!(lifecycle.transition(LifecycleState::TimedOut));
        assert!(!lifecycle.transition(LifecycleState::Completed));
        assert!(!lifecycle.transition(LifecycleState::Closed));
        assert_eq!(lifecycle.state(), LifecycleState::TimedOut);
    }

    #[test]
    fn test_rate_limiter_quota() {
        let limiter = create_rate_limiter(100, Duration::from_secs(15 * 60));
        let ip: IpAddr = "203.0.113.7".parse().unwrap();

        for _ in 0..100 {
            assert!(limiter.check_key(&ip).is_ok());
        }
        // The 101st request inside the window is rejected.
        assert!(limiter.check_key(&ip).is_err());

        // Other clients are unaffected.
        let other: IpAddr = "203.0.113.8".parse().unwrap();
        assert!(limiter.check_key(&other).is_ok());
    }
}
