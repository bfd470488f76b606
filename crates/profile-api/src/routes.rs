//! HTTP route definitions
//!
//! Layer order matters: requests flow CORS -> trailing slash -> request
//! context -> rate limiter -> (auth ->) handler, and unmatched routes fall
//! through to the 404 envelope.

use crate::{handlers, middleware, AppState};
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderName, Method};
use axum::middleware as axum_middleware;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    let rate_limiter = middleware::create_rate_limiter(
        state.config.rate_limit_max,
        state.config.rate_limit_window,
    );

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            ORIGIN,
            HeaderName::from_static("x-requested-with"),
            CONTENT_TYPE,
            ACCEPT,
            AUTHORIZATION,
            HeaderName::from_static("uuid"),
        ]);

    // Profile routes sit behind the authorization gate
    let user_routes = Router::new()
        .route(
            "/user/",
            get(handlers::get_user).put(handlers::update_user),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::index))
        .merge(user_routes)
        .fallback(handlers::route_not_found)
        // Unregistered methods on known paths get the same 404 envelope.
        .method_not_allowed_fallback(handlers::route_not_found)
        // Innermost layer runs last; requests pass the layers bottom-up.
        .layer(axum_middleware::from_fn_with_state(
            rate_limiter,
            middleware::rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::request_context_middleware,
        ))
        .layer(axum_middleware::from_fn(
            middleware::trailing_slash_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
