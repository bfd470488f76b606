//! # Profile API
//!
//! User profile API for the NFT market backend.
//!
//! This crate provides:
//! - **Profile endpoints**: `GET /user/` and `PUT /user/` backed by a relational table
//! - **Authorization**: bearer-token verification via a pluggable identity provider
//! - **Rate Limiting**: per-IP request throttling
//! - **Uniform envelopes**: every response body is `{success, code, message, data}`
//!
//! ## Request pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP Clients                      │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │  CORS │ Trailing Slash │ Request Context │ Limiter  │
//! ├─────────────────────────────────────────────────────┤
//! │        Authorization Gate │ Validation Gate          │
//! ├─────────────────────────────────────────────────────┤
//! │      Route Handlers (GET /, GET /user, PUT /user)    │
//! ├─────────────────────────────────────────────────────┤
//! │           UserStore (MySQL or in-memory)             │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Every stage may terminate the request early, and every early exit goes
//! through the same envelope builder, so clients always see the same body
//! shape regardless of which stage answered.

pub mod auth;
pub mod codes;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;
pub mod validate;

pub use config::{DatabaseConfig, ServiceConfig};
pub use error::ApiError;
pub use response::Envelope;
pub use server::{run_server, run_server_with_shutdown};
pub use state::AppState;
