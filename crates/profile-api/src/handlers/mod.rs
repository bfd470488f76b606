//! Route handlers

pub mod service;
pub mod user;

pub use service::{index, route_not_found};
pub use user::{get_user, update_user};
