//! Shared types for the booking backend
//!
//! Error codes, the API response envelope and the entity models used by the
//! server and its clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
