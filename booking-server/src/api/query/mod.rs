//! Named Read Operations
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /fetch_query | POST | optional; per operation |
//!
//! Catalog operations are public. Operations scoped to one account need that
//! account or an admin; whole-table listings of non-catalog tables need an
//! admin.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/fetch_query", post(handler::fetch_query))
}
