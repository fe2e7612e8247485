//! Authentication Routes
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /login | POST | none |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/login", post(handler::login))
}
