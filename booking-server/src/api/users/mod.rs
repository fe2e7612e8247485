//! User Routes
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /create_user | POST | none |
//! | /update_user | POST | self or admin |
//! | /change_password | POST | self or admin |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/create_user", post(handler::create_user))
        .route("/update_user", post(handler::update_user))
        .route("/change_password", post(handler::change_password))
}
