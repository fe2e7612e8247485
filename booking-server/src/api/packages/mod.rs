//! Package Routes
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /upsert_package | POST | admin |
//! | /delete_package | POST | admin |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/upsert_package", post(handler::upsert_package))
        .route("/delete_package", post(handler::delete_package))
}
