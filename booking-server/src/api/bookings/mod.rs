//! Booking Routes
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /update_booking | POST | owner or admin |
//! | /delete_entry | DELETE | owner (cart) or admin (catalog) |

mod handler;

use axum::{Router, routing::delete, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/update_booking", post(handler::update_booking))
        .route("/delete_entry", delete(handler::delete_entry))
}
