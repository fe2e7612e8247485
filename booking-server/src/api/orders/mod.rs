//! Order Routes
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /update-orders | POST | cart owner or admin |
//! | /orders/create | POST | authenticated |
//! | /orders/{order_id}/capture | POST | authenticated |
//!
//! The server computes the amount and creates a gateway order the buyer
//! approves in the browser. Capturing it may carry the cart, in which case
//! the paid order is recorded in the same request.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/update-orders", post(handler::checkout))
        .route("/orders/create", post(handler::create_payment_order))
        .route("/orders/{order_id}/capture", post(handler::capture_payment_order))
}
