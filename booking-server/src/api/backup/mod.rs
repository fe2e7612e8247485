//! Backup Routes (admin only)
//!
//! | Path | Method |
//! |------|--------|
//! | /admin/backup/{table} | POST |
//! | /admin/backups | GET |
//! | /admin/restore | POST |

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/admin/backup/{table}", post(handler::backup))
        .route("/admin/backups", get(handler::list))
        .route("/admin/restore", post(handler::restore))
}
