//! Image Routes
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /upload | POST (multipart) | admin |
//! | /uploads/{*path} | GET | none |
//! | /delete_package_images | DELETE | admin |

mod handler;

use axum::extract::DefaultBodyLimit;
use axum::{Router, routing::delete, routing::get, routing::post};

use crate::core::ServerState;

/// Request body cap for one upload request
const MAX_UPLOAD_BODY: usize = 64 * 1024 * 1024;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/upload",
            post(handler::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY)),
        )
        .route("/uploads/{*path}", get(handler::serve_image))
        .route("/delete_package_images", delete(handler::delete_images))
}
