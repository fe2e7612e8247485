//! Data models
//!
//! Shared between the server and the frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Generated IDs are `i64` (SQLite INTEGER PRIMARY KEY); users are keyed by email.

pub mod booking;
pub mod category;
pub mod image;
pub mod location;
pub mod order;
pub mod package;
pub mod user;

// Re-exports
pub use booking::*;
pub use category::*;
pub use image::*;
pub use location::*;
pub use order::*;
pub use package::*;
pub use user::*;
