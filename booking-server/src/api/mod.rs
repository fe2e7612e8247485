//! HTTP API
//!
//! # Structure
//!
//! - [`health`] - liveness probe
//! - [`auth`] - login
//! - [`query`] - named read operations
//! - [`users`] - signup, profile, password
//! - [`bookings`] - cart entries and booking status, allow-listed deletes
//! - [`orders`] - checkout and payment gateway orders
//! - [`packages`] - package upsert and delete
//! - [`images`] - package image upload, download and delete
//! - [`backup`] - admin table backup and restore
//!
//! Every handler returns the [`ApiResponse`] envelope on success and an
//! [`AppError`] otherwise.

pub mod convert;

pub mod auth;
pub mod backup;
pub mod bookings;
pub mod health;
pub mod images;
pub mod orders;
pub mod packages;
pub mod query;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{Json, Router};

use crate::core::ServerState;
use shared::error::{ApiResponse, AppError};

/// Handler result carrying the success envelope
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// All routes, bound to `state`
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(query::router())
        .merge(users::router())
        .merge(bookings::router())
        .merge(orders::router())
        .merge(packages::router())
        .merge(images::router())
        .merge(backup::router())
        .with_state(state)
}
