//! Utilities: logging setup and request validation

pub mod logger;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};

/// Wrap `data` in the success envelope
pub fn ok<T: serde::Serialize>(data: T) -> axum::Json<ApiResponse<T>> {
    axum::Json(ApiResponse::success(data))
}
