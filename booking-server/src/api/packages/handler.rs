//! Package Handlers

use axum::{Json, extract::State};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{CategorySync, PackageDelete, PackageUpsert};

use crate::api::ApiResult;
use crate::api::convert::not_found_as;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::RepoError;
use crate::db::repository::package::{self, PackageFields};
use crate::db::repository::location;
use crate::storage::FileCleanup;
use crate::utils::ok;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_positive, validate_required_text,
};

#[derive(Debug, Serialize)]
pub struct PackageSaved {
    pub package_id: i64,
    pub created: bool,
    pub categories: CategorySync,
}

#[derive(Debug, Serialize)]
pub struct PackageDeleted {
    pub package_id: i64,
    #[serde(flatten)]
    pub files: FileCleanup,
}

fn validate_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::with_message(ErrorCode::ValueOutOfRange, "price must be zero or more")
            .with_detail("field", "price"));
    }
    Ok(())
}

/// Create (`package_id` absent or `"new"`) or update a package and, when
/// `categories` is sent, reconcile its links to exactly those names
pub async fn upsert_package(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<PackageUpsert>,
) -> ApiResult<PackageSaved> {
    current.require_admin()?;

    let package_id = match &req.package_id {
        Some(key) => key.existing().map_err(|label| {
            AppError::validation(format!("package_id must be \"new\" or an integer, got {label:?}"))
        })?,
        None => None,
    };

    if package_id.is_none() {
        validate_required_text(req.name.as_deref().unwrap_or_default(), "name", MAX_NAME_LEN)?;
        if req.duration.is_none() {
            return Err(AppError::required("duration"));
        }
        if req.price.is_none() {
            return Err(AppError::required("price"));
        }
    } else if let Some(name) = req.name.as_deref() {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&req.description, "description", MAX_NOTE_LEN)?;
    if let Some(duration) = req.duration {
        validate_positive(duration, "duration")?;
    }
    if let Some(price) = req.price {
        validate_price(price)?;
    }
    if let Some(location_id) = req.location_id
        && location::find_by_id(&state.pool, location_id).await?.is_none()
    {
        return Err(AppError::with_message(
            ErrorCode::LocationNotFound,
            format!("Location {location_id} not found"),
        ));
    }

    let categories: Option<Vec<String>> = req.categories.map(|names| {
        names
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    });

    let fields = PackageFields {
        package_id,
        name: req.name.map(|n| n.trim().to_string()),
        description: req.description,
        location_id: req.location_id,
        duration: req.duration,
        price: req.price,
    };
    let saved = package::save(&state.pool, fields, categories.as_deref())
        .await
        .map_err(not_found_as(ErrorCode::PackageNotFound))?;

    tracing::info!(
        package_id = saved.package_id,
        created = saved.created,
        added = ?saved.categories.added,
        removed = ?saved.categories.removed,
        by = %current.email,
        "Package upserted"
    );
    Ok(ok(PackageSaved {
        package_id: saved.package_id,
        created: saved.created,
        categories: saved.categories,
    }))
}

/// Delete a package without bookings, then its image files
pub async fn delete_package(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<PackageDelete>,
) -> ApiResult<PackageDeleted> {
    current.require_admin()?;
    let package_id = req.package_id;

    let image_paths = package::delete(&state.pool, package_id)
        .await
        .map_err(|e| match e {
            RepoError::Constraint(msg) => AppError::with_message(ErrorCode::PackageHasBookings, msg),
            other => not_found_as(ErrorCode::PackageNotFound)(other),
        })?;

    // rows are gone; file removal is best effort
    let files = state.images.remove_all(&image_paths).await;

    tracing::info!(package_id, by = %current.email, "Package deleted");
    Ok(ok(PackageDeleted { package_id, files }))
}
