//! Package Repository

use super::category::sync_package_categories;
use crate::db::{Record, RepoError, RepoResult, Table, Value, upsert_in};
use shared::models::{CategorySync, Package};
use sqlx::SqlitePool;

/// Validated package write; `package_id: None` creates a new package
#[derive(Debug, Clone, Default)]
pub struct PackageFields {
    pub package_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub location_id: Option<i64>,
    pub duration: Option<i64>,
    pub price: Option<f64>,
}

/// Outcome of a package save
#[derive(Debug, Clone, PartialEq)]
pub struct SavedPackage {
    pub package_id: i64,
    pub created: bool,
    pub categories: CategorySync,
}

pub async fn find_by_id(pool: &SqlitePool, package_id: i64) -> RepoResult<Option<Package>> {
    let package = sqlx::query_as::<_, Package>(
        "SELECT package_id, location_id, name, description, duration, price \
         FROM Packages WHERE package_id = ?",
    )
    .bind(package_id)
    .fetch_optional(pool)
    .await?;
    Ok(package)
}

/// Create or update a package and reconcile its categories in one transaction.
///
/// `categories: None` keeps the existing links untouched.
pub async fn save(
    pool: &SqlitePool,
    fields: PackageFields,
    categories: Option<&[String]>,
) -> RepoResult<SavedPackage> {
    let mut tx = pool.begin().await?;

    if let Some(id) = fields.package_id {
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM Packages WHERE package_id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(RepoError::NotFound(format!("package {id}")));
        }
    }

    let record = Record::new()
        .with("package_id", Value::from(fields.package_id))
        .with_opt("name", fields.name)
        .with_opt("description", fields.description)
        .with_opt("location_id", fields.location_id)
        .with_opt("duration", fields.duration)
        .with_opt("price", fields.price);
    let outcome = upsert_in(&mut tx, Table::Packages, record).await?;
    let package_id = outcome
        .id()
        .ok_or_else(|| RepoError::Consistency("package key is not an integer".into()))?;

    let categories = match categories {
        Some(names) => sync_package_categories(&mut tx, package_id, names, outcome.inserted).await?,
        None => CategorySync::default(),
    };

    tx.commit().await?;
    tracing::info!(package_id, created = outcome.inserted, "Package saved");
    Ok(SavedPackage {
        package_id,
        created: outcome.inserted,
        categories,
    })
}

/// Delete a package with its category links and image rows.
///
/// Returns the stored image paths so the caller can remove the files once
/// the rows are gone. A package with bookings cannot be deleted.
pub async fn delete(pool: &SqlitePool, package_id: i64) -> RepoResult<Vec<String>> {
    let mut tx = pool.begin().await?;

    let bookings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Bookings WHERE package_id = ?")
        .bind(package_id)
        .fetch_one(&mut *tx)
        .await?;
    if bookings > 0 {
        return Err(RepoError::Constraint(format!(
            "package {package_id} has {bookings} booking(s)"
        )));
    }

    let image_paths: Vec<String> =
        sqlx::query_scalar("SELECT image_path FROM PackageImages WHERE package_id = ? ORDER BY image_id")
            .bind(package_id)
            .fetch_all(&mut *tx)
            .await?;

    sqlx::query("DELETE FROM PackageCategory WHERE package_id = ?")
        .bind(package_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM PackageImages WHERE package_id = ?")
        .bind(package_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM Packages WHERE package_id = ?")
        .bind(package_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("package {package_id}")));
    }

    tx.commit().await?;
    tracing::info!(package_id, images = image_paths.len(), "Package deleted");
    Ok(image_paths)
}
