//! Location Repository

use crate::db::{RepoError, RepoResult};
use shared::models::Location;
use sqlx::SqlitePool;

pub async fn find_by_id(pool: &SqlitePool, location_id: i64) -> RepoResult<Option<Location>> {
    let location = sqlx::query_as::<_, Location>(
        "SELECT location_id, country, city, image_path FROM Locations WHERE location_id = ?",
    )
    .bind(location_id)
    .fetch_optional(pool)
    .await?;
    Ok(location)
}

/// Delete a location; packages still pointing at it block the delete
pub async fn delete(pool: &SqlitePool, location_id: i64) -> RepoResult<()> {
    let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Packages WHERE location_id = ?")
        .bind(location_id)
        .fetch_one(pool)
        .await?;
    if in_use > 0 {
        return Err(RepoError::Constraint(format!(
            "location {location_id} is used by {in_use} package(s)"
        )));
    }

    let result = sqlx::query("DELETE FROM Locations WHERE location_id = ?")
        .bind(location_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("location {location_id}")));
    }
    Ok(())
}
