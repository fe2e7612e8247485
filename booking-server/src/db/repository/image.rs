//! Package Image Repository
//!
//! Rows only; the files live under the upload root and are handled by
//! [`crate::storage`].

use crate::db::{RepoError, RepoResult};
use shared::models::PackageImage;
use sqlx::{SqliteConnection, SqlitePool};

/// Relative path of an image file, derived from its row id
pub fn image_path(image_id: i64, extension: &str) -> String {
    format!("package_images/{image_id}.{extension}")
}

/// Insert an image row for `package_id` and assign its final path.
///
/// Runs on the caller's transaction so the row disappears if writing the
/// file fails afterwards.
pub async fn insert(conn: &mut SqliteConnection, package_id: i64, extension: &str) -> RepoResult<PackageImage> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM Packages WHERE package_id = ?")
        .bind(package_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(RepoError::NotFound(format!("package {package_id}")));
    }

    let image_id: i64 = sqlx::query_scalar(
        "INSERT INTO PackageImages (package_id, image_path) VALUES (?, '') RETURNING image_id",
    )
    .bind(package_id)
    .fetch_one(&mut *conn)
    .await?;

    let path = image_path(image_id, extension);
    sqlx::query("UPDATE PackageImages SET image_path = ? WHERE image_id = ?")
        .bind(&path)
        .bind(image_id)
        .execute(&mut *conn)
        .await?;

    Ok(PackageImage {
        image_id,
        package_id,
        image_path: path,
    })
}

pub async fn find_many(pool: &SqlitePool, image_ids: &[i64]) -> RepoResult<Vec<PackageImage>> {
    if image_ids.is_empty() {
        return Ok(vec![]);
    }
    let placeholders = image_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let sql = format!(
        "SELECT image_id, package_id, image_path FROM PackageImages \
         WHERE image_id IN ({placeholders}) ORDER BY image_id"
    );
    let mut query = sqlx::query_as::<_, PackageImage>(&sql);
    for id in image_ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(pool).await?)
}

/// Delete image rows; returns the rows that existed
pub async fn delete_many(pool: &SqlitePool, image_ids: &[i64]) -> RepoResult<Vec<PackageImage>> {
    let images = find_many(pool, image_ids).await?;
    if images.is_empty() {
        return Ok(images);
    }

    let mut tx = pool.begin().await?;
    for image in &images {
        sqlx::query("DELETE FROM PackageImages WHERE image_id = ?")
            .bind(image.image_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn seed(pool: &SqlitePool) {
        sqlx::query("INSERT INTO Packages (package_id, name, duration, price) VALUES (1, 'Alps', 5, 100.0)")
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_assigns_path_from_id() {
        let pool = test_pool().await;
        seed(&pool).await;
        let mut tx = pool.begin().await.unwrap();

        let first = insert(&mut tx, 1, "jpg").await.unwrap();
        let second = insert(&mut tx, 1, "jpg").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(first.image_path, format!("package_images/{}.jpg", first.image_id));
        assert_ne!(first.image_id, second.image_id);
        let stored = find_many(&pool, &[first.image_id]).await.unwrap();
        assert_eq!(stored[0].image_path, first.image_path);
    }

    #[tokio::test]
    async fn test_insert_for_unknown_package() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        assert!(matches!(
            insert(&mut conn, 9, "jpg").await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rolled_back_insert_leaves_no_row() {
        let pool = test_pool().await;
        seed(&pool).await;
        {
            let mut tx = pool.begin().await.unwrap();
            insert(&mut tx, 1, "jpg").await.unwrap();
            // dropped without commit
        }
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM PackageImages")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_delete_many_skips_unknown_ids() {
        let pool = test_pool().await;
        seed(&pool).await;
        let mut tx = pool.begin().await.unwrap();
        let image = insert(&mut tx, 1, "jpg").await.unwrap();
        tx.commit().await.unwrap();

        let deleted = delete_many(&pool, &[image.image_id, 999]).await.unwrap();
        assert_eq!(deleted.len(), 1);
        assert!(find_many(&pool, &[image.image_id]).await.unwrap().is_empty());
    }
}
