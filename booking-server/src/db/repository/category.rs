//! Category Repository

use crate::db::{RepoError, RepoResult};
use shared::models::CategorySync;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;

/// Category ids currently linked to a package
pub async fn linked_ids(conn: &mut SqliteConnection, package_id: i64) -> RepoResult<HashSet<i64>> {
    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT category_id FROM PackageCategory WHERE package_id = ?")
            .bind(package_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(ids.into_iter().collect())
}

/// Make the package's links equal the named categories.
///
/// Names are matched exactly; unknown names are skipped and reported in
/// [`CategorySync::unknown`]. A freshly created package has no links, so the
/// removal step is skipped for it.
pub async fn sync_package_categories(
    conn: &mut SqliteConnection,
    package_id: i64,
    names: &[String],
    is_new: bool,
) -> RepoResult<CategorySync> {
    // 1. Resolve requested names
    let mut wanted: HashSet<i64> = HashSet::new();
    let mut unknown = Vec::new();
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        let id: Option<i64> = sqlx::query_scalar("SELECT category_id FROM Categories WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;
        match id {
            Some(id) => {
                wanted.insert(id);
            }
            None => {
                tracing::warn!(package_id, category = %name, "Unknown category skipped");
                if !unknown.iter().any(|u| u == name) {
                    unknown.push(name.to_string());
                }
            }
        }
    }

    // 2. Diff against the current links
    let current = if is_new {
        HashSet::new()
    } else {
        linked_ids(conn, package_id).await?
    };
    let mut added: Vec<i64> = wanted.difference(&current).copied().collect();
    let mut removed: Vec<i64> = if is_new {
        vec![]
    } else {
        current.difference(&wanted).copied().collect()
    };
    added.sort_unstable();
    removed.sort_unstable();

    // 3. Link new categories
    for category_id in &added {
        sqlx::query("INSERT INTO PackageCategory (package_id, category_id) VALUES (?, ?)")
            .bind(package_id)
            .bind(category_id)
            .execute(&mut *conn)
            .await?;
    }

    // 4. Unlink dropped ones
    for category_id in &removed {
        sqlx::query("DELETE FROM PackageCategory WHERE package_id = ? AND category_id = ?")
            .bind(package_id)
            .bind(category_id)
            .execute(&mut *conn)
            .await?;
    }

    tracing::debug!(package_id, added = ?added, removed = ?removed, "Package categories synced");
    Ok(CategorySync {
        added,
        removed,
        unknown,
    })
}

/// Delete a category together with its package links
pub async fn delete(pool: &SqlitePool, category_id: i64) -> RepoResult<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM PackageCategory WHERE category_id = ?")
        .bind(category_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM Categories WHERE category_id = ?")
        .bind(category_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("category {category_id}")));
    }
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn seed(pool: &SqlitePool) {
        sqlx::query(
            "INSERT INTO Categories (category_id, name) VALUES (1, 'Beach'), (2, 'City'), (3, 'Adventure');
             INSERT INTO Packages (package_id, name, duration, price) VALUES (10, 'Coast', 4, 500.0);
             INSERT INTO PackageCategory (package_id, category_id) VALUES (10, 1), (10, 2);",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_sync_adds_and_removes() {
        let pool = test_pool().await;
        seed(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let sync = sync_package_categories(&mut conn, 10, &names(&["City", "Adventure"]), false)
            .await
            .unwrap();
        assert_eq!(sync.added, vec![3]);
        assert_eq!(sync.removed, vec![1]);
        assert!(sync.unknown.is_empty());

        let mut linked: Vec<i64> = linked_ids(&mut conn, 10).await.unwrap().into_iter().collect();
        linked.sort_unstable();
        assert_eq!(linked, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_sync_reports_unknown_names() {
        let pool = test_pool().await;
        seed(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let sync = sync_package_categories(&mut conn, 10, &names(&["Beach", "City", "Cruise"]), false)
            .await
            .unwrap();
        assert!(sync.added.is_empty());
        assert!(sync.removed.is_empty());
        assert_eq!(sync.unknown, vec!["Cruise".to_string()]);
    }

    #[tokio::test]
    async fn test_sync_empty_list_unlinks_everything() {
        let pool = test_pool().await;
        seed(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let sync = sync_package_categories(&mut conn, 10, &[], false).await.unwrap();
        assert_eq!(sync.removed, vec![1, 2]);
        assert!(linked_ids(&mut conn, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_category_drops_links() {
        let pool = test_pool().await;
        seed(&pool).await;

        delete(&pool, 1).await.unwrap();
        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM PackageCategory")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(links, 1);
        assert!(matches!(delete(&pool, 1).await, Err(RepoError::NotFound(_))));
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Categories")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 2);
    }
}
