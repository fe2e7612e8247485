//! Read path
//!
//! Clients pick a [`NamedQuery`] from a fixed catalogue and supply its
//! parameters; SQL text never comes from the request. Every result is passed
//! through boolean coercion using the declared types of the query's source
//! tables, so flags leave the server as `true`/`false` rather than 0/1.

use super::record::{Record, Value, bind_value, row_to_record};
use super::schema::table_schema;
use super::{RepoResult, Table};
use serde::Deserialize;
use shared::models::BookingStatus;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;

const DEFAULT_POPULAR_LIMIT: i64 = 6;
const MAX_POPULAR_LIMIT: i64 = 50;

fn default_popular_limit() -> i64 {
    DEFAULT_POPULAR_LIMIT
}

/// Catalogue of read operations, deserialized from `{"operation": ..., "params": {...}}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "operation", content = "params", rename_all = "snake_case")]
pub enum NamedQuery {
    /// Every row of one table
    ListTable { table: Table },
    /// Public profile of one user
    UserByEmail { email: String },
    /// Packages ranked by number of orders they appear in
    PopularPackages {
        #[serde(default = "default_popular_limit")]
        limit: i64,
    },
    /// Package browser with optional filters
    PackagesWithLocation {
        #[serde(default)]
        package_id: Option<i64>,
        #[serde(default)]
        location_id: Option<i64>,
        #[serde(default)]
        category_id: Option<i64>,
        #[serde(default)]
        max_price: Option<f64>,
        #[serde(default)]
        search: Option<String>,
    },
    PackageImages { package_id: i64 },
    PackageCategories { package_id: i64 },
    BookingsForUser {
        email: String,
        #[serde(default)]
        status: Option<BookingStatus>,
    },
    OrdersForUser { email: String },
    OrderItemsForUser { email: String, order_id: i64 },
}

impl NamedQuery {
    pub fn name(&self) -> &'static str {
        match self {
            NamedQuery::ListTable { .. } => "list_table",
            NamedQuery::UserByEmail { .. } => "user_by_email",
            NamedQuery::PopularPackages { .. } => "popular_packages",
            NamedQuery::PackagesWithLocation { .. } => "packages_with_location",
            NamedQuery::PackageImages { .. } => "package_images",
            NamedQuery::PackageCategories { .. } => "package_categories",
            NamedQuery::BookingsForUser { .. } => "bookings_for_user",
            NamedQuery::OrdersForUser { .. } => "orders_for_user",
            NamedQuery::OrderItemsForUser { .. } => "order_items_for_user",
        }
    }

    /// Account whose data the query reads; callers other than that account need admin
    pub fn owner_email(&self) -> Option<&str> {
        match self {
            NamedQuery::UserByEmail { email }
            | NamedQuery::BookingsForUser { email, .. }
            | NamedQuery::OrdersForUser { email }
            | NamedQuery::OrderItemsForUser { email, .. } => Some(email),
            _ => None,
        }
    }

    /// Whole-table listing of non-catalog data
    pub fn requires_admin(&self) -> bool {
        matches!(self, NamedQuery::ListTable { table } if !table.is_public())
    }

    fn sql(&self) -> &'static str {
        match self {
            NamedQuery::ListTable { table } => table.list_sql(),
            NamedQuery::UserByEmail { .. } => {
                "SELECT email, phone_number, first_name, last_name, is_admin \
                 FROM Users WHERE email = ?1"
            }
            NamedQuery::PopularPackages { .. } => {
                "SELECT p.package_id, p.name, p.description, p.duration, p.price, \
                        l.country, l.city, COUNT(DISTINCT oi.order_id) AS order_count \
                 FROM Packages p \
                 LEFT JOIN Locations l ON l.location_id = p.location_id \
                 LEFT JOIN Bookings b ON b.package_id = p.package_id \
                 LEFT JOIN OrderItems oi ON oi.booking_id = b.booking_id \
                 GROUP BY p.package_id \
                 ORDER BY order_count DESC, p.package_id \
                 LIMIT ?1"
            }
            NamedQuery::PackagesWithLocation { .. } => {
                "SELECT p.package_id, p.name, p.description, p.duration, p.price, \
                        p.location_id, l.country, l.city, l.image_path AS location_image \
                 FROM Packages p \
                 LEFT JOIN Locations l ON l.location_id = p.location_id \
                 WHERE (?1 IS NULL OR p.package_id = ?1) \
                   AND (?2 IS NULL OR p.location_id = ?2) \
                   AND (?3 IS NULL OR EXISTS (SELECT 1 FROM PackageCategory pc \
                        WHERE pc.package_id = p.package_id AND pc.category_id = ?3)) \
                   AND (?4 IS NULL OR p.price <= ?4) \
                   AND (?5 IS NULL OR p.name LIKE '%' || ?5 || '%' \
                        OR l.city LIKE '%' || ?5 || '%' OR l.country LIKE '%' || ?5 || '%') \
                 ORDER BY p.package_id"
            }
            NamedQuery::PackageImages { .. } => {
                "SELECT image_id, package_id, image_path FROM PackageImages \
                 WHERE package_id = ?1 ORDER BY image_id"
            }
            NamedQuery::PackageCategories { .. } => {
                "SELECT c.category_id, c.name, c.image_path \
                 FROM PackageCategory pc JOIN Categories c ON c.category_id = pc.category_id \
                 WHERE pc.package_id = ?1 ORDER BY c.name"
            }
            NamedQuery::BookingsForUser { .. } => {
                "SELECT b.booking_id, b.email, b.package_id, p.name AS package_name, \
                        b.start_date, b.end_date, b.number_of_travellers, b.price, b.status \
                 FROM Bookings b JOIN Packages p ON p.package_id = b.package_id \
                 WHERE b.email = ?1 AND (?2 IS NULL OR b.status = ?2) \
                 ORDER BY b.booking_id"
            }
            NamedQuery::OrdersForUser { .. } => {
                "SELECT order_id, email, total_price, order_date, payment_date, payment_status \
                 FROM Orders WHERE email = ?1 ORDER BY order_id DESC"
            }
            NamedQuery::OrderItemsForUser { .. } => {
                "SELECT oi.order_id, oi.booking_id, b.package_id, p.name AS package_name, \
                        b.start_date, b.end_date, b.number_of_travellers, b.price, b.status \
                 FROM OrderItems oi \
                 JOIN Orders o ON o.order_id = oi.order_id \
                 JOIN Bookings b ON b.booking_id = oi.booking_id \
                 JOIN Packages p ON p.package_id = b.package_id \
                 WHERE oi.order_id = ?2 AND o.email = ?1 \
                 ORDER BY oi.booking_id"
            }
        }
    }

    fn params(&self) -> Vec<Value> {
        match self {
            NamedQuery::ListTable { .. } => vec![],
            NamedQuery::UserByEmail { email } | NamedQuery::OrdersForUser { email } => {
                vec![email.as_str().into()]
            }
            NamedQuery::PopularPackages { limit } => {
                vec![(*limit).clamp(1, MAX_POPULAR_LIMIT).into()]
            }
            NamedQuery::PackagesWithLocation {
                package_id,
                location_id,
                category_id,
                max_price,
                search,
            } => vec![
                (*package_id).into(),
                (*location_id).into(),
                (*category_id).into(),
                (*max_price).into(),
                search
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .into(),
            ],
            NamedQuery::PackageImages { package_id }
            | NamedQuery::PackageCategories { package_id } => vec![(*package_id).into()],
            NamedQuery::BookingsForUser { email, status } => {
                vec![email.as_str().into(), status.map(|s| s.as_str()).into()]
            }
            NamedQuery::OrderItemsForUser { email, order_id } => {
                vec![email.as_str().into(), (*order_id).into()]
            }
        }
    }

    /// Tables whose declared flag columns apply to the result
    fn sources(&self) -> Vec<Table> {
        match self {
            NamedQuery::ListTable { table } => vec![*table],
            NamedQuery::UserByEmail { .. } => vec![Table::Users],
            NamedQuery::PopularPackages { .. } | NamedQuery::PackagesWithLocation { .. } => {
                vec![Table::Packages, Table::Locations]
            }
            NamedQuery::PackageImages { .. } => vec![Table::PackageImages],
            NamedQuery::PackageCategories { .. } => vec![Table::Categories],
            NamedQuery::BookingsForUser { .. } => vec![Table::Bookings, Table::Packages],
            NamedQuery::OrdersForUser { .. } => vec![Table::Orders],
            NamedQuery::OrderItemsForUser { .. } => {
                vec![Table::OrderItems, Table::Bookings, Table::Packages]
            }
        }
    }
}

/// Run a catalogued query; an empty result is `Ok(vec![])`
pub async fn run(pool: &SqlitePool, query: &NamedQuery) -> RepoResult<Vec<Record>> {
    let mut conn = pool.acquire().await?;
    let rows = fetch_rows(&mut conn, query.sql(), &query.params(), &query.sources()).await?;
    tracing::debug!(operation = query.name(), rows = rows.len(), "Query executed");
    Ok(rows)
}

/// Execute `sql` and decode the rows, coercing the flag columns of `sources`
pub(crate) async fn fetch_rows(
    conn: &mut SqliteConnection,
    sql: &str,
    params: &[Value],
    sources: &[Table],
) -> RepoResult<Vec<Record>> {
    let mut flags: HashSet<String> = HashSet::new();
    for table in sources {
        flags.extend(table_schema(conn, *table).await?.boolean_columns());
    }

    let mut query = sqlx::query(sql);
    for param in params {
        query = bind_value(query, param);
    }
    let rows = query.fetch_all(&mut *conn).await?;

    rows.iter()
        .map(|row| {
            let mut record = row_to_record(row)?;
            record.coerce_booleans(&flags);
            Ok(record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    async fn seed(pool: &SqlitePool) {
        sqlx::query(
            "INSERT INTO Users (email, password, first_name, is_admin) VALUES \
             ('ann@x.com', 'h', 'Ann', 1), ('bob@x.com', 'h', 'Bob', 0)",
        )
        .execute(pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO Locations (location_id, country, city) VALUES (1, 'Japan', 'Kyoto');
             INSERT INTO Packages (package_id, location_id, name, duration, price) VALUES
                (1, 1, 'Temples', 5, 900.0), (2, 1, 'Food Tour', 2, 300.0);
             INSERT INTO Bookings (booking_id, email, package_id, start_date, end_date,
                number_of_travellers, price, status) VALUES
                (1, 'bob@x.com', 2, '2026-03-01', '2026-03-03', 1, 300.0, 'pending'),
                (2, 'bob@x.com', 1, '2026-04-01', '2026-04-06', 2, 1800.0, 'in-cart');
             INSERT INTO Orders (order_id, email, total_price, order_date, payment_status)
                VALUES (1, 'bob@x.com', 300.0, '2026-02-01', 'paid');
             INSERT INTO OrderItems (order_id, booking_id) VALUES (1, 1);",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[test]
    fn test_deserialize_operation() {
        let q: NamedQuery = serde_json::from_str(
            r#"{"operation": "list_table", "params": {"table": "Users"}}"#,
        )
        .unwrap();
        assert_eq!(q, NamedQuery::ListTable { table: Table::Users });
        assert!(q.requires_admin());

        let q: NamedQuery =
            serde_json::from_str(r#"{"operation": "popular_packages", "params": {}}"#).unwrap();
        assert_eq!(q, NamedQuery::PopularPackages { limit: 6 });
        assert!(!q.requires_admin());

        let raw_sql = r#"{"operation": "SELECT * FROM Users", "params": {}}"#;
        assert!(serde_json::from_str::<NamedQuery>(raw_sql).is_err());
    }

    #[test]
    fn test_owner_email() {
        let q = NamedQuery::BookingsForUser {
            email: "bob@x.com".into(),
            status: None,
        };
        assert_eq!(q.owner_email(), Some("bob@x.com"));
        assert_eq!(NamedQuery::PackageImages { package_id: 1 }.owner_email(), None);
    }

    #[tokio::test]
    async fn test_list_users_coerces_flags_and_hides_password() {
        let pool = test_pool().await;
        seed(&pool).await;

        let rows = run(&pool, &NamedQuery::ListTable { table: Table::Users })
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("is_admin"), Some(&Value::Bool(true)));
        assert_eq!(rows[1].get("is_admin"), Some(&Value::Bool(false)));
        assert!(!rows[0].contains("password"));
    }

    #[tokio::test]
    async fn test_empty_result_is_empty_vec() {
        let pool = test_pool().await;
        let rows = run(
            &pool,
            &NamedQuery::UserByEmail {
                email: "nobody@x.com".into(),
            },
        )
        .await
        .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_popular_packages_ranked_by_orders() {
        let pool = test_pool().await;
        seed(&pool).await;

        let rows = run(&pool, &NamedQuery::PopularPackages { limit: 10 })
            .await
            .unwrap();
        assert_eq!(rows[0].get("name"), Some(&Value::from("Food Tour")));
        assert_eq!(rows[0].get("order_count"), Some(&Value::Integer(1)));
        assert_eq!(rows[1].get("order_count"), Some(&Value::Integer(0)));
    }

    #[tokio::test]
    async fn test_package_filters() {
        let pool = test_pool().await;
        seed(&pool).await;

        let cheap = run(
            &pool,
            &NamedQuery::PackagesWithLocation {
                package_id: None,
                location_id: None,
                category_id: None,
                max_price: Some(500.0),
                search: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(cheap.len(), 1);
        assert_eq!(cheap[0].get("city"), Some(&Value::from("Kyoto")));

        let by_city = run(
            &pool,
            &NamedQuery::PackagesWithLocation {
                package_id: None,
                location_id: None,
                category_id: None,
                max_price: None,
                search: Some("kyoto".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(by_city.len(), 2);
    }

    #[tokio::test]
    async fn test_bookings_for_user_status_filter() {
        let pool = test_pool().await;
        seed(&pool).await;

        let in_cart = run(
            &pool,
            &NamedQuery::BookingsForUser {
                email: "bob@x.com".into(),
                status: Some(BookingStatus::InCart),
            },
        )
        .await
        .unwrap();
        assert_eq!(in_cart.len(), 1);
        assert_eq!(in_cart[0].get("booking_id"), Some(&Value::Integer(2)));
        assert_eq!(in_cart[0].get("price"), Some(&Value::Real(1800.0)));
    }

    #[tokio::test]
    async fn test_order_items_scoped_to_owner() {
        let pool = test_pool().await;
        seed(&pool).await;

        let own = run(
            &pool,
            &NamedQuery::OrderItemsForUser {
                email: "bob@x.com".into(),
                order_id: 1,
            },
        )
        .await
        .unwrap();
        assert_eq!(own.len(), 1);

        let other = run(
            &pool,
            &NamedQuery::OrderItemsForUser {
                email: "ann@x.com".into(),
                order_id: 1,
            },
        )
        .await
        .unwrap();
        assert!(other.is_empty());
    }
}
