//! Order Repository
//!
//! Checkout turns the caller's in-cart bookings into a paid order. The order
//! row, its items and the booking status changes commit together or not at
//! all.

use crate::db::{RepoError, RepoResult};
use crate::money;
use rust_decimal::Decimal;
use shared::models::{Order, OrderItem};
use sqlx::SqlitePool;

/// Validated checkout request
#[derive(Debug, Clone)]
pub struct Checkout {
    pub email: String,
    pub booking_ids: Vec<i64>,
    pub total: Decimal,
}

pub async fn find_by_id(pool: &SqlitePool, order_id: i64) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "SELECT order_id, email, total_price, order_date, payment_date, payment_status \
         FROM Orders WHERE order_id = ?",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    Ok(order)
}

pub async fn items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT order_id, booking_id FROM OrderItems WHERE order_id = ? ORDER BY booking_id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Record a paid order for `checkout.booking_ids` and move them to pending.
///
/// Every booking must exist, belong to `checkout.email` and still be in the
/// cart; otherwise nothing is written.
pub async fn checkout(pool: &SqlitePool, checkout: Checkout) -> RepoResult<i64> {
    let mut booking_ids = checkout.booking_ids.clone();
    booking_ids.sort_unstable();
    booking_ids.dedup();
    if booking_ids.is_empty() {
        return Err(RepoError::Validation("cart is empty".into()));
    }

    let today = shared::util::today();
    let mut tx = pool.begin().await?;

    let order_id: i64 = sqlx::query_scalar(
        "INSERT INTO Orders (email, total_price, order_date, payment_date, payment_status) \
         VALUES (?, ?, ?, ?, 'paid') RETURNING order_id",
    )
    .bind(&checkout.email)
    .bind(money::to_f64(checkout.total))
    .bind(&today)
    .bind(&today)
    .fetch_one(&mut *tx)
    .await?;

    for booking_id in &booking_ids {
        let moved = sqlx::query(
            "UPDATE Bookings SET status = 'pending' \
             WHERE booking_id = ? AND email = ? AND status = 'in-cart'",
        )
        .bind(booking_id)
        .bind(&checkout.email)
        .execute(&mut *tx)
        .await?;
        if moved.rows_affected() != 1 {
            let reason = match booking_owner_and_status(&mut tx, *booking_id).await? {
                None => RepoError::NotFound(format!("booking {booking_id}")),
                Some((owner, _)) if owner != checkout.email => {
                    RepoError::NotFound(format!("booking {booking_id}"))
                }
                Some((_, status)) => RepoError::InvalidState(format!(
                    "booking {booking_id} is {status}, not in-cart"
                )),
            };
            tracing::warn!(order_id, booking_id, error = %reason, "Checkout rolled back");
            return Err(reason);
        }

        sqlx::query("INSERT INTO OrderItems (order_id, booking_id) VALUES (?, ?)")
            .bind(order_id)
            .bind(booking_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::info!(
        order_id,
        email = %checkout.email,
        bookings = booking_ids.len(),
        total = %checkout.total,
        "Order placed"
    );
    Ok(order_id)
}

async fn booking_owner_and_status(
    conn: &mut sqlx::SqliteConnection,
    booking_id: i64,
) -> RepoResult<Option<(String, String)>> {
    let row = sqlx::query_as::<_, (String, String)>(
        "SELECT email, status FROM Bookings WHERE booking_id = ?",
    )
    .bind(booking_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}
