//! Booking Repository
//!
//! Status changes go through [`BookingStatus::can_transition_to`]; new
//! bookings always start in the cart.

use crate::db::{Record, RepoError, RepoResult, Table, UpsertOutcome, Value, upsert_in};
use shared::models::{Booking, BookingStatus};
use sqlx::{SqliteConnection, SqlitePool};

/// Validated booking write; `booking_id: None` creates a new cart entry
#[derive(Debug, Clone, Default)]
pub struct BookingFields {
    pub booking_id: Option<i64>,
    pub email: Option<String>,
    pub package_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub number_of_travellers: Option<i64>,
    pub price: Option<f64>,
    pub status: Option<BookingStatus>,
}

pub async fn find_in(conn: &mut SqliteConnection, booking_id: i64) -> RepoResult<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>(
        "SELECT booking_id, email, package_id, start_date, end_date, number_of_travellers, price, status \
         FROM Bookings WHERE booking_id = ?",
    )
    .bind(booking_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(booking)
}

pub async fn find_by_id(pool: &SqlitePool, booking_id: i64) -> RepoResult<Option<Booking>> {
    let mut conn = pool.acquire().await?;
    find_in(&mut conn, booking_id).await
}

/// Create or edit a booking, enforcing the status lifecycle
pub async fn save(pool: &SqlitePool, fields: BookingFields) -> RepoResult<UpsertOutcome> {
    let mut tx = pool.begin().await?;

    match fields.booking_id {
        Some(id) => {
            let current = find_in(&mut tx, id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("booking {id}")))?;
            if let Some(next) = fields.status
                && !current.status.can_transition_to(next)
            {
                return Err(RepoError::InvalidState(format!(
                    "booking {id} cannot move from {} to {next}",
                    current.status
                )));
            }
        }
        None => {
            if let Some(status) = fields.status
                && status != BookingStatus::InCart
            {
                return Err(RepoError::InvalidState(format!(
                    "new bookings start in-cart, not {status}"
                )));
            }
        }
    }

    let record = Record::new()
        .with("booking_id", Value::from(fields.booking_id))
        .with_opt("email", fields.email)
        .with_opt("package_id", fields.package_id)
        .with_opt("start_date", fields.start_date)
        .with_opt("end_date", fields.end_date)
        .with_opt("number_of_travellers", fields.number_of_travellers)
        .with_opt("price", fields.price)
        .with_opt("status", fields.status.map(|s| s.as_str()));
    let outcome = upsert_in(&mut tx, Table::Bookings, record).await?;

    tx.commit().await?;
    tracing::info!(key = ?outcome.key, inserted = outcome.inserted, "Booking saved");
    Ok(outcome)
}

/// Remove a booking that is still in the cart
pub async fn delete_from_cart(pool: &SqlitePool, booking_id: i64) -> RepoResult<()> {
    let result = sqlx::query("DELETE FROM Bookings WHERE booking_id = ? AND status = 'in-cart'")
        .bind(booking_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 1 {
        return Ok(());
    }

    match find_by_id(pool, booking_id).await? {
        Some(booking) => Err(RepoError::InvalidState(format!(
            "booking {booking_id} is {} and can no longer be removed",
            booking.status
        ))),
        None => Err(RepoError::NotFound(format!("booking {booking_id}"))),
    }
}
