//! Booking Handlers
//!
//! Customers add to and edit their cart. Once a booking has been checked out
//! only an admin can change it, and status changes follow the booking
//! lifecycle.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{BookingStatus, BookingUpsert};

use crate::api::ApiResult;
use crate::api::convert::not_found_as;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{booking, category, location};
use crate::db::repository::booking::BookingFields;
use crate::db::{RepoError, Table};
use crate::utils::ok;
use crate::utils::validation::{require_email, validate_date, validate_date_range, validate_positive};

#[derive(Debug, Serialize)]
pub struct SavedBooking {
    pub booking_id: i64,
    pub created: bool,
}

/// Physical delete of one allow-listed row
#[derive(Debug, Deserialize)]
pub struct DeleteEntry {
    pub table: String,
    pub id: i64,
}

fn validate_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "price must be zero or more",
        )
        .with_detail("field", "price"));
    }
    Ok(())
}

fn validate_fields(req: &BookingUpsert) -> Result<(), AppError> {
    match (&req.start_date, &req.end_date) {
        (Some(start), Some(end)) => validate_date_range(start, end)?,
        (Some(start), None) => {
            validate_date(start, "start_date")?;
        }
        (None, Some(end)) => {
            validate_date(end, "end_date")?;
        }
        (None, None) => {}
    }
    if let Some(travellers) = req.number_of_travellers {
        validate_positive(travellers, "number_of_travellers")?;
    }
    if let Some(price) = req.price {
        validate_price(price)?;
    }
    Ok(())
}

/// Add a cart entry (no `booking_id`) or edit an existing booking
pub async fn update_booking(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<BookingUpsert>,
) -> ApiResult<SavedBooking> {
    validate_fields(&req)?;

    let fields = match req.booking_id {
        None => {
            let email = match req.email.as_deref() {
                Some(email) => require_email(Some(email), "email")?,
                None => current.email.clone(),
            };
            current.require_access(&email)?;

            if req.start_date.is_none() {
                return Err(AppError::required("start_date"));
            }
            if req.end_date.is_none() {
                return Err(AppError::required("end_date"));
            }
            BookingFields {
                booking_id: None,
                email: Some(email),
                package_id: Some(req.package_id.ok_or_else(|| AppError::required("package_id"))?),
                start_date: req.start_date,
                end_date: req.end_date,
                number_of_travellers: Some(
                    req.number_of_travellers
                        .ok_or_else(|| AppError::required("number_of_travellers"))?,
                ),
                price: Some(req.price.ok_or_else(|| AppError::required("price"))?),
                status: req.status,
            }
        }
        Some(booking_id) => {
            let existing = booking::find_by_id(&state.pool, booking_id)
                .await?
                .ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::BookingNotFound,
                        format!("Booking {booking_id} not found"),
                    )
                })?;
            current.require_access(&existing.email)?;

            if let Some(email) = req.email.as_deref()
                && shared::util::normalize_email(email) != existing.email
            {
                return Err(AppError::validation("A booking cannot move to another account"));
            }
            if req.start_date.is_some() || req.end_date.is_some() {
                // a single new date must still fit the stored one
                validate_date_range(
                    req.start_date.as_deref().unwrap_or(&existing.start_date),
                    req.end_date.as_deref().unwrap_or(&existing.end_date),
                )?;
            }
            if !current.is_admin {
                if existing.status != BookingStatus::InCart {
                    return Err(AppError::with_message(
                        ErrorCode::BookingNotInCart,
                        format!("Booking {booking_id} is {} and can no longer be edited", existing.status),
                    ));
                }
                if req.status.is_some_and(|s| s != existing.status) {
                    return Err(AppError::permission_denied(
                        "Only administrators can change a booking status",
                    ));
                }
            }
            BookingFields {
                booking_id: Some(booking_id),
                email: None,
                package_id: req.package_id,
                start_date: req.start_date,
                end_date: req.end_date,
                number_of_travellers: req.number_of_travellers,
                price: req.price,
                status: req.status,
            }
        }
    };

    let outcome = booking::save(&state.pool, fields)
        .await
        .map_err(not_found_as(ErrorCode::BookingNotFound))?;
    let booking_id = outcome
        .id()
        .ok_or_else(|| AppError::with_message(ErrorCode::ConsistencyError, "booking key is not an integer"))?;

    Ok(ok(SavedBooking {
        booking_id,
        created: outcome.inserted,
    }))
}

/// Delete a cart entry, a location or a category
pub async fn delete_entry(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<DeleteEntry>,
) -> ApiResult<()> {
    let table: Table = req.table.parse().map_err(|_| {
        AppError::with_message(ErrorCode::UnknownTable, format!("Unknown table: {}", req.table))
    })?;
    let id = req.id;

    match table {
        Table::Bookings => {
            let existing = booking::find_by_id(&state.pool, id).await?.ok_or_else(|| {
                AppError::with_message(ErrorCode::BookingNotFound, format!("Booking {id} not found"))
            })?;
            current.require_access(&existing.email)?;
            booking::delete_from_cart(&state.pool, id).await.map_err(|e| match e {
                RepoError::InvalidState(msg) => AppError::with_message(ErrorCode::BookingNotInCart, msg),
                other => not_found_as(ErrorCode::BookingNotFound)(other),
            })?;
        }
        Table::Locations => {
            current.require_admin()?;
            location::delete(&state.pool, id).await.map_err(|e| match e {
                RepoError::Constraint(msg) => AppError::conflict(msg),
                other => not_found_as(ErrorCode::LocationNotFound)(other),
            })?;
        }
        Table::Categories => {
            current.require_admin()?;
            category::delete(&state.pool, id)
                .await
                .map_err(not_found_as(ErrorCode::CategoryNotFound))?;
        }
        other => {
            return Err(AppError::invalid_request(format!(
                "Rows of {other} cannot be deleted here"
            )));
        }
    }

    tracing::info!(table = %table, id, by = %current.email, "Entry deleted");
    Ok(ok(()))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{TestApp, test_app};
    use crate::db::repository::booking;
    use http::{Method, StatusCode};
    use serde_json::{Value, json};
    use shared::models::BookingStatus;

    async fn seeded() -> TestApp {
        let app = test_app().await;
        app.user("ann@example.com", false).await;
        app.user("bob@example.com", false).await;
        app.exec(
            "INSERT INTO Locations (location_id, country, city) VALUES (1, 'Japan', 'Kyoto');
             INSERT INTO Packages (package_id, location_id, name, duration, price) VALUES (1, 1, 'Temples', 5, 900.0);",
        )
        .await;
        app
    }

    fn cart_add() -> Value {
        json!({
            "package_id": 1,
            "start_date": "2026-04-01",
            "end_date": "2026-04-06",
            "number_of_travellers": 2,
            "price": 1800.0
        })
    }

    #[tokio::test]
    async fn test_add_to_cart_then_edit() {
        let app = seeded().await;
        let ann = app.token("ann@example.com", false);

        let (status, body) = app.post("/update_booking", Some(&ann), cart_add()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["created"], true);
        let id = body["data"]["booking_id"].as_i64().unwrap();

        let (status, body) = app
            .post(
                "/update_booking",
                Some(&ann),
                json!({"booking_id": id, "number_of_travellers": 3, "price": 2700.0}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["created"], false);

        let stored = booking::find_by_id(&app.state.pool, id).await.unwrap().unwrap();
        assert_eq!(stored.number_of_travellers, 3);
        assert_eq!(stored.email, "ann@example.com");
        assert_eq!(stored.status, BookingStatus::InCart);
    }

    #[tokio::test]
    async fn test_rejects_bad_dates_and_foreign_cart() {
        let app = seeded().await;
        let ann = app.token("ann@example.com", false);

        let mut bad = cart_add();
        bad["end_date"] = json!("2026-03-01");
        let (status, _) = app.post("/update_booking", Some(&ann), bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut foreign = cart_add();
        foreign["email"] = json!("bob@example.com");
        let (status, _) = app.post("/update_booking", Some(&ann), foreign).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_single_date_edit_checked_against_stored_range() {
        let app = seeded().await;
        let ann = app.token("ann@example.com", false);
        let (_, body) = app.post("/update_booking", Some(&ann), cart_add()).await;
        let id = body["data"]["booking_id"].as_i64().unwrap();

        let (status, _) = app
            .post("/update_booking", Some(&ann), json!({"booking_id": id, "start_date": "2026-09-01"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = app
            .post("/update_booking", Some(&ann), json!({"booking_id": id, "end_date": "2026-03-01"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let stored = booking::find_by_id(&app.state.pool, id).await.unwrap().unwrap();
        assert_eq!(stored.start_date, "2026-04-01");
        assert_eq!(stored.end_date, "2026-04-06");

        let (status, _) = app
            .post("/update_booking", Some(&ann), json!({"booking_id": id, "end_date": "2026-04-10"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        let stored = booking::find_by_id(&app.state.pool, id).await.unwrap().unwrap();
        assert_eq!(stored.end_date, "2026-04-10");
    }

    #[tokio::test]
    async fn test_status_changes_follow_lifecycle() {
        let app = seeded().await;
        app.exec(
            "INSERT INTO Bookings (booking_id, email, package_id, start_date, end_date, number_of_travellers, price, status)
             VALUES (5, 'ann@example.com', 1, '2026-04-01', '2026-04-06', 2, 1800.0, 'pending');",
        )
        .await;
        let ann = app.token("ann@example.com", false);
        let admin = app.token("root@example.com", true);

        let (status, body) = app
            .post("/update_booking", Some(&ann), json!({"booking_id": 5, "status": "confirmed"}))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 4003);

        let (status, _) = app
            .post("/update_booking", Some(&admin), json!({"booking_id": 5, "status": "confirmed"}))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .post("/update_booking", Some(&admin), json!({"booking_id": 5, "status": "in-cart"}))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 4002);
    }

    #[tokio::test]
    async fn test_delete_entry_cart_only() {
        let app = seeded().await;
        app.exec(
            "INSERT INTO Bookings (booking_id, email, package_id, start_date, end_date, number_of_travellers, price, status)
             VALUES (1, 'ann@example.com', 1, '2026-04-01', '2026-04-06', 2, 1800.0, 'in-cart'),
                    (2, 'ann@example.com', 1, '2026-04-01', '2026-04-06', 2, 1800.0, 'pending');",
        )
        .await;
        let ann = app.token("ann@example.com", false);
        let bob = app.token("bob@example.com", false);

        let (status, _) = app
            .send(Method::DELETE, "/delete_entry", Some(&bob), Some(json!({"table": "Bookings", "id": 1})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send(Method::DELETE, "/delete_entry", Some(&ann), Some(json!({"table": "Bookings", "id": 1})))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .send(Method::DELETE, "/delete_entry", Some(&ann), Some(json!({"table": "Bookings", "id": 2})))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 4003);

        let (status, _) = app
            .send(Method::DELETE, "/delete_entry", Some(&ann), Some(json!({"table": "Bookings", "id": 99})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_entry_catalog_needs_admin() {
        let app = seeded().await;
        app.exec("INSERT INTO Categories (category_id, name) VALUES (1, 'Culture');").await;
        let ann = app.token("ann@example.com", false);
        let admin = app.token("root@example.com", true);

        let (status, _) = app
            .send(Method::DELETE, "/delete_entry", Some(&ann), Some(json!({"table": "Categories", "id": 1})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .send(Method::DELETE, "/delete_entry", Some(&admin), Some(json!({"table": "categories", "id": 1})))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .send(Method::DELETE, "/delete_entry", Some(&admin), Some(json!({"table": "Locations", "id": 1})))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = app
            .send(Method::DELETE, "/delete_entry", Some(&admin), Some(json!({"table": "Orders", "id": 1})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 5);

        let (status, body) = app
            .send(Method::DELETE, "/delete_entry", Some(&admin), Some(json!({"table": "Nope", "id": 1})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 7004);
    }
}
