//! Order Handlers

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{CheckoutReceipt, CheckoutRequest, PaymentOrderRequest};

use crate::api::ApiResult;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::RepoError;
use crate::db::repository::order::{self, Checkout};
use crate::money;
use crate::payment::{GatewayCapture, GatewayOrder};
use crate::utils::ok;
use crate::utils::validation::require_email;

/// Capture outcome, with the recorded order when the cart came along
#[derive(Debug, Serialize)]
pub struct CaptureResult {
    pub capture: GatewayCapture,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
}

/// Validate a checkout request on behalf of `current`
fn prepare_checkout(current: &CurrentUser, req: CheckoutRequest) -> Result<Checkout, AppError> {
    if req.cart_items.is_empty() {
        return Err(AppError::new(ErrorCode::CartEmpty));
    }
    let email = require_email(req.user_email.as_deref(), "user_email")?;
    current.require_access(&email)?;

    let total_price = req.total_price.ok_or_else(|| AppError::required("total_price"))?;
    let total = money::positive_amount(total_price, "total_price")
        .map_err(|msg| AppError::with_message(ErrorCode::InvalidOrderTotal, msg))?;

    let booking_ids = req
        .cart_items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.booking_id.ok_or_else(|| {
                AppError::validation(format!("cart item {index} has no bookingId"))
                    .with_detail("index", index)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Checkout {
        email,
        booking_ids,
        total,
    })
}

fn checkout_error(err: RepoError) -> AppError {
    match err {
        RepoError::NotFound(what) => {
            AppError::with_message(ErrorCode::BookingNotFound, format!("{what} not found in your cart"))
        }
        RepoError::InvalidState(msg) => AppError::with_message(ErrorCode::BookingNotInCart, msg),
        RepoError::Validation(_) => AppError::new(ErrorCode::CartEmpty),
        other => other.into(),
    }
}

/// Record a paid order for the cart; all bookings move to pending or nothing changes
pub async fn checkout(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<CheckoutReceipt> {
    let checkout = prepare_checkout(&current, req)?;
    let order_id = order::checkout(&state.pool, checkout)
        .await
        .map_err(checkout_error)?;

    Ok(ok(CheckoutReceipt {
        success: true,
        order_id,
    }))
}

/// Create a gateway order for the cart total
pub async fn create_payment_order(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<PaymentOrderRequest>,
) -> ApiResult<GatewayOrder> {
    if req.cart_items.is_empty() {
        return Err(AppError::new(ErrorCode::CartEmpty));
    }
    let total = money::cart_total(&req.cart_items)
        .map_err(|msg| AppError::with_message(ErrorCode::InvalidOrderTotal, msg))?;

    let order = state.gateway.create_order(total).await?;
    tracing::info!(
        gateway_order = %order.id,
        email = %current.email,
        amount = %total,
        "Payment order created"
    );
    Ok(ok(order))
}

/// Capture an approved gateway order.
///
/// A JSON checkout body is validated before the capture and recorded after
/// it succeeds; an empty body only captures.
pub async fn capture_payment_order(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(order_id): Path<String>,
    body: Bytes,
) -> ApiResult<CaptureResult> {
    let checkout = if body.is_empty() {
        None
    } else {
        let req: CheckoutRequest = serde_json::from_slice(&body)
            .map_err(|e| AppError::invalid_request(format!("Invalid checkout body: {e}")))?;
        Some(prepare_checkout(&current, req)?)
    };

    let capture = state.gateway.capture_order(&order_id).await?;
    if !capture.is_completed() {
        tracing::warn!(gateway_order = %order_id, status = %capture.status, "Capture not completed");
        return Err(AppError::new(ErrorCode::PaymentFailed).with_detail("status", capture.status));
    }

    let order_id = match checkout {
        Some(checkout) => {
            let recorded = order::checkout(&state.pool, checkout).await.map_err(|e| {
                tracing::error!(
                    gateway_order = %capture.id,
                    error = %e,
                    "Payment captured but order not recorded"
                );
                checkout_error(e)
            })?;
            Some(recorded)
        }
        None => None,
    };

    Ok(ok(CaptureResult { capture, order_id }))
}
