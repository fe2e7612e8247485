//! Order Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub order_id: i64,
    pub email: String,
    pub total_price: f64,
    /// `YYYY-MM-DD`
    pub order_date: String,
    pub payment_date: Option<String>,
    pub payment_status: PaymentStatus,
}

/// Order-booking link (junction table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub order_id: i64,
    pub booking_id: i64,
}

/// One cart entry as sent by the checkout page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "bookingId", alias = "booking_id")]
    pub booking_id: Option<i64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Checkout payload: paid cart to be recorded as an order
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
    pub user_email: Option<String>,
    pub total_price: Option<f64>,
}

/// Checkout result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub success: bool,
    pub order_id: i64,
}

/// Payment order creation payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentOrderRequest {
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
}
