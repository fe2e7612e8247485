//! Payment gateway
//!
//! The server computes the amount, asks the gateway to create an order the
//! buyer approves in the browser, then captures it. A successful capture is
//! recorded locally through checkout.

pub mod paypal;

pub use paypal::PayPalClient;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// No usable answer from the gateway (connect, timeout, TLS)
    #[error("Gateway unreachable: {0}")]
    Unavailable(String),

    /// The gateway answered with an error status
    #[error("Gateway rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The gateway answered 2xx with a body we cannot use
    #[error("Unexpected gateway response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::InvalidResponse(err.to_string())
        } else {
            GatewayError::Unavailable(err.to_string())
        }
    }
}

/// Order created at the gateway, awaiting buyer approval
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayOrder {
    pub id: String,
    pub status: String,
    /// Where the buyer approves the payment, when the gateway provides it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approve_url: Option<String>,
}

/// Result of capturing an approved order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayCapture {
    pub id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_email: Option<String>,
}

impl GatewayCapture {
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("COMPLETED")
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order for `amount` (already rounded to cents)
    async fn create_order(&self, amount: Decimal) -> Result<GatewayOrder, GatewayError>;

    async fn capture_order(&self, order_id: &str) -> Result<GatewayCapture, GatewayError>;
}

/// In-process gateway for tests
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeGateway {
        pub created: Mutex<Vec<Decimal>>,
        pub reject_capture: bool,
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_order(&self, amount: Decimal) -> Result<GatewayOrder, GatewayError> {
            let mut created = self.created.lock().unwrap();
            created.push(amount);
            Ok(GatewayOrder {
                id: format!("FAKE-{}", created.len()),
                status: "CREATED".into(),
                approve_url: None,
            })
        }

        async fn capture_order(&self, order_id: &str) -> Result<GatewayCapture, GatewayError> {
            if self.reject_capture {
                return Err(GatewayError::Rejected {
                    status: 422,
                    body: "ORDER_NOT_APPROVED".into(),
                });
            }
            Ok(GatewayCapture {
                id: order_id.to_string(),
                status: "COMPLETED".into(),
                payer_email: Some("buyer@example.com".into()),
            })
        }
    }
}
