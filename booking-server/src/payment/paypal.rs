//! PayPal Orders v2 via REST (no SDK dependency)

use super::{GatewayCapture, GatewayError, GatewayOrder, PaymentGateway};
use crate::core::config::PayPalConfig;
use crate::money;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct PayPalClient {
    http: reqwest::Client,
    config: PayPalConfig,
}

impl PayPalClient {
    pub fn new(config: PayPalConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// OAuth2 client-credentials token
    async fn access_token(&self) -> Result<String, GatewayError> {
        let resp = self
            .http
            .post(self.url("/v1/oauth2/token"))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let body = read_json(resp).await?;

        body["access_token"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| GatewayError::InvalidResponse("token response without access_token".into()))
    }

    async fn post_json(&self, path: &str, payload: &Value) -> Result<Value, GatewayError> {
        let token = self.access_token().await?;
        let resp = self
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .json(payload)
            .send()
            .await?;
        read_json(resp).await
    }
}

#[async_trait]
impl PaymentGateway for PayPalClient {
    async fn create_order(&self, amount: Decimal) -> Result<GatewayOrder, GatewayError> {
        let body = self
            .post_json("/v2/checkout/orders", &order_body(amount, &self.config.currency))
            .await?;
        let order = parse_order(&body)?;
        tracing::info!(gateway_order = %order.id, amount = %amount, "Payment order created");
        Ok(order)
    }

    async fn capture_order(&self, order_id: &str) -> Result<GatewayCapture, GatewayError> {
        if order_id.is_empty() || !order_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(GatewayError::Rejected {
                status: 400,
                body: "malformed order id".into(),
            });
        }
        let body = self
            .post_json(&format!("/v2/checkout/orders/{order_id}/capture"), &json!({}))
            .await?;
        let capture = parse_capture(&body)?;
        tracing::info!(gateway_order = %capture.id, status = %capture.status, "Payment captured");
        Ok(capture)
    }
}

async fn read_json(resp: reqwest::Response) -> Result<Value, GatewayError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "Gateway returned error");
        return Err(GatewayError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.json().await?)
}

/// Create-order payload: one purchase unit for the whole cart
pub(crate) fn order_body(amount: Decimal, currency: &str) -> Value {
    json!({
        "intent": "CAPTURE",
        "purchase_units": [{
            "amount": {
                "currency_code": currency,
                "value": money::format_amount(amount),
            }
        }]
    })
}

pub(crate) fn parse_order(body: &Value) -> Result<GatewayOrder, GatewayError> {
    let id = body["id"]
        .as_str()
        .ok_or_else(|| GatewayError::InvalidResponse("order response without id".into()))?;
    let approve_url = body["links"].as_array().and_then(|links| {
        links
            .iter()
            .find(|l| matches!(l["rel"].as_str(), Some("approve" | "payer-action")))
            .and_then(|l| l["href"].as_str())
            .map(String::from)
    });
    Ok(GatewayOrder {
        id: id.to_string(),
        status: body["status"].as_str().unwrap_or_default().to_string(),
        approve_url,
    })
}

pub(crate) fn parse_capture(body: &Value) -> Result<GatewayCapture, GatewayError> {
    let id = body["id"]
        .as_str()
        .ok_or_else(|| GatewayError::InvalidResponse("capture response without id".into()))?;
    Ok(GatewayCapture {
        id: id.to_string(),
        status: body["status"].as_str().unwrap_or_default().to_string(),
        payer_email: body["payer"]["email_address"].as_str().map(String::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_body() {
        let body = order_body("150".parse().unwrap(), "AUD");
        assert_eq!(body["intent"], "CAPTURE");
        assert_eq!(body["purchase_units"][0]["amount"]["currency_code"], "AUD");
        assert_eq!(body["purchase_units"][0]["amount"]["value"], "150.00");
    }

    #[test]
    fn test_parse_order() {
        let body = json!({
            "id": "5O190127TN364715T",
            "status": "CREATED",
            "links": [
                {"href": "https://api/self", "rel": "self"},
                {"href": "https://paypal/approve", "rel": "approve"}
            ]
        });
        let order = parse_order(&body).unwrap();
        assert_eq!(order.id, "5O190127TN364715T");
        assert_eq!(order.status, "CREATED");
        assert_eq!(order.approve_url.as_deref(), Some("https://paypal/approve"));

        assert!(matches!(
            parse_order(&json!({"status": "CREATED"})),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_capture() {
        let body = json!({
            "id": "5O190127TN364715T",
            "status": "COMPLETED",
            "payer": {"email_address": "buyer@example.com"}
        });
        let capture = parse_capture(&body).unwrap();
        assert!(capture.is_completed());
        assert_eq!(capture.payer_email.as_deref(), Some("buyer@example.com"));
    }

    #[tokio::test]
    async fn test_capture_rejects_malformed_id() {
        let client = PayPalClient::new(PayPalConfig {
            base_url: "http://127.0.0.1:9".into(),
            client_id: "id".into(),
            client_secret: "secret".into(),
            currency: "AUD".into(),
        })
        .unwrap();
        assert!(matches!(
            client.capture_order("../../v1/oauth2").await,
            Err(GatewayError::Rejected { status: 400, .. })
        ));
    }
}
