//! Payment capture: a two-call capability over the hosted payment provider.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;
use crate::notify::NotificationLevel;
use crate::wizard::model::Plan;

/// An order created with the payment provider, awaiting the buyer's approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub id: String,
    pub plan: Plan,
    pub amount: Decimal,
    pub currency: String,
}

/// Order states reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Saved,
    Approved,
    Voided,
    Completed,
    PayerActionRequired,
}

/// Everything the wizard needs from a payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open an order for `amount` in `currency` and return its provider id.
    async fn create_order(
        &self,
        plan: Plan,
        amount: Decimal,
        currency: &str,
    ) -> Result<String, PaymentError>;

    /// Look up where the order stands after the buyer interacted with it.
    async fn confirm_order(&self, order_id: &str) -> Result<OrderStatus, PaymentError>;
}

pub const PAYMENT_SUCCEEDED_MESSAGE: &str =
    "Payment was successful, somebody is now working on your website!";
pub const PAYMENT_CANCELLED_MESSAGE: &str = "You cancelled the payment";
pub const PAYMENT_FAILED_MESSAGE: &str = "An error might have occurred with your payment";

/// User-facing message for a confirmed order, if the status warrants one.
pub fn outcome_notification(
    result: &Result<OrderStatus, PaymentError>,
) -> Option<(NotificationLevel, &'static str)> {
    match result {
        Ok(OrderStatus::Approved | OrderStatus::Completed) => {
            Some((NotificationLevel::Success, PAYMENT_SUCCEEDED_MESSAGE))
        }
        Ok(OrderStatus::Voided) => Some((NotificationLevel::Error, PAYMENT_CANCELLED_MESSAGE)),
        Ok(_) => None,
        Err(_) => Some((NotificationLevel::Error, PAYMENT_FAILED_MESSAGE)),
    }
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    #[serde(with = "rust_decimal::serde::str")]
    price: Decimal,
    currency: &'a str,
    plan: Plan,
}

#[derive(Debug, Deserialize)]
struct OrderStatusBody {
    status: OrderStatus,
}

/// [`PaymentGateway`] over the order service's HTTP endpoints.
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PaymentError::RequestFailed {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_order(
        &self,
        plan: Plan,
        amount: Decimal,
        currency: &str,
    ) -> Result<String, PaymentError> {
        let resp = self
            .client
            .post(format!("{}/create-order", self.base_url))
            .json(&CreateOrderBody {
                price: amount,
                currency,
                plan,
            })
            .send()
            .await
            .map_err(|e| PaymentError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| PaymentError::RequestFailed {
            reason: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // The order service answers with the bare order id.
        let order_id = body.trim().trim_matches('"').to_string();
        if order_id.is_empty() {
            return Err(PaymentError::InvalidResponse("empty order id".to_string()));
        }
        tracing::info!(order_id = %order_id, plan = %plan, amount = %amount, currency, "Payment order created");
        Ok(order_id)
    }

    async fn confirm_order(&self, order_id: &str) -> Result<OrderStatus, PaymentError> {
        let resp = self
            .client
            .get(format!("{}/orders/{}", self.base_url, order_id))
            .send()
            .await
            .map_err(|e| PaymentError::RequestFailed {
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected { status, body });
        }

        let body: OrderStatusBody = resp
            .json()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;
        tracing::info!(order_id = %order_id, status = ?body.status, "Payment order status");
        Ok(body.status)
    }
}
