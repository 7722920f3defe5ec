// orderflow/src/gateway.rs

//! Hosted card gateway boundary. The gateway's own processing is opaque: we
//! hand it an amount and an idempotency reference, it hands back a
//! short-lived token, and later calls back with the outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::model::{Money, SessionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentTokenRequest {
  /// Idempotency reference; echoed back in the gateway's confirmation.
  pub reference: String,
  pub amount: Money,
  pub currency: String,
  pub description: String,
  pub payer_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentToken {
  pub token: String,
  pub redirect_url: String,
  pub expires_at: DateTime<Utc>,
}

/// What the gateway callback reports about a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfirmation {
  pub reference: String,
  pub gateway_payment_id: String,
  pub approved: bool,
  pub amount: Money,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn request_token(&self, request: PaymentTokenRequest) -> Result<PaymentToken, GatewayError>;
}

/// The idempotency reference for a checkout session, shared by both payment
/// paths so a session can never settle into two orders.
pub fn settlement_reference(session_id: &SessionId) -> String {
  session_id.to_string()
}
