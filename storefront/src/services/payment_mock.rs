// storefront/src/services/payment_mock.rs
use async_trait::async_trait;
use chrono::{Duration, Utc};
use orderflow::{GatewayError, PaymentGateway, PaymentToken, PaymentTokenRequest};
use tracing::{info, instrument};
use uuid::Uuid;

const TOKEN_LIFETIME_MINUTES: i64 = 30;

/// Simulated hosted payment page. Issues tokens that point at a fake checkout URL.
#[derive(Debug, Clone)]
pub struct MockPaymentGateway {
  account_id: String,
  base_url: String,
}

impl MockPaymentGateway {
  pub fn new(account_id: impl Into<String>, base_url: impl Into<String>) -> Self {
    Self {
      account_id: account_id.into(),
      base_url: base_url.into(),
    }
  }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  #[instrument(
    name = "MockPaymentGateway::request_token",
    skip(self, request),
    fields(reference = %request.reference, amount = %request.amount, payment_account_id = %self.account_id),
    err(Display)
  )]
  async fn request_token(&self, request: PaymentTokenRequest) -> Result<PaymentToken, GatewayError> {
    info!("Simulating payment token request for account '{}'", self.account_id);
    if request.amount.cents() <= 0 {
      return Err(GatewayError::Rejected("Amount must be greater than zero".to_string()));
    }
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let token = format!("mock_tok_{}", Uuid::new_v4());
    Ok(PaymentToken {
      token,
      redirect_url: format!(
        "{}/mock-gateway/pay/{}",
        self.base_url.trim_end_matches('/'),
        request.reference
      ),
      expires_at: Utc::now() + Duration::minutes(TOKEN_LIFETIME_MINUTES),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use orderflow::model::Money;

  fn request(amount: Money) -> PaymentTokenRequest {
    PaymentTokenRequest {
      reference: "checkout-session-0001".to_string(),
      amount,
      currency: "USD".to_string(),
      description: "Order".to_string(),
      payer_email: "buyer@example.com".to_string(),
    }
  }

  #[tokio::test]
  async fn token_redirects_to_hosted_page_for_reference() {
    let gateway = MockPaymentGateway::new("acct", "http://localhost:8080/");
    let token = gateway.request_token(request(Money::from_major(270))).await.unwrap();
    assert!(token.token.starts_with("mock_tok_"));
    assert_eq!(
      token.redirect_url,
      "http://localhost:8080/mock-gateway/pay/checkout-session-0001"
    );
    assert!(token.expires_at > Utc::now());
  }

  #[tokio::test]
  async fn zero_amount_is_rejected() {
    let gateway = MockPaymentGateway::new("acct", "http://localhost:8080");
    let err = gateway.request_token(request(Money::ZERO)).await.unwrap_err();
    assert!(matches!(err, GatewayError::Rejected(_)));
  }
}
