// storefront/src/models/checkout_session.rs

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use orderflow::model::{CartLine, CheckoutForm, CheckoutSession, Money, OwnerId, PaymentHold, SessionId};
use orderflow::StoreError;

#[derive(Debug, Clone, FromRow)]
pub struct CheckoutSessionRow {
  pub session_id: String,
  pub form: Json<CheckoutForm>,
  pub cart: Json<Vec<CartLine>>,
  pub computed_total_cents: Option<i64>,
  pub owner_id: Option<String>,
  pub payment_hold: Option<Json<PaymentHold>>,
  pub revision: i64,
  pub updated_at: DateTime<Utc>,
}

impl TryFrom<CheckoutSessionRow> for CheckoutSession {
  type Error = StoreError;

  fn try_from(row: CheckoutSessionRow) -> Result<Self, Self::Error> {
    let unreadable = |e: orderflow::OrderError| StoreError::Backend {
      source: anyhow::anyhow!("checkout session row is unreadable: {}", e),
    };
    let revision = u64::try_from(row.revision).map_err(|_| StoreError::Backend {
      source: anyhow::anyhow!(
        "checkout session {} has a negative revision {}",
        row.session_id,
        row.revision
      ),
    })?;
    Ok(CheckoutSession {
      session_id: SessionId::new(row.session_id).map_err(unreadable)?,
      form: row.form.0,
      cart: row.cart.0,
      computed_total: row.computed_total_cents.map(Money::from_cents),
      owner: row.owner_id.map(OwnerId::new).transpose().map_err(unreadable)?,
      payment_hold: row.payment_hold.map(|hold| hold.0),
      revision,
      updated_at: row.updated_at,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn row(revision: i64) -> CheckoutSessionRow {
    CheckoutSessionRow {
      session_id: "checkout-session-0001".to_string(),
      form: Json(CheckoutForm::default()),
      cart: Json(Vec::new()),
      computed_total_cents: Some(27000),
      owner_id: Some("buyer-1".to_string()),
      payment_hold: None,
      revision,
      updated_at: Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
    }
  }

  #[test]
  fn stored_row_becomes_session() {
    let session = CheckoutSession::try_from(row(3)).unwrap();
    assert_eq!(session.revision, 3);
    assert_eq!(session.computed_total, Some(Money::from_cents(27000)));
    assert_eq!(session.owner.as_ref().map(OwnerId::as_str), Some("buyer-1"));
    assert!(session.payment_hold.is_none());
  }

  #[test]
  fn negative_revision_is_a_backend_error() {
    let err = CheckoutSession::try_from(row(-1)).unwrap_err();
    assert!(matches!(err, StoreError::Backend { .. }));
    assert!(err.to_string().contains("negative revision"));
  }
}
