// storefront/src/db/sessions.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};

use orderflow::model::{CheckoutSession, OwnerId, PaymentHold, SessionId, SessionUpdate};
use orderflow::{CheckoutSessionStore, StoreError};

use super::backend;
use crate::models::CheckoutSessionRow;

const SESSION_COLUMNS: &str =
  "session_id, form, cart, computed_total_cents, owner_id, payment_hold, revision, updated_at";

pub struct PgCheckoutSessionStore {
  pool: PgPool,
}

impl PgCheckoutSessionStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl CheckoutSessionStore for PgCheckoutSessionStore {
  #[instrument(name = "PgCheckoutSessionStore::upsert", skip(self, update), fields(session_id = %update.session_id), err(Display))]
  async fn upsert(&self, update: SessionUpdate, at: DateTime<Utc>) -> Result<CheckoutSession, StoreError> {
    // A submitted session matches no row in the conflict branch and stays as it is.
    let sql = format!(
      "INSERT INTO checkout_sessions (session_id, form, cart, computed_total_cents, owner_id, revision, updated_at) \
       VALUES ($1, $2, $3, $4, NULL, 1, $5) \
       ON CONFLICT (session_id) DO UPDATE SET \
         form = EXCLUDED.form, \
         cart = EXCLUDED.cart, \
         computed_total_cents = EXCLUDED.computed_total_cents, \
         revision = checkout_sessions.revision + 1, \
         updated_at = EXCLUDED.updated_at \
       WHERE checkout_sessions.owner_id IS NULL \
       RETURNING {}",
      SESSION_COLUMNS
    );
    let row = sqlx::query_as::<_, CheckoutSessionRow>(&sql)
      .bind(update.session_id.as_str())
      .bind(Json(&update.form))
      .bind(Json(&update.cart))
      .bind(update.computed_total.map(|m| m.cents()))
      .bind(at)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?
      .ok_or(StoreError::SessionLocked)?;
    debug!(revision = row.revision, "Checkout session written.");
    CheckoutSession::try_from(row)
  }

  async fn get(&self, id: &SessionId) -> Result<Option<CheckoutSession>, StoreError> {
    let sql = format!("SELECT {} FROM checkout_sessions WHERE session_id = $1", SESSION_COLUMNS);
    let row = sqlx::query_as::<_, CheckoutSessionRow>(&sql)
      .bind(id.as_str())
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    row.map(CheckoutSession::try_from).transpose()
  }

  #[instrument(name = "PgCheckoutSessionStore::submit", skip(self, hold), fields(holds_payment = hold.is_some()), err(Display))]
  async fn submit(
    &self,
    id: &SessionId,
    owner: &OwnerId,
    hold: Option<&PaymentHold>,
  ) -> Result<CheckoutSession, StoreError> {
    let sql = format!(
      "UPDATE checkout_sessions SET owner_id = $2, payment_hold = COALESCE($3, payment_hold) \
       WHERE session_id = $1 AND (owner_id IS NULL OR owner_id = $2) \
       RETURNING {}",
      SESSION_COLUMNS
    );
    let row = sqlx::query_as::<_, CheckoutSessionRow>(&sql)
      .bind(id.as_str())
      .bind(owner.as_str())
      .bind(hold.map(Json))
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;

    match row {
      Some(row) => CheckoutSession::try_from(row),
      // Either missing or bound to someone else.
      None => match self.get(id).await? {
        Some(_) => Err(StoreError::SessionLocked),
        None => Err(StoreError::NotFound),
      },
    }
  }

  #[instrument(name = "PgCheckoutSessionStore::purge_older_than", skip(self), err(Display))]
  async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM checkout_sessions WHERE updated_at < $1")
      .bind(cutoff)
      .execute(&self.pool)
      .await
      .map_err(backend)?;
    Ok(result.rows_affected())
  }
}
