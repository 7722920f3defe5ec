// orderflow/src/session.rs

//! Checkout session synchronizer.
//!
//! The client debounces form edits and pushes each coalesced burst here; it
//! also forces one last sync right before asking for settlement. Only that
//! last one is awaited, and even then only for a bounded time.

use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn, Instrument};

use crate::calendar::Clock;
use crate::error::{OrderError, OrderResult, StoreError};
use crate::model::{CheckoutSession, OwnerId, PaymentHold, SessionId, SessionUpdate};
use crate::store::CheckoutSessionStore;

/// Default bound on the forced pre-payment sync.
pub const DEFAULT_FORCED_SYNC_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of the forced sync that precedes settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreSettlementSync {
  Synced { revision: u64 },
  /// The store did not answer in time; settlement uses the last stored snapshot.
  TimedOut,
  /// The store answered with an error; settlement uses the last stored snapshot.
  Failed,
  /// The session was submitted before; its stored snapshot is final.
  Locked,
}

#[derive(Clone)]
pub struct CheckoutSessionSynchronizer {
  store: Arc<dyn CheckoutSessionStore>,
  clock: Arc<dyn Clock>,
  forced_sync_timeout: Duration,
}

impl CheckoutSessionSynchronizer {
  pub fn new(store: Arc<dyn CheckoutSessionStore>, clock: Arc<dyn Clock>) -> Self {
    Self {
      store,
      clock,
      forced_sync_timeout: DEFAULT_FORCED_SYNC_TIMEOUT,
    }
  }

  pub fn with_forced_sync_timeout(mut self, timeout: Duration) -> Self {
    self.forced_sync_timeout = timeout;
    self
  }

  /// Idempotent upsert of the session mirror. Refused with
  /// [`OrderError::SessionLocked`] once the session was submitted for payment.
  #[instrument(name = "CheckoutSessionSynchronizer::sync", skip(self, update), fields(session_id = %update.session_id), err(Display))]
  pub async fn sync(&self, update: SessionUpdate) -> OrderResult<CheckoutSession> {
    let session_id = update.session_id.to_string();
    let session = self
      .store
      .upsert(update, self.clock.now())
      .await
      .map_err(|e| match e {
        StoreError::SessionLocked => OrderError::SessionLocked { session_id },
        other => OrderError::persistence("sync_checkout_session", other),
      })?;
    debug!(revision = session.revision, "Checkout session synced.");
    Ok(session)
  }

  /// Fire-and-forget sync. Failures are logged and never reach the caller.
  pub fn sync_detached(&self, update: SessionUpdate) -> JoinHandle<()> {
    let this = self.clone();
    let span = tracing::info_span!("checkout_session_detached_sync", session_id = %update.session_id);
    tokio::spawn(
      async move {
        if let Err(e) = this.sync(update).await {
          warn!(error = %e, "Background checkout session sync failed.");
        }
      }
      .instrument(span),
    )
  }

  /// The forced sync performed right before settlement.
  ///
  /// Bounded by the configured timeout. Neither a timeout nor a store error
  /// stops checkout; the caller settles from whatever snapshot is stored.
  #[instrument(name = "CheckoutSessionSynchronizer::sync_before_payment", skip(self, update), fields(session_id = %update.session_id))]
  pub async fn sync_before_payment(&self, update: SessionUpdate) -> PreSettlementSync {
    match tokio::time::timeout(self.forced_sync_timeout, self.sync(update)).await {
      Ok(Ok(session)) => PreSettlementSync::Synced {
        revision: session.revision,
      },
      Ok(Err(OrderError::SessionLocked { .. })) => {
        debug!("Session already submitted; keeping the stored snapshot.");
        PreSettlementSync::Locked
      }
      Ok(Err(e)) => {
        warn!(error = %e, "Pre-payment sync failed; settling from the last stored snapshot.");
        PreSettlementSync::Failed
      }
      Err(_) => {
        warn!(
          timeout_ms = self.forced_sync_timeout.as_millis() as u64,
          "Pre-payment sync timed out; settling from the last stored snapshot."
        );
        PreSettlementSync::TimedOut
      }
    }
  }

  /// Reads the session for settlement.
  #[instrument(name = "CheckoutSessionSynchronizer::consume", skip(self), fields(session_id = %session_id), err(Display))]
  pub async fn consume(&self, session_id: &SessionId) -> OrderResult<CheckoutSession> {
    self
      .store
      .get(session_id)
      .await
      .map_err(|e| OrderError::persistence("consume_checkout_session", e))?
      .ok_or_else(|| OrderError::SessionNotFound {
        session_id: session_id.to_string(),
      })
  }

  /// Records who submitted the session for payment, plus the frozen
  /// checkout when paying through the gateway.
  pub async fn submit(
    &self,
    session_id: &SessionId,
    owner: &OwnerId,
    hold: Option<&PaymentHold>,
  ) -> OrderResult<CheckoutSession> {
    self.store.submit(session_id, owner, hold).await.map_err(|e| match e {
      StoreError::NotFound => OrderError::SessionNotFound {
        session_id: session_id.to_string(),
      },
      StoreError::SessionLocked => OrderError::NotAuthorized {
        resource: format!("checkout session {}", session_id),
      },
      other => OrderError::persistence("submit_checkout_session", other),
    })
  }

  /// Drops sessions nobody touched within `max_age`.
  pub async fn purge_stale(&self, max_age: ChronoDuration) -> OrderResult<u64> {
    let cutoff = self.clock.now() - max_age;
    let purged = self
      .store
      .purge_older_than(cutoff)
      .await
      .map_err(|e| OrderError::persistence("purge_checkout_sessions", e))?;
    if purged > 0 {
      info!(purged, %cutoff, "Purged stale checkout sessions.");
    }
    Ok(purged)
  }
}
