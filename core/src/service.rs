// orderflow/src/service.rs

//! `OrderService`: the transport-agnostic entry point the storefront talks to.

use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::admin::AdminOrderDesk;
use crate::calendar::{BusinessCalendar, Clock};
use crate::cancellation::CancellationPolicy;
use crate::catalog::Catalog;
use crate::error::{OrderError, OrderResult};
use crate::gateway::{GatewayConfirmation, PaymentGateway};
use crate::limit::{DailyLimitGuard, LimitDecision};
use crate::model::{CheckoutSession, Order, OrderFilter, OrderId, OwnerId, PaymentPath, SessionId, SessionUpdate, Status};
use crate::notify::NotificationOutbox;
use crate::session::CheckoutSessionSynchronizer;
use crate::settings::CheckoutSettings;
use crate::settlement::{GatewayOutcome, PaymentSettlementResolver, Settlement, SettlementDeps};
use crate::status::StatusDirectory;
use crate::store::{CheckoutSessionStore, OrderRepository};

/// Collaborators the service is assembled from.
pub struct ServiceDeps {
  pub orders: Arc<dyn OrderRepository>,
  pub sessions: Arc<dyn CheckoutSessionStore>,
  pub statuses: Arc<StatusDirectory>,
  pub catalog: Arc<dyn Catalog>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub outbox: Arc<dyn NotificationOutbox>,
  pub clock: Arc<dyn Clock>,
  pub calendar: BusinessCalendar,
  pub settings: CheckoutSettings,
}

pub struct OrderService {
  orders: Arc<dyn OrderRepository>,
  statuses: Arc<StatusDirectory>,
  limit: DailyLimitGuard,
  cancellation: CancellationPolicy,
  sessions: CheckoutSessionSynchronizer,
  settlement: PaymentSettlementResolver,
  admin: AdminOrderDesk,
}

impl OrderService {
  pub fn new(deps: ServiceDeps) -> Self {
    let limit = DailyLimitGuard::new(deps.orders.clone(), deps.calendar, deps.clock.clone());
    let sessions = CheckoutSessionSynchronizer::new(deps.sessions, deps.clock.clone())
      .with_forced_sync_timeout(deps.settings.forced_sync_timeout);
    let cancellation = CancellationPolicy::new(deps.orders.clone(), deps.statuses.clone(), deps.clock.clone());
    let admin = AdminOrderDesk::new(deps.orders.clone(), deps.statuses.clone(), deps.clock.clone());
    let settlement = PaymentSettlementResolver::new(SettlementDeps {
      sessions: sessions.clone(),
      orders: deps.orders.clone(),
      limit: limit.clone(),
      statuses: deps.statuses.clone(),
      catalog: deps.catalog,
      gateway: deps.gateway,
      outbox: deps.outbox,
      clock: deps.clock,
      settings: deps.settings,
    });

    Self {
      orders: deps.orders,
      statuses: deps.statuses,
      limit,
      cancellation,
      sessions,
      settlement,
      admin,
    }
  }

  pub fn sessions(&self) -> &CheckoutSessionSynchronizer {
    &self.sessions
  }

  /// The buyer's orders, newest first.
  #[instrument(name = "OrderService::list_orders_for_owner", skip(self), fields(owner = %owner), err(Display))]
  pub async fn list_orders_for_owner(&self, owner: &OwnerId, filter: &OrderFilter) -> OrderResult<Vec<Order>> {
    let orders = self
      .orders
      .list_for_owner(owner, filter)
      .await
      .map_err(|e| OrderError::persistence("list_orders_for_owner", e))?;
    debug!(count = orders.len(), "Listed orders for owner.");
    Ok(orders)
  }

  pub async fn can_place_order(&self, owner: &OwnerId) -> LimitDecision {
    self.limit.can_place_order(owner).await
  }

  /// Settles a checkout session.
  ///
  /// When the client sends its final form state along, that state is synced
  /// first (bounded by the forced-sync timeout) so settlement reads it.
  #[instrument(
    name = "OrderService::create_order_from_session",
    skip(self, final_update),
    fields(owner = %owner, session_id = %session_id, path = %path),
    err(Display)
  )]
  pub async fn create_order_from_session(
    &self,
    owner: &OwnerId,
    session_id: &SessionId,
    path: PaymentPath,
    final_update: Option<SessionUpdate>,
  ) -> OrderResult<Settlement> {
    if let Some(update) = final_update {
      if &update.session_id != session_id {
        return Err(OrderError::Validation(
          "Final checkout state belongs to a different session.".to_string(),
        ));
      }
      // Settlement proceeds on the last stored snapshot whatever the outcome.
      let outcome = self.sessions.sync_before_payment(update).await;
      debug!(?outcome, "Pre-payment sync finished.");
    }
    self.settlement.settle(owner, session_id, path).await
  }

  pub async fn confirm_gateway_payment(&self, confirmation: GatewayConfirmation) -> OrderResult<GatewayOutcome> {
    self.settlement.confirm_gateway_payment(confirmation).await
  }

  pub async fn cancel_order(&self, order_id: OrderId, owner: &OwnerId) -> OrderResult<Order> {
    self.cancellation.cancel(order_id, owner).await
  }

  pub async fn sync_checkout_session(&self, update: SessionUpdate) -> OrderResult<CheckoutSession> {
    self.sessions.sync(update).await
  }

  pub async fn admin_transition_status(&self, order_id: OrderId, new_status: &str) -> OrderResult<Order> {
    self.admin.transition_status(order_id, new_status).await
  }

  pub async fn admin_set_delivery_schedule(
    &self,
    order_id: OrderId,
    date: NaiveDate,
    time: Option<NaiveTime>,
    notes: Option<String>,
  ) -> OrderResult<Order> {
    self.admin.set_delivery_schedule(order_id, date, time, notes).await
  }

  pub fn list_statuses(&self) -> Vec<Status> {
    self.statuses.list_active_statuses()
  }

  pub async fn refresh_statuses(&self) -> bool {
    self.statuses.refresh().await
  }
}
