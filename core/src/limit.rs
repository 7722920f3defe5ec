// orderflow/src/limit.rs

//! Daily limit guard: at most one live order per owner per business day.
//!
//! Cancelling today's order gives the allowance back. Any number of cancelled
//! orders on the same day carry no penalty.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::calendar::{BusinessCalendar, Clock};
use crate::error::{OrderError, OrderResult};
use crate::model::{Order, OrderFilter, OwnerId};
use crate::store::OrderRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitReason {
  NoOrdersToday,
  OnlyCancelledToday,
  ActiveOrderExists,
  /// The order store could not be read; the check was skipped.
  StoreUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitDecision {
  pub allowed: bool,
  pub blocking_order: Option<Order>,
  pub reason: LimitReason,
}

impl LimitDecision {
  fn allow(reason: LimitReason) -> Self {
    Self {
      allowed: true,
      blocking_order: None,
      reason,
    }
  }

  fn deny(blocking: Order) -> Self {
    Self {
      allowed: false,
      blocking_order: Some(blocking),
      reason: LimitReason::ActiveOrderExists,
    }
  }
}

#[derive(Clone)]
pub struct DailyLimitGuard {
  orders: Arc<dyn OrderRepository>,
  calendar: BusinessCalendar,
  clock: Arc<dyn Clock>,
}

impl DailyLimitGuard {
  pub fn new(orders: Arc<dyn OrderRepository>, calendar: BusinessCalendar, clock: Arc<dyn Clock>) -> Self {
    Self { orders, calendar, clock }
  }

  pub fn calendar(&self) -> BusinessCalendar {
    self.calendar
  }

  /// Decides whether `owner` may create an order right now.
  ///
  /// An unreachable store yields `allowed = true`: a missed duplicate is
  /// cheaper than blocking someone's only order of the day.
  #[instrument(name = "DailyLimitGuard::can_place_order", skip(self), fields(owner = %owner))]
  pub async fn can_place_order(&self, owner: &OwnerId) -> LimitDecision {
    let (start, end) = self.calendar.day_window(self.clock.now());
    let todays = match self
      .orders
      .list_for_owner(owner, &OrderFilter::created_within(start, end))
      .await
    {
      Ok(orders) => orders,
      Err(e) => {
        warn!(error = %e, "Order store unavailable during daily limit check; allowing.");
        return LimitDecision::allow(LimitReason::StoreUnavailable);
      }
    };

    if todays.is_empty() {
      return LimitDecision::allow(LimitReason::NoOrdersToday);
    }

    let (cancelled, active): (Vec<Order>, Vec<Order>) = todays.into_iter().partition(|o| o.status.is_cancelled());
    match active.into_iter().max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))) {
      Some(latest) => {
        debug!(blocking_order = latest.id, "Active order already placed today.");
        LimitDecision::deny(latest)
      }
      None => {
        debug!(cancelled = cancelled.len(), "Only cancelled orders today.");
        LimitDecision::allow(LimitReason::OnlyCancelledToday)
      }
    }
  }

  /// [`can_place_order`](Self::can_place_order) as a typed error for write paths.
  pub async fn enforce(&self, owner: &OwnerId) -> OrderResult<()> {
    let decision = self.can_place_order(owner).await;
    match decision.blocking_order {
      Some(blocking) if !decision.allowed => Err(OrderError::DailyLimitExceeded {
        blocking_order: Box::new(blocking),
      }),
      _ => Ok(()),
    }
  }
}
