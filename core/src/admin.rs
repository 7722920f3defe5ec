// orderflow/src/admin.rs

//! Back-office operations: moving orders along the lifecycle and booking
//! delivery appointments.

use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::calendar::Clock;
use crate::error::{OrderError, OrderResult, StoreError};
use crate::model::{DeliverySchedule, Order, OrderId};
use crate::store::OrderRepository;
use crate::status::StatusDirectory;

pub struct AdminOrderDesk {
  orders: Arc<dyn OrderRepository>,
  statuses: Arc<StatusDirectory>,
  clock: Arc<dyn Clock>,
}

impl AdminOrderDesk {
  pub fn new(orders: Arc<dyn OrderRepository>, statuses: Arc<StatusDirectory>, clock: Arc<dyn Clock>) -> Self {
    Self { orders, statuses, clock }
  }

  async fn load(&self, order_id: OrderId) -> OrderResult<Order> {
    self
      .orders
      .find(order_id)
      .await
      .map_err(|e| OrderError::persistence("admin_load_order", e))?
      .ok_or(OrderError::OrderNotFound { order_id })
  }

  #[instrument(name = "AdminOrderDesk::transition_status", skip(self), err(Display))]
  pub async fn transition_status(&self, order_id: OrderId, new_status: &str) -> OrderResult<Order> {
    let target = self
      .statuses
      .find_or_refresh(new_status)
      .await
      .ok_or_else(|| OrderError::Validation(format!("Unknown order status '{}'.", new_status)))?
      .reference();

    let order = self.load(order_id).await?;
    if order.status.id == target.id {
      return Ok(order);
    }
    if order.status.is_terminal() {
      return Err(OrderError::InvalidTransition {
        order_id,
        from: order.status.name,
        to: target.name,
      });
    }

    let from = order.status.clone();
    match self
      .orders
      .update_status(order_id, Some(from.id), &target, self.clock.now())
      .await
    {
      Ok(updated) => {
        info!(from = %from, to = %updated.status, "Order status changed by admin.");
        Ok(updated)
      }
      Err(StoreError::StatusChanged { current }) => Err(OrderError::InvalidTransition {
        order_id,
        from: current,
        to: target.name,
      }),
      Err(StoreError::NotFound) => Err(OrderError::OrderNotFound { order_id }),
      Err(e) => Err(OrderError::persistence("admin_transition_status", e)),
    }
  }

  #[instrument(name = "AdminOrderDesk::set_delivery_schedule", skip(self, notes), err(Display))]
  pub async fn set_delivery_schedule(
    &self,
    order_id: OrderId,
    date: NaiveDate,
    time: Option<NaiveTime>,
    notes: Option<String>,
  ) -> OrderResult<Order> {
    let order = self.load(order_id).await?;
    if !order.status.is_appointment() {
      return Err(OrderError::InvalidTransition {
        order_id,
        from: order.status.name,
        to: "delivery_scheduled".to_string(),
      });
    }

    let schedule = DeliverySchedule {
      date,
      time,
      notes: notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
    };
    match self
      .orders
      .set_delivery_schedule(order_id, order.status.id, &schedule, self.clock.now())
      .await
    {
      Ok(updated) => {
        info!(%date, "Delivery appointment booked.");
        Ok(updated)
      }
      Err(StoreError::StatusChanged { current }) => Err(OrderError::InvalidTransition {
        order_id,
        from: current,
        to: "delivery_scheduled".to_string(),
      }),
      Err(StoreError::NotFound) => Err(OrderError::OrderNotFound { order_id }),
      Err(e) => Err(OrderError::persistence("admin_set_delivery_schedule", e)),
    }
  }
}
