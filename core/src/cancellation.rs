// orderflow/src/cancellation.rs

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::calendar::Clock;
use crate::error::{OrderError, OrderResult, StoreError};
use crate::model::{status_names, Order, OrderId, OwnerId};
use crate::status::StatusDirectory;
use crate::store::OrderRepository;

/// Buyer-initiated cancellation.
///
/// Only `received` and `confirmed` orders can be cancelled by their owner;
/// later stages involve logistics and go through the back office. There is
/// no way back out of `cancelled`.
#[derive(Clone)]
pub struct CancellationPolicy {
  orders: Arc<dyn OrderRepository>,
  statuses: Arc<StatusDirectory>,
  clock: Arc<dyn Clock>,
}

impl CancellationPolicy {
  pub fn new(orders: Arc<dyn OrderRepository>, statuses: Arc<StatusDirectory>, clock: Arc<dyn Clock>) -> Self {
    Self { orders, statuses, clock }
  }

  #[instrument(name = "CancellationPolicy::cancel", skip(self), fields(owner = %requesting_owner), err(Display))]
  pub async fn cancel(&self, order_id: OrderId, requesting_owner: &OwnerId) -> OrderResult<Order> {
    let order = self
      .orders
      .find(order_id)
      .await
      .map_err(|e| OrderError::persistence("cancel_order.lookup", e))?;

    // A missing order and someone else's order look the same to the caller.
    let order = match order {
      Some(order) if &order.owner == requesting_owner => order,
      _ => {
        warn!(order_id, "Cancellation refused: order missing or owned by someone else.");
        return Err(OrderError::not_authorized_for_order(order_id));
      }
    };

    if !order.status.is_cancellable() {
      return Err(OrderError::NotCancellable {
        order_id,
        status: order.status.name.clone(),
      });
    }

    let cancelled = self.statuses.find_or_refresh(status_names::CANCELLED).await.ok_or_else(|| {
      OrderError::persistence(
        "cancel_order.status_lookup",
        StoreError::Backend {
          source: anyhow::anyhow!("status directory has no '{}' status", status_names::CANCELLED),
        },
      )
    })?;

    match self
      .orders
      .update_status(order_id, Some(order.status.id), &cancelled.reference(), self.clock.now())
      .await
    {
      Ok(updated) => {
        info!(order_id, previous = %order.status, "Order cancelled by owner.");
        Ok(updated)
      }
      // Someone moved the order on between our read and the write.
      Err(StoreError::StatusChanged { current }) => Err(OrderError::NotCancellable {
        order_id,
        status: current,
      }),
      Err(StoreError::NotFound) => Err(OrderError::not_authorized_for_order(order_id)),
      Err(e) => Err(OrderError::persistence("cancel_order.update", e)),
    }
  }
}
