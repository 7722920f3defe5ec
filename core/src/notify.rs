// orderflow/src/notify.rs

//! Order notifications, dispatched through an outbox.
//!
//! Order creation only enqueues; delivery happens on a separate task so that
//! email latency and failures never reach the write path. The customer
//! confirmation and the admin alert are sent independently of each other.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::model::{
  ContactDetails, DeliveryMethod, DeliverySchedule, LineItem, Order, OrderId, OwnerId, PaymentPath, PriceBreakdown,
  ShippingAddress,
};

/// Everything a confirmation or alert needs, copied out of the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderNotification {
  pub order_id: OrderId,
  pub order_number: Option<String>,
  pub owner: OwnerId,
  pub contact: ContactDetails,
  pub delivery_method: DeliveryMethod,
  pub shipping_address: Option<ShippingAddress>,
  pub delivery_schedule: Option<DeliverySchedule>,
  pub line_items: Vec<LineItem>,
  pub pricing: PriceBreakdown,
  pub currency: String,
  pub payment_path: PaymentPath,
}

impl OrderNotification {
  pub fn from_order(order: &Order) -> Self {
    Self {
      order_id: order.id,
      order_number: order.order_number.clone(),
      owner: order.owner.clone(),
      contact: order.buyer.contact.clone(),
      delivery_method: order.buyer.delivery_method,
      shipping_address: order.buyer.shipping_address.clone(),
      delivery_schedule: order.delivery_schedule.clone(),
      line_items: order.line_items.clone(),
      pricing: order.pricing,
      currency: order.currency.clone(),
      payment_path: order.payment.path,
    }
  }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
  async fn send_customer_confirmation(&self, notification: &OrderNotification) -> anyhow::Result<()>;

  async fn send_admin_alert(&self, notification: &OrderNotification) -> anyhow::Result<()>;
}

/// Non-blocking hand-off point used after an order is committed.
pub trait NotificationOutbox: Send + Sync {
  fn enqueue(&self, notification: OrderNotification);
}

/// Outbox backed by a bounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelOutbox {
  sender: mpsc::Sender<OrderNotification>,
}

impl ChannelOutbox {
  pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<OrderNotification>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (Self { sender }, receiver)
  }
}

impl NotificationOutbox for ChannelOutbox {
  fn enqueue(&self, notification: OrderNotification) {
    let order_id = notification.order_id;
    match self.sender.try_send(notification) {
      Ok(()) => debug!(order_id, "Order notification queued."),
      Err(mpsc::error::TrySendError::Full(_)) => {
        warn!(order_id, "Notification outbox full; dropping order notification.")
      }
      Err(mpsc::error::TrySendError::Closed(_)) => {
        warn!(order_id, "Notification outbox closed; dropping order notification.")
      }
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
  pub customer_sent: bool,
  pub admin_sent: bool,
}

/// Drains an outbox receiver into a [`NotificationSink`].
pub struct OutboxDispatcher;

impl OutboxDispatcher {
  /// Runs until every [`ChannelOutbox`] clone has been dropped.
  pub fn spawn(sink: Arc<dyn NotificationSink>, mut receiver: mpsc::Receiver<OrderNotification>) -> JoinHandle<()> {
    tokio::spawn(async move {
      while let Some(notification) = receiver.recv().await {
        Self::deliver(sink.as_ref(), &notification).await;
      }
      info!("Notification outbox closed; dispatcher stopping.");
    })
  }

  /// Sends both messages concurrently; one failing does not stop the other.
  #[instrument(name = "OutboxDispatcher::deliver", skip_all, fields(order_id = notification.order_id))]
  pub async fn deliver(sink: &dyn NotificationSink, notification: &OrderNotification) -> DeliveryReport {
    let (customer, admin) = tokio::join!(
      sink.send_customer_confirmation(notification),
      sink.send_admin_alert(notification)
    );
    if let Err(e) = &customer {
      warn!(error = %e, "Customer confirmation not delivered.");
    }
    if let Err(e) = &admin {
      warn!(error = %e, "Admin alert not delivered.");
    }
    DeliveryReport {
      customer_sent: customer.is_ok(),
      admin_sent: admin.is_ok(),
    }
  }
}
