// storefront/src/services/email_mock.rs
use anyhow::{bail, Result};
use async_trait::async_trait;
use orderflow::{NotificationSink, OrderNotification};
use tracing::{info, instrument};

/// Recipients under this domain simulate a hard bounce.
const BOUNCING_DOMAIN: &str = "@bounce.test";

/// Logs emails instead of sending them.
#[derive(Debug, Clone)]
pub struct MockEmailSink {
  sender: String,
  admin_address: String,
}

impl MockEmailSink {
  pub fn new(sender: impl Into<String>, admin_address: impl Into<String>) -> Self {
    Self {
      sender: sender.into(),
      admin_address: admin_address.into(),
    }
  }

  /// Returns the simulated message id.
  async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String> {
    info!(
      "Simulating sending email: To='{}', From='{}', Subject='{}'",
      to, self.sender, subject
    );
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    if to.to_lowercase().ends_with(BOUNCING_DOMAIN) {
      tracing::warn!("Simulated bounce for recipient: {}", to);
      bail!("mailbox {} rejected the message", to);
    }

    let message_id = format!("mock_email_{}", uuid::Uuid::new_v4());
    info!(message_id = %message_id, body_len = body.len(), "Mock email sent.");
    Ok(message_id)
  }
}

fn order_label(notification: &OrderNotification) -> String {
  notification
    .order_number
    .clone()
    .unwrap_or_else(|| format!("#{}", notification.order_id))
}

fn summary(notification: &OrderNotification) -> String {
  let mut body = String::new();
  for item in &notification.line_items {
    body.push_str(&format!("{} x {} @ {}\n", item.quantity, item.name, item.unit_price));
  }
  body.push_str(&format!(
    "Subtotal {}\nDelivery {}\nDiscount {}\nTotal {} {}\nPayment: {}\n",
    notification.pricing.subtotal,
    notification.pricing.delivery_cost,
    notification.pricing.discount,
    notification.pricing.total,
    notification.currency,
    notification.payment_path
  ));
  if let Some(address) = &notification.shipping_address {
    body.push_str(&format!(
      "Ship to: {}, {}, {} {}\n",
      address.street, address.city, address.province, address.postal_code
    ));
  }
  body
}

#[async_trait]
impl NotificationSink for MockEmailSink {
  #[instrument(name = "MockEmailSink::send_customer_confirmation", skip_all, fields(order_id = notification.order_id))]
  async fn send_customer_confirmation(&self, notification: &OrderNotification) -> Result<()> {
    let subject = format!("Your order {} was received", order_label(notification));
    let body = format!("Hi {},\n\n{}", notification.contact.full_name, summary(notification));
    self.send(&notification.contact.email, &subject, &body).await.map(|_| ())
  }

  #[instrument(name = "MockEmailSink::send_admin_alert", skip_all, fields(order_id = notification.order_id))]
  async fn send_admin_alert(&self, notification: &OrderNotification) -> Result<()> {
    let subject = format!("New order {} from {}", order_label(notification), notification.owner);
    let body = format!(
      "Buyer: {} <{}> {}\nDelivery: {:?}\n{}",
      notification.contact.full_name,
      notification.contact.email,
      notification.contact.phone,
      notification.delivery_method,
      summary(notification)
    );
    self.send(&self.admin_address, &subject, &body).await.map(|_| ())
  }
}
