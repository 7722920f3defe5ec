// orderflow/src/settings.rs

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::{DeliveryMethod, Money};
use crate::session::DEFAULT_FORCED_SYNC_TIMEOUT;

/// Delivery charge per method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRates {
  pub pickup: Money,
  pub domestic: Money,
}

impl DeliveryRates {
  pub fn cost_for(&self, method: DeliveryMethod) -> Money {
    match method {
      DeliveryMethod::Pickup => self.pickup,
      DeliveryMethod::Domestic => self.domestic,
    }
  }
}

impl Default for DeliveryRates {
  fn default() -> Self {
    Self {
      pickup: Money::ZERO,
      domestic: Money::from_major(20),
    }
  }
}

/// Knobs the service binary fills from its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
  pub currency: String,
  pub delivery_rates: DeliveryRates,
  pub forced_sync_timeout: Duration,
}

impl Default for CheckoutSettings {
  fn default() -> Self {
    Self {
      currency: "USD".to_string(),
      delivery_rates: DeliveryRates::default(),
      forced_sync_timeout: DEFAULT_FORCED_SYNC_TIMEOUT,
    }
  }
}
