// orderflow/src/model/status.rs

//! Order lifecycle stages.
//!
//! Statuses are seeded data; the core only ever refers to them through the
//! stable names below.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type StatusId = i32;

/// Stable status names used in code. Display labels live on [`Status`].
pub mod names {
  pub const RECEIVED: &str = "received";
  pub const CONFIRMED: &str = "confirmed";
  pub const APPOINTMENT: &str = "appointment";
  pub const SHIPPED: &str = "shipped";
  pub const DELIVERED: &str = "delivered";
  pub const CANCELLED: &str = "cancelled";
}

/// Statuses from which the buyer may still cancel on their own.
pub const CANCELLABLE_STATUSES: [&str; 2] = [names::RECEIVED, names::CONFIRMED];

/// Id used by the hard-coded `received` fallback. Matches the seed data.
pub const FALLBACK_RECEIVED_ID: StatusId = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
  pub id: StatusId,
  pub name: String,
  pub label: String,
  pub color: Option<String>,
  pub icon: Option<String>,
  pub position: i32,
  pub active: bool,
}

impl Status {
  /// The minimal default served when status metadata is unavailable.
  pub fn fallback_received() -> Self {
    Status {
      id: FALLBACK_RECEIVED_ID,
      name: names::RECEIVED.to_string(),
      label: "Received".to_string(),
      color: None,
      icon: None,
      position: 0,
      active: true,
    }
  }

  pub fn reference(&self) -> OrderStatusRef {
    OrderStatusRef {
      id: self.id,
      name: self.name.clone(),
    }
  }

  pub fn is_cancelled(&self) -> bool {
    self.name == names::CANCELLED
  }
}

/// The status an order currently points at. Orders carry the name alongside
/// the id so that classification never depends on the status cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderStatusRef {
  pub id: StatusId,
  pub name: String,
}

impl OrderStatusRef {
  pub fn is_cancelled(&self) -> bool {
    self.name == names::CANCELLED
  }

  /// Cancelled and delivered end the lifecycle.
  pub fn is_terminal(&self) -> bool {
    self.name == names::CANCELLED || self.name == names::DELIVERED
  }

  pub fn is_cancellable(&self) -> bool {
    CANCELLABLE_STATUSES.contains(&self.name.as_str())
  }

  pub fn is_appointment(&self) -> bool {
    self.name == names::APPOINTMENT
  }
}

impl fmt::Display for OrderStatusRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.name)
  }
}

/// Lookup key for the status directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusKey {
  Id(StatusId),
  Name(String),
}

impl StatusKey {
  pub fn matches(&self, status: &Status) -> bool {
    match self {
      StatusKey::Id(id) => status.id == *id,
      StatusKey::Name(name) => status.name == *name,
    }
  }
}

impl From<&str> for StatusKey {
  fn from(name: &str) -> Self {
    StatusKey::Name(name.to_string())
  }
}

impl From<String> for StatusKey {
  fn from(name: String) -> Self {
    StatusKey::Name(name)
  }
}

impl From<StatusId> for StatusKey {
  fn from(id: StatusId) -> Self {
    StatusKey::Id(id)
  }
}

impl fmt::Display for StatusKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StatusKey::Id(id) => write!(f, "#{}", id),
      StatusKey::Name(name) => f.write_str(name),
    }
  }
}
