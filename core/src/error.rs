// orderflow/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::model::{Order, OrderId};

/// Failures reported by a storage backend (orders, sessions, statuses).
///
/// Constraint violations get their own variants so callers can turn them into
/// typed "already exists" answers instead of opaque I/O errors.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Record not found")]
  NotFound,

  #[error("Provider reference '{reference}' is already attached to an order")]
  DuplicateReference { reference: String },

  #[error("Owner '{owner}' already has an active order for {business_day}")]
  ActiveOrderExists { owner: String, business_day: chrono::NaiveDate },

  #[error("Checkout session was already submitted and can no longer change")]
  SessionLocked,

  #[error("Order status changed concurrently (now '{current}')")]
  StatusChanged { current: String },

  #[error("Storage backend failure: {source}")]
  Backend {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for StoreError {
  fn from(err: AnyhowError) -> Self {
    StoreError::Backend { source: err }
  }
}

/// Failures reported by the hosted payment gateway client.
#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("Payment gateway rejected the request: {0}")]
  Rejected(String),

  #[error("Payment gateway unreachable: {source}")]
  Unreachable {
    #[source]
    source: AnyhowError,
  },
}

/// The error taxonomy returned by every core operation.
///
/// Each variant is meant to be mapped to its own user-facing message by the
/// transport layer; none of them should be collapsed into a generic failure.
#[derive(Debug, Error)]
pub enum OrderError {
  #[error("Validation failed: {0}")]
  Validation(String),

  #[error("An active order already exists today (order {})", .blocking_order.id)]
  DailyLimitExceeded { blocking_order: Box<Order> },

  #[error("Not authorized to act on {resource}")]
  NotAuthorized { resource: String },

  #[error("Order {order_id} cannot be cancelled while '{status}'")]
  NotCancellable { order_id: OrderId, status: String },

  #[error("Settlement reference '{reference}' was already used")]
  DuplicateSettlement { reference: String },

  #[error("Payment provider unavailable: {source}")]
  ProviderUnavailable {
    #[source]
    source: GatewayError,
  },

  #[error("Persistence failed during {operation}: {source}")]
  PersistenceFailed {
    operation: &'static str,
    #[source]
    source: StoreError,
  },

  #[error("Checkout session '{session_id}' not found")]
  SessionNotFound { session_id: String },

  #[error("Checkout session '{session_id}' was already submitted for payment")]
  SessionLocked { session_id: String },

  #[error("Order {order_id} not found")]
  OrderNotFound { order_id: OrderId },

  #[error("Order {order_id} cannot move from '{from}' to '{to}'")]
  InvalidTransition { order_id: OrderId, from: String, to: String },
}

impl OrderError {
  pub(crate) fn persistence(operation: &'static str, source: StoreError) -> Self {
    OrderError::PersistenceFailed { operation, source }
  }

  pub(crate) fn not_authorized_for_order(order_id: OrderId) -> Self {
    OrderError::NotAuthorized {
      resource: format!("order {}", order_id),
    }
  }

  /// Stable machine-readable identifier for the variant.
  pub fn kind(&self) -> &'static str {
    match self {
      OrderError::Validation(_) => "validation_error",
      OrderError::DailyLimitExceeded { .. } => "daily_limit_exceeded",
      OrderError::NotAuthorized { .. } => "not_authorized",
      OrderError::NotCancellable { .. } => "not_cancellable",
      OrderError::DuplicateSettlement { .. } => "duplicate_settlement",
      OrderError::ProviderUnavailable { .. } => "provider_unavailable",
      OrderError::PersistenceFailed { .. } => "persistence_failed",
      OrderError::SessionNotFound { .. } => "session_not_found",
      OrderError::SessionLocked { .. } => "session_locked",
      OrderError::OrderNotFound { .. } => "order_not_found",
      OrderError::InvalidTransition { .. } => "invalid_transition",
    }
  }

  /// Whether retrying the same call may succeed.
  pub fn is_retryable(&self) -> bool {
    matches!(
      self,
      OrderError::ProviderUnavailable { .. } | OrderError::PersistenceFailed { .. }
    )
  }
}

pub type OrderResult<T, E = OrderError> = std::result::Result<T, E>;
