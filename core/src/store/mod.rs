// orderflow/src/store/mod.rs

//! Persistence boundaries.
//!
//! Every backend must enforce two constraints itself rather than rely on the
//! callers' pre-checks:
//!  - a provider reference is attached to at most one order;
//!  - an owner has at most one non-cancelled order per business day.
//!
//! Violations are reported as [`StoreError::DuplicateReference`] and
//! [`StoreError::ActiveOrderExists`] respectively.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{
  CheckoutSession, DeliverySchedule, NewOrder, Order, OrderFilter, OrderId, OrderStatusRef, OwnerId, PaymentHold,
  SessionId, SessionUpdate, Status, StatusId,
};

pub mod memory;

pub use memory::{MemoryOrderStore, MemorySessionStore, MemoryStatusSource};

/// Backing store for the status directory.
#[async_trait]
pub trait StatusSource: Send + Sync {
  async fn load_statuses(&self) -> Result<Vec<Status>, StoreError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
  async fn insert(&self, order: NewOrder) -> Result<Order, StoreError>;

  async fn find(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

  async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>, StoreError>;

  /// Orders owned by `owner` matching `filter`, newest first.
  async fn list_for_owner(&self, owner: &OwnerId, filter: &OrderFilter) -> Result<Vec<Order>, StoreError>;

  /// Moves the order to `next`. When `expected` is set the write only applies
  /// if the order is still in that status, otherwise
  /// [`StoreError::StatusChanged`] is returned.
  async fn update_status(
    &self,
    id: OrderId,
    expected: Option<StatusId>,
    next: &OrderStatusRef,
    at: DateTime<Utc>,
  ) -> Result<Order, StoreError>;

  /// Stores the delivery appointment if the order is still in `expected`.
  async fn set_delivery_schedule(
    &self,
    id: OrderId,
    expected: StatusId,
    schedule: &DeliverySchedule,
    at: DateTime<Utc>,
  ) -> Result<Order, StoreError>;
}

#[async_trait]
pub trait CheckoutSessionStore: Send + Sync {
  /// Last write wins until the session is submitted. The returned session
  /// carries the bumped revision. A submitted session is left untouched and
  /// the write fails with [`StoreError::SessionLocked`].
  async fn upsert(&self, update: SessionUpdate, at: DateTime<Utc>) -> Result<CheckoutSession, StoreError>;

  async fn get(&self, id: &SessionId) -> Result<Option<CheckoutSession>, StoreError>;

  /// Ties the session to the buyer submitting it and, when given, stores the
  /// payment hold. [`StoreError::NotFound`] when the session does not exist,
  /// [`StoreError::SessionLocked`] when another owner already submitted it.
  async fn submit(
    &self,
    id: &SessionId,
    owner: &OwnerId,
    hold: Option<&PaymentHold>,
  ) -> Result<CheckoutSession, StoreError>;

  /// Removes sessions last written before `cutoff`; returns how many went away.
  async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}
