// orderflow/src/store/memory.rs

//! In-process backends. No persistence across restarts; used by tests,
//! benchmarks and local runs without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

use super::{CheckoutSessionStore, OrderRepository, StatusSource};
use crate::error::StoreError;
use crate::model::{
  status_names, CheckoutSession, DeliverySchedule, NewOrder, Order, OrderFilter, OrderId, OrderStatusRef, OwnerId,
  PaymentHold, SessionId, SessionUpdate, Status, StatusId,
};

/// Serves a fixed status set.
#[derive(Debug, Clone)]
pub struct MemoryStatusSource {
  statuses: Vec<Status>,
}

impl MemoryStatusSource {
  pub fn new(statuses: Vec<Status>) -> Self {
    Self { statuses }
  }

  /// The six lifecycle stages, with the same ids as the database seed.
  pub fn seeded() -> Self {
    let seed = [
      (1, status_names::RECEIVED, "Received", "#6c757d", "inbox"),
      (2, status_names::CONFIRMED, "Confirmed", "#0d6efd", "check"),
      (3, status_names::APPOINTMENT, "Appointment scheduled", "#6f42c1", "calendar"),
      (4, status_names::SHIPPED, "Shipped", "#fd7e14", "truck"),
      (5, status_names::DELIVERED, "Delivered", "#198754", "home"),
      (6, status_names::CANCELLED, "Cancelled", "#dc3545", "x"),
    ];
    let statuses = seed
      .iter()
      .enumerate()
      .map(|(position, (id, name, label, color, icon))| Status {
        id: *id,
        name: name.to_string(),
        label: label.to_string(),
        color: Some(color.to_string()),
        icon: Some(icon.to_string()),
        position: position as i32,
        active: true,
      })
      .collect();
    Self { statuses }
  }
}

#[async_trait]
impl StatusSource for MemoryStatusSource {
  async fn load_statuses(&self) -> Result<Vec<Status>, StoreError> {
    Ok(self.statuses.clone())
  }
}

#[derive(Debug, Default)]
struct OrderTable {
  next_id: OrderId,
  rows: BTreeMap<OrderId, Order>,
}

impl OrderTable {
  fn active_for_day(&self, owner: &OwnerId, business_day: chrono::NaiveDate, except: Option<OrderId>) -> bool {
    self.rows.values().any(|o| {
      Some(o.id) != except && &o.owner == owner && o.business_day == business_day && o.is_active()
    })
  }
}

/// Order repository over a `BTreeMap`, enforcing the same uniqueness rules as
/// the relational schema.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
  table: Mutex<OrderTable>,
}

impl MemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of stored orders, regardless of status.
  pub fn len(&self) -> usize {
    self.table.lock().rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[async_trait]
impl OrderRepository for MemoryOrderStore {
  async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
    let mut table = self.table.lock();

    if let Some(reference) = &order.provider_reference {
      if table.rows.values().any(|o| o.provider_reference.as_ref() == Some(reference)) {
        return Err(StoreError::DuplicateReference {
          reference: reference.clone(),
        });
      }
    }
    if !order.status.is_cancelled() && table.active_for_day(&order.owner, order.business_day, None) {
      return Err(StoreError::ActiveOrderExists {
        owner: order.owner.to_string(),
        business_day: order.business_day,
      });
    }

    table.next_id += 1;
    let id = table.next_id;
    let stored = order.into_order(id);
    table.rows.insert(id, stored.clone());
    Ok(stored)
  }

  async fn find(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
    Ok(self.table.lock().rows.get(&id).cloned())
  }

  async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>, StoreError> {
    let table = self.table.lock();
    Ok(
      table
        .rows
        .values()
        .find(|o| o.provider_reference.as_deref() == Some(reference))
        .cloned(),
    )
  }

  async fn list_for_owner(&self, owner: &OwnerId, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
    let table = self.table.lock();
    let mut orders: Vec<Order> = table
      .rows
      .values()
      .filter(|o| &o.owner == owner && filter.matches(o.created_at))
      .cloned()
      .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Ok(orders)
  }

  async fn update_status(
    &self,
    id: OrderId,
    expected: Option<StatusId>,
    next: &OrderStatusRef,
    at: DateTime<Utc>,
  ) -> Result<Order, StoreError> {
    let mut table = self.table.lock();
    let (owner, business_day, current) = match table.rows.get(&id) {
      Some(order) => (order.owner.clone(), order.business_day, order.status.clone()),
      None => return Err(StoreError::NotFound),
    };
    if let Some(expected_id) = expected {
      if current.id != expected_id {
        return Err(StoreError::StatusChanged { current: current.name });
      }
    }
    if current.is_cancelled() && !next.is_cancelled() && table.active_for_day(&owner, business_day, Some(id)) {
      return Err(StoreError::ActiveOrderExists {
        owner: owner.to_string(),
        business_day,
      });
    }

    let order = table.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
    order.status = next.clone();
    order.updated_at = at;
    Ok(order.clone())
  }

  async fn set_delivery_schedule(
    &self,
    id: OrderId,
    expected: StatusId,
    schedule: &DeliverySchedule,
    at: DateTime<Utc>,
  ) -> Result<Order, StoreError> {
    let mut table = self.table.lock();
    let order = table.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
    if order.status.id != expected {
      return Err(StoreError::StatusChanged {
        current: order.status.name.clone(),
      });
    }
    order.delivery_schedule = Some(schedule.clone());
    order.updated_at = at;
    Ok(order.clone())
  }
}

/// Checkout sessions keyed by id.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
  sessions: Mutex<HashMap<SessionId, CheckoutSession>>,
}

impl MemorySessionStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl CheckoutSessionStore for MemorySessionStore {
  async fn upsert(&self, update: SessionUpdate, at: DateTime<Utc>) -> Result<CheckoutSession, StoreError> {
    let mut sessions = self.sessions.lock();
    let previous = sessions.get(&update.session_id);
    if previous.is_some_and(|s| s.owner.is_some()) {
      return Err(StoreError::SessionLocked);
    }
    let session = CheckoutSession {
      session_id: update.session_id.clone(),
      form: update.form,
      cart: update.cart,
      computed_total: update.computed_total,
      owner: None,
      payment_hold: None,
      revision: previous.map_or(1, |s| s.revision + 1),
      updated_at: at,
    };
    sessions.insert(update.session_id, session.clone());
    Ok(session)
  }

  async fn get(&self, id: &SessionId) -> Result<Option<CheckoutSession>, StoreError> {
    Ok(self.sessions.lock().get(id).cloned())
  }

  async fn submit(
    &self,
    id: &SessionId,
    owner: &OwnerId,
    hold: Option<&PaymentHold>,
  ) -> Result<CheckoutSession, StoreError> {
    let mut sessions = self.sessions.lock();
    let session = sessions.get_mut(id).ok_or(StoreError::NotFound)?;
    if session.owner.as_ref().is_some_and(|bound| bound != owner) {
      return Err(StoreError::SessionLocked);
    }
    session.owner = Some(owner.clone());
    if let Some(hold) = hold {
      session.payment_hold = Some(hold.clone());
    }
    Ok(session.clone())
  }

  async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
    let mut sessions = self.sessions.lock();
    let before = sessions.len();
    sessions.retain(|_, s| s.updated_at >= cutoff);
    Ok((before - sessions.len()) as u64)
  }
}
