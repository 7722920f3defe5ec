// storefront/src/db/orders.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};

use orderflow::model::{
  DeliverySchedule, LineItemsDocument, NewOrder, Order, OrderFilter, OrderId, OrderStatusRef, OwnerId, StatusId,
};
use orderflow::{OrderRepository, StoreError};

use super::{backend, violated_unique_constraint};
use crate::models::{OrderRow, ORDER_COLUMNS};

const PROVIDER_REFERENCE_KEY: &str = "orders_provider_reference_key";
const ONE_ACTIVE_PER_DAY: &str = "orders_one_active_per_day";

#[derive(Clone)]
pub struct PgOrderRepository {
  pool: PgPool,
}

impl PgOrderRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Why a conditional update touched no row.
  async fn explain_missed_update(&self, id: OrderId) -> StoreError {
    match self.find(id).await {
      Ok(Some(current)) => StoreError::StatusChanged {
        current: current.status.name,
      },
      Ok(None) => StoreError::NotFound,
      Err(e) => e,
    }
  }
}

fn select_orders(sql_filter: &str) -> String {
  format!(
    "SELECT {} FROM orders o JOIN order_statuses s ON s.id = o.status_id WHERE {}",
    ORDER_COLUMNS, sql_filter
  )
}

fn insert_error(err: sqlx::Error, order: &NewOrder) -> StoreError {
  match violated_unique_constraint(&err).as_deref() {
    Some(PROVIDER_REFERENCE_KEY) => StoreError::DuplicateReference {
      reference: order.provider_reference.clone().unwrap_or_default(),
    },
    Some(ONE_ACTIVE_PER_DAY) => StoreError::ActiveOrderExists {
      owner: order.owner.to_string(),
      business_day: order.business_day,
    },
    _ => backend(err),
  }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
  #[instrument(name = "PgOrderRepository::insert", skip(self, order), fields(owner = %order.owner), err(Display))]
  async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
    let id: i64 = sqlx::query_scalar(
      "INSERT INTO orders (order_number, provider_reference, owner_id, buyer, line_items, subtotal_cents, \
       delivery_cents, discount_cents, total_cents, currency, payment_path, gateway_payment_id, status_id, \
       cancelled, business_day, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16) \
       RETURNING id",
    )
    .bind(&order.order_number)
    .bind(&order.provider_reference)
    .bind(order.owner.as_str())
    .bind(Json(&order.buyer))
    .bind(Json(LineItemsDocument::new(order.line_items.clone())))
    .bind(order.pricing.subtotal.cents())
    .bind(order.pricing.delivery_cost.cents())
    .bind(order.pricing.discount.cents())
    .bind(order.pricing.total.cents())
    .bind(&order.currency)
    .bind(order.payment.path.as_str())
    .bind(&order.payment.gateway_payment_id)
    .bind(order.status.id)
    .bind(order.status.is_cancelled())
    .bind(order.business_day)
    .bind(order.created_at)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| insert_error(e, &order))?;

    debug!(order_id = id, "Order row inserted.");
    Ok(order.into_order(id))
  }

  async fn find(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
    let sql = select_orders("o.id = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    row.map(Order::try_from).transpose()
  }

  async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>, StoreError> {
    let sql = select_orders("o.provider_reference = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(reference)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    row.map(Order::try_from).transpose()
  }

  #[instrument(name = "PgOrderRepository::list_for_owner", skip(self, filter), fields(owner = %owner), err(Display))]
  async fn list_for_owner(&self, owner: &OwnerId, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
    let sql = select_orders(
      "o.owner_id = $1 \
       AND ($2::timestamptz IS NULL OR o.created_at >= $2) \
       AND ($3::timestamptz IS NULL OR o.created_at < $3) \
       ORDER BY o.created_at DESC, o.id DESC",
    );
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(owner.as_str())
      .bind(filter.created_from)
      .bind(filter.created_before)
      .fetch_all(&self.pool)
      .await
      .map_err(backend)?;
    rows.into_iter().map(Order::try_from).collect()
  }

  #[instrument(name = "PgOrderRepository::update_status", skip(self, next), fields(next = %next), err(Display))]
  async fn update_status(
    &self,
    id: OrderId,
    expected: Option<StatusId>,
    next: &OrderStatusRef,
    at: DateTime<Utc>,
  ) -> Result<Order, StoreError> {
    let touched = sqlx::query(
      "UPDATE orders SET status_id = $1, cancelled = $2, updated_at = $3 \
       WHERE id = $4 AND ($5::integer IS NULL OR status_id = $5)",
    )
    .bind(next.id)
    .bind(next.is_cancelled())
    .bind(at)
    .bind(id)
    .bind(expected)
    .execute(&self.pool)
    .await;

    let touched = match touched {
      Ok(result) => result.rows_affected(),
      Err(e) if violated_unique_constraint(&e).as_deref() == Some(ONE_ACTIVE_PER_DAY) => {
        // Reactivating an order collides with another active order that day.
        let current = self.find(id).await?.ok_or(StoreError::NotFound)?;
        return Err(StoreError::ActiveOrderExists {
          owner: current.owner.to_string(),
          business_day: current.business_day,
        });
      }
      Err(e) => return Err(backend(e)),
    };

    if touched == 0 {
      return Err(self.explain_missed_update(id).await);
    }
    self.find(id).await?.ok_or(StoreError::NotFound)
  }

  #[instrument(name = "PgOrderRepository::set_delivery_schedule", skip(self, schedule), err(Display))]
  async fn set_delivery_schedule(
    &self,
    id: OrderId,
    expected: StatusId,
    schedule: &DeliverySchedule,
    at: DateTime<Utc>,
  ) -> Result<Order, StoreError> {
    let touched = sqlx::query(
      "UPDATE orders SET delivery_date = $1, delivery_time = $2, delivery_notes = $3, updated_at = $4 \
       WHERE id = $5 AND status_id = $6",
    )
    .bind(schedule.date)
    .bind(schedule.time)
    .bind(&schedule.notes)
    .bind(at)
    .bind(id)
    .bind(expected)
    .execute(&self.pool)
    .await
    .map_err(backend)?
    .rows_affected();

    if touched == 0 {
      return Err(self.explain_missed_update(id).await);
    }
    self.find(id).await?.ok_or(StoreError::NotFound)
  }
}
