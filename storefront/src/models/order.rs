// storefront/src/models/order.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;

use orderflow::model::{
  BuyerSnapshot, DeliverySchedule, LineItemsDocument, Money, Order, OrderStatusRef, OwnerId, PaymentPath,
  PaymentRecord, PriceBreakdown,
};
use orderflow::StoreError;

/// Select list matching [`OrderRow`]; expects `orders o JOIN order_statuses s`.
pub const ORDER_COLUMNS: &str = "o.id, o.order_number, o.provider_reference, o.owner_id, o.buyer, o.line_items, \
  o.subtotal_cents, o.delivery_cents, o.discount_cents, o.total_cents, o.currency, o.payment_path, \
  o.gateway_payment_id, o.status_id, s.name AS status_name, o.business_day, o.delivery_date, o.delivery_time, \
  o.delivery_notes, o.created_at, o.updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: i64,
  pub order_number: Option<String>,
  pub provider_reference: Option<String>,
  pub owner_id: String,
  pub buyer: Json<BuyerSnapshot>,
  pub line_items: Json<LineItemsDocument>,
  pub subtotal_cents: i64,
  pub delivery_cents: i64,
  pub discount_cents: i64,
  pub total_cents: i64,
  pub currency: String,
  pub payment_path: String,
  pub gateway_payment_id: Option<String>,
  pub status_id: i32,
  pub status_name: String,
  pub business_day: NaiveDate,
  pub delivery_date: Option<NaiveDate>,
  pub delivery_time: Option<NaiveTime>,
  pub delivery_notes: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

fn corrupt(order_id: i64, what: impl std::fmt::Display) -> StoreError {
  StoreError::Backend {
    source: anyhow::anyhow!("order {} has an unreadable {}", order_id, what),
  }
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    let id = row.id;
    let buyer = row.buyer.0;
    buyer.ensure_supported().map_err(|e| corrupt(id, e))?;
    let line_items = row.line_items.0.into_items().map_err(|e| corrupt(id, e))?;
    let owner = OwnerId::new(row.owner_id).map_err(|e| corrupt(id, e))?;
    let path = row
      .payment_path
      .parse::<PaymentPath>()
      .map_err(|e| corrupt(id, e))?;

    let delivery_schedule = row.delivery_date.map(|date| DeliverySchedule {
      date,
      time: row.delivery_time,
      notes: row.delivery_notes,
    });

    Ok(Order {
      id,
      order_number: row.order_number,
      provider_reference: row.provider_reference,
      owner,
      buyer,
      line_items,
      pricing: PriceBreakdown {
        subtotal: Money::from_cents(row.subtotal_cents),
        delivery_cost: Money::from_cents(row.delivery_cents),
        discount: Money::from_cents(row.discount_cents),
        total: Money::from_cents(row.total_cents),
      },
      currency: row.currency,
      payment: PaymentRecord {
        path,
        gateway_payment_id: row.gateway_payment_id,
      },
      status: OrderStatusRef {
        id: row.status_id,
        name: row.status_name,
      },
      delivery_schedule,
      business_day: row.business_day,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}
