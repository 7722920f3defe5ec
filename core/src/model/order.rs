// orderflow/src/model/order.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::Money;
use super::status::OrderStatusRef;
use crate::error::{OrderError, OrderResult};

pub type OrderId = i64;

/// Shape version written into every stored snapshot.
pub const SNAPSHOT_SCHEMA_VERSION: u16 = 1;

const MAX_OWNER_ID_LEN: usize = 128;

/// Opaque buyer identifier handed over by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
  pub fn new(raw: impl Into<String>) -> OrderResult<Self> {
    let raw = raw.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Err(OrderError::Validation("Owner identifier cannot be empty.".to_string()));
    }
    if trimmed.len() > MAX_OWNER_ID_LEN {
      return Err(OrderError::Validation("Owner identifier is too long.".to_string()));
    }
    Ok(OwnerId(trimmed.to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for OwnerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
  /// Buyer collects at the store.
  Pickup,
  /// Courier delivery within the country.
  Domestic,
}

impl DeliveryMethod {
  pub fn requires_address(self) -> bool {
    matches!(self, DeliveryMethod::Domestic)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
  pub full_name: String,
  pub email: String,
  pub phone: String,
  pub document_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
  pub street: String,
  pub city: String,
  pub province: String,
  pub postal_code: String,
}

/// Buyer contact and delivery preferences captured when the order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerSnapshot {
  pub schema_version: u16,
  pub contact: ContactDetails,
  pub delivery_method: DeliveryMethod,
  pub shipping_address: Option<ShippingAddress>,
  pub buyer_notes: Option<String>,
}

impl BuyerSnapshot {
  /// Rejects snapshots written with a shape this build does not know.
  pub fn ensure_supported(&self) -> Result<(), String> {
    if self.schema_version == SNAPSHOT_SCHEMA_VERSION {
      Ok(())
    } else {
      Err(format!("unsupported buyer snapshot version {}", self.schema_version))
    }
  }
}

/// A product line frozen at order time. Later catalog price changes never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
  pub product_id: String,
  pub name: String,
  pub quantity: u32,
  pub unit_price: Money,
}

impl LineItem {
  pub fn line_total(&self) -> Option<Money> {
    self.unit_price.checked_mul(self.quantity)
  }
}

/// Stored form of an order's line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemsDocument {
  pub schema_version: u16,
  pub items: Vec<LineItem>,
}

impl LineItemsDocument {
  pub fn new(items: Vec<LineItem>) -> Self {
    LineItemsDocument {
      schema_version: SNAPSHOT_SCHEMA_VERSION,
      items,
    }
  }

  pub fn into_items(self) -> Result<Vec<LineItem>, String> {
    if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
      return Err(format!("unsupported line item snapshot version {}", self.schema_version));
    }
    Ok(self.items)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
  pub subtotal: Money,
  pub delivery_cost: Money,
  pub discount: Money,
  pub total: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPath {
  HostedGateway,
  BankTransfer,
}

impl PaymentPath {
  pub fn as_str(self) -> &'static str {
    match self {
      PaymentPath::HostedGateway => "hosted_gateway",
      PaymentPath::BankTransfer => "bank_transfer",
    }
  }
}

impl fmt::Display for PaymentPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PaymentPath {
  type Err = OrderError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "hosted_gateway" => Ok(PaymentPath::HostedGateway),
      "bank_transfer" => Ok(PaymentPath::BankTransfer),
      other => Err(OrderError::Validation(format!("Unknown payment path '{}'.", other))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
  pub path: PaymentPath,
  pub gateway_payment_id: Option<String>,
}

/// Delivery appointment, set by an administrator while the order is in `appointment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySchedule {
  pub date: NaiveDate,
  pub time: Option<NaiveTime>,
  pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub id: OrderId,
  pub order_number: Option<String>,
  pub provider_reference: Option<String>,
  pub owner: OwnerId,
  pub buyer: BuyerSnapshot,
  pub line_items: Vec<LineItem>,
  pub pricing: PriceBreakdown,
  pub currency: String,
  pub payment: PaymentRecord,
  pub status: OrderStatusRef,
  pub delivery_schedule: Option<DeliverySchedule>,
  /// Calendar day of creation in the store's reference timezone.
  pub business_day: NaiveDate,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn is_active(&self) -> bool {
    !self.status.is_cancelled()
  }
}

/// Everything needed to insert an order; the repository assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
  pub order_number: Option<String>,
  pub provider_reference: Option<String>,
  pub owner: OwnerId,
  pub buyer: BuyerSnapshot,
  pub line_items: Vec<LineItem>,
  pub pricing: PriceBreakdown,
  pub currency: String,
  pub payment: PaymentRecord,
  pub status: OrderStatusRef,
  pub business_day: NaiveDate,
  pub created_at: DateTime<Utc>,
}

impl NewOrder {
  /// Materializes the stored record once the backend has picked an id.
  pub fn into_order(self, id: OrderId) -> Order {
    Order {
      id,
      order_number: self.order_number,
      provider_reference: self.provider_reference,
      owner: self.owner,
      buyer: self.buyer,
      line_items: self.line_items,
      pricing: self.pricing,
      currency: self.currency,
      payment: self.payment,
      status: self.status,
      delivery_schedule: None,
      business_day: self.business_day,
      created_at: self.created_at,
      updated_at: self.created_at,
    }
  }
}

/// Human-readable order number: `RX-<yyyymmdd>-<8 hex chars>`.
pub fn generate_order_number(business_day: NaiveDate) -> String {
  let suffix = uuid::Uuid::new_v4().simple().to_string();
  format!(
    "RX-{}-{}",
    business_day.format("%Y%m%d"),
    suffix[..8].to_ascii_uppercase()
  )
}

/// Listing filter for an owner's orders. Bounds are `[created_from, created_before)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
  pub created_from: Option<DateTime<Utc>>,
  pub created_before: Option<DateTime<Utc>>,
}

impl OrderFilter {
  pub fn all() -> Self {
    OrderFilter::default()
  }

  pub fn created_within(from: DateTime<Utc>, before: DateTime<Utc>) -> Self {
    OrderFilter {
      created_from: Some(from),
      created_before: Some(before),
    }
  }

  pub fn matches(&self, created_at: DateTime<Utc>) -> bool {
    self.created_from.map_or(true, |from| created_at >= from)
      && self.created_before.map_or(true, |before| created_at < before)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn owner_id_is_trimmed_and_non_empty() {
    assert_eq!(OwnerId::new("  user-1 ").unwrap().as_str(), "user-1");
    assert!(OwnerId::new("   ").is_err());
  }

  #[test]
  fn order_number_embeds_business_day() {
    let day = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
    let number = generate_order_number(day);
    assert!(number.starts_with("RX-20260309-"));
    assert_eq!(number.len(), "RX-20260309-".len() + 8);
  }

  #[test]
  fn line_items_document_rejects_unknown_version() {
    let doc = LineItemsDocument {
      schema_version: 99,
      items: vec![],
    };
    assert!(doc.into_items().is_err());
  }

  #[test]
  fn payment_path_parses_wire_names() {
    assert_eq!("bank_transfer".parse::<PaymentPath>().unwrap(), PaymentPath::BankTransfer);
    assert!("cash".parse::<PaymentPath>().is_err());
  }
}
