// orderflow/src/pricing.rs

//! Order pricing. The bank-transfer discount is applied here and nowhere else;
//! any display of a discounted total must come from a [`PriceBreakdown`]
//! produced by [`quote`].

use std::collections::HashMap;

use crate::catalog::Catalog;
use crate::error::{OrderError, OrderResult};
use crate::model::{CartLine, DeliveryMethod, LineItem, Money, PaymentPath, PriceBreakdown};
use crate::settings::DeliveryRates;

/// 5% off the full total (items and delivery) when paying by bank transfer.
pub const BANK_TRANSFER_DISCOUNT_BPS: i64 = 500;

/// Upper bound on units of a single product in one order.
pub const MAX_LINE_QUANTITY: u32 = 999;

fn overflow() -> OrderError {
  OrderError::Validation("Order total is out of range.".to_string())
}

/// Prices `items` plus delivery for the chosen payment path.
pub fn quote(
  items: &[LineItem],
  delivery_method: DeliveryMethod,
  rates: &DeliveryRates,
  path: PaymentPath,
) -> OrderResult<PriceBreakdown> {
  let mut subtotal = Money::ZERO;
  for item in items {
    let line = item.line_total().ok_or_else(overflow)?;
    subtotal = subtotal.checked_add(line).ok_or_else(overflow)?;
  }
  let delivery_cost = rates.cost_for(delivery_method);
  let gross = subtotal.checked_add(delivery_cost).ok_or_else(overflow)?;
  let discount = match path {
    PaymentPath::BankTransfer => gross.portion_bps(BANK_TRANSFER_DISCOUNT_BPS),
    PaymentPath::HostedGateway => Money::ZERO,
  };

  Ok(PriceBreakdown {
    subtotal,
    delivery_cost,
    discount,
    total: gross - discount,
  })
}

/// Turns the session cart into order-time line items using current catalog prices.
///
/// Prices the client displayed are ignored. Repeated product lines are merged
/// in first-seen order.
pub async fn build_line_items(catalog: &dyn Catalog, cart: &[CartLine]) -> OrderResult<Vec<LineItem>> {
  if cart.is_empty() {
    return Err(OrderError::Validation("Cart is empty.".to_string()));
  }

  let mut merged: Vec<(String, u32)> = Vec::new();
  for line in cart {
    if line.quantity == 0 {
      return Err(OrderError::Validation(format!(
        "Quantity for product '{}' must be at least 1.",
        line.product_id
      )));
    }
    match merged.iter_mut().find(|(id, _)| *id == line.product_id) {
      Some((_, quantity)) => *quantity = quantity.saturating_add(line.quantity),
      None => merged.push((line.product_id.clone(), line.quantity)),
    }
  }
  if let Some((id, _)) = merged.iter().find(|(_, q)| *q > MAX_LINE_QUANTITY) {
    return Err(OrderError::Validation(format!(
      "Quantity for product '{}' exceeds {}.",
      id, MAX_LINE_QUANTITY
    )));
  }

  let ids: Vec<String> = merged.iter().map(|(id, _)| id.clone()).collect();
  let entries: HashMap<String, _> = catalog
    .lookup(&ids)
    .await
    .map_err(|e| OrderError::persistence("catalog_lookup", e))?
    .into_iter()
    .map(|entry| (entry.product_id.clone(), entry))
    .collect();

  merged
    .into_iter()
    .map(|(product_id, quantity)| match entries.get(&product_id) {
      Some(entry) if entry.available => Ok(LineItem {
        product_id,
        name: entry.name.clone(),
        quantity,
        unit_price: entry.unit_price,
      }),
      Some(_) => Err(OrderError::Validation(format!(
        "Product '{}' is no longer available.",
        product_id
      ))),
      None => Err(OrderError::Validation(format!("Unknown product '{}'.", product_id))),
    })
    .collect()
}
