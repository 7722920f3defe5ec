// orderflow/src/model/checkout.rs

//! Server-side mirror of a buyer's in-progress checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Money;
use super::order::{
  BuyerSnapshot, ContactDetails, DeliveryMethod, LineItem, OwnerId, PriceBreakdown, ShippingAddress,
  SNAPSHOT_SCHEMA_VERSION,
};
use crate::error::{OrderError, OrderResult};

const MIN_SESSION_ID_LEN: usize = 16;
const MAX_SESSION_ID_LEN: usize = 128;

/// Client-generated checkout session identifier.
///
/// Must be long enough not to be guessable and limited to URL-safe characters,
/// since it doubles as the bank-transfer settlement reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
  pub fn new(raw: impl Into<String>) -> OrderResult<Self> {
    let raw = raw.into();
    if raw.len() < MIN_SESSION_ID_LEN || raw.len() > MAX_SESSION_ID_LEN {
      return Err(OrderError::Validation(format!(
        "Session id must be between {} and {} characters.",
        MIN_SESSION_ID_LEN, MAX_SESSION_ID_LEN
      )));
    }
    if !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
      return Err(OrderError::Validation(
        "Session id may only contain letters, digits, '-' and '_'.".to_string(),
      ));
    }
    Ok(SessionId(raw))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl TryFrom<String> for SessionId {
  type Error = OrderError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    SessionId::new(value)
  }
}

impl From<SessionId> for String {
  fn from(id: SessionId) -> String {
    id.0
  }
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Partially-filled buyer form. Every field may still be empty while editing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
  pub full_name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub document_id: Option<String>,
  pub delivery_method: Option<DeliveryMethod>,
  pub street: Option<String>,
  pub city: Option<String>,
  pub province: Option<String>,
  pub postal_code: Option<String>,
  pub notes: Option<String>,
}

fn filled(value: &Option<String>) -> Option<String> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .map(str::to_string)
}

impl CheckoutForm {
  /// Validates the form and freezes it into the snapshot stored on the order.
  pub fn to_buyer_snapshot(&self) -> OrderResult<BuyerSnapshot> {
    let mut missing = Vec::new();
    let full_name = filled(&self.full_name);
    let email = filled(&self.email);
    let phone = filled(&self.phone);
    if full_name.is_none() {
      missing.push("full_name");
    }
    if email.is_none() {
      missing.push("email");
    }
    if phone.is_none() {
      missing.push("phone");
    }
    let delivery_method = match self.delivery_method {
      Some(method) => method,
      None => {
        missing.push("delivery_method");
        DeliveryMethod::Pickup
      }
    };

    let shipping_address = if self.delivery_method.map_or(false, DeliveryMethod::requires_address) {
      let street = filled(&self.street);
      let city = filled(&self.city);
      let province = filled(&self.province);
      let postal_code = filled(&self.postal_code);
      for (name, value) in [
        ("street", &street),
        ("city", &city),
        ("province", &province),
        ("postal_code", &postal_code),
      ] {
        if value.is_none() {
          missing.push(name);
        }
      }
      match (street, city, province, postal_code) {
        (Some(street), Some(city), Some(province), Some(postal_code)) => Some(ShippingAddress {
          street,
          city,
          province,
          postal_code,
        }),
        _ => None,
      }
    } else {
      None
    };

    if !missing.is_empty() {
      return Err(OrderError::Validation(format!(
        "Checkout form is incomplete; missing: {}.",
        missing.join(", ")
      )));
    }

    // Presence was checked above.
    let email = email.unwrap_or_default();
    if !looks_like_email(&email) {
      return Err(OrderError::Validation(format!("'{}' is not a valid email address.", email)));
    }

    Ok(BuyerSnapshot {
      schema_version: SNAPSHOT_SCHEMA_VERSION,
      contact: ContactDetails {
        full_name: full_name.unwrap_or_default(),
        email,
        phone: phone.unwrap_or_default(),
        document_id: filled(&self.document_id),
      },
      delivery_method,
      shipping_address,
      buyer_notes: filled(&self.notes),
    })
  }
}

fn looks_like_email(candidate: &str) -> bool {
  match candidate.split_once('@') {
    Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
    None => false,
  }
}

/// One cart entry as the client sees it. Prices here are display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
  pub product_id: String,
  pub quantity: u32,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub unit_price: Option<Money>,
}

/// The payload of one upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUpdate {
  pub session_id: SessionId,
  pub form: CheckoutForm,
  pub cart: Vec<CartLine>,
  pub computed_total: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
  pub session_id: SessionId,
  pub form: CheckoutForm,
  pub cart: Vec<CartLine>,
  pub computed_total: Option<Money>,
  /// Set when the buyer submits the session for payment. From then on the
  /// store refuses further syncs.
  pub owner: Option<OwnerId>,
  /// The checkout as priced when the gateway token was issued.
  #[serde(default)]
  pub payment_hold: Option<PaymentHold>,
  /// Bumped by the store on every upsert.
  pub revision: u64,
  pub updated_at: DateTime<Utc>,
}

/// A hosted-gateway checkout frozen at token time. The gateway callback turns
/// exactly this into the order, whatever the catalog says by then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentHold {
  pub buyer: BuyerSnapshot,
  pub line_items: Vec<LineItem>,
  pub pricing: PriceBreakdown,
  pub currency: String,
  pub held_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn complete_form() -> CheckoutForm {
    CheckoutForm {
      full_name: Some("Ana Ruiz".to_string()),
      email: Some("ana@example.com".to_string()),
      phone: Some("+54 11 5555 0000".to_string()),
      delivery_method: Some(DeliveryMethod::Domestic),
      street: Some("Av. Siempre Viva 742".to_string()),
      city: Some("Rosario".to_string()),
      province: Some("Santa Fe".to_string()),
      postal_code: Some("2000".to_string()),
      ..Default::default()
    }
  }

  #[test]
  fn session_id_rejects_short_or_odd_values() {
    assert!(SessionId::new("short").is_err());
    assert!(SessionId::new("has spaces in it!!").is_err());
    assert!(SessionId::new("a1b2c3d4e5f6g7h8").is_ok());
  }

  #[test]
  fn complete_form_becomes_snapshot() {
    let snapshot = complete_form().to_buyer_snapshot().unwrap();
    assert_eq!(snapshot.schema_version, SNAPSHOT_SCHEMA_VERSION);
    assert_eq!(snapshot.contact.full_name, "Ana Ruiz");
    assert_eq!(snapshot.shipping_address.unwrap().city, "Rosario");
  }

  #[test]
  fn domestic_delivery_requires_address() {
    let mut form = complete_form();
    form.city = Some("  ".to_string());
    form.postal_code = None;
    let err = form.to_buyer_snapshot().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("city"));
    assert!(message.contains("postal_code"));
  }

  #[test]
  fn pickup_ignores_address_fields() {
    let form = CheckoutForm {
      delivery_method: Some(DeliveryMethod::Pickup),
      street: None,
      city: None,
      ..complete_form()
    };
    let snapshot = form.to_buyer_snapshot().unwrap();
    assert!(snapshot.shipping_address.is_none());
  }

  #[test]
  fn malformed_email_is_rejected() {
    let form = CheckoutForm {
      email: Some("ana.example.com".to_string()),
      ..complete_form()
    };
    assert!(matches!(form.to_buyer_snapshot(), Err(OrderError::Validation(_))));
  }
}
