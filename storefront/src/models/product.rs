// storefront/src/models/product.rs

use orderflow::model::Money;
use orderflow::CatalogEntry;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
  pub id: String,
  pub name: String,
  pub price_cents: i64,
  pub available: bool,
}

impl From<ProductRow> for CatalogEntry {
  fn from(row: ProductRow) -> Self {
    CatalogEntry {
      product_id: row.id,
      name: row.name,
      unit_price: Money::from_cents(row.price_cents),
      available: row.available,
    }
  }
}
