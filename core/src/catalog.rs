// orderflow/src/catalog.rs

//! Read-only view of the product catalog. The core never writes to it.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::StoreError;
use crate::model::Money;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
  pub product_id: String,
  pub name: String,
  pub unit_price: Money,
  pub available: bool,
}

#[async_trait]
pub trait Catalog: Send + Sync {
  /// Entries for the given ids. Unknown ids are simply absent from the result.
  async fn lookup(&self, product_ids: &[String]) -> Result<Vec<CatalogEntry>, StoreError>;
}

/// Catalog held in memory.
#[derive(Debug, Default)]
pub struct StaticCatalog {
  entries: RwLock<HashMap<String, CatalogEntry>>,
}

impl StaticCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_product(self, product_id: &str, name: &str, unit_price: Money) -> Self {
    self.upsert(CatalogEntry {
      product_id: product_id.to_string(),
      name: name.to_string(),
      unit_price,
      available: true,
    });
    self
  }

  pub fn upsert(&self, entry: CatalogEntry) {
    self.entries.write().insert(entry.product_id.clone(), entry);
  }
}

#[async_trait]
impl Catalog for StaticCatalog {
  async fn lookup(&self, product_ids: &[String]) -> Result<Vec<CatalogEntry>, StoreError> {
    let entries = self.entries.read();
    Ok(product_ids.iter().filter_map(|id| entries.get(id).cloned()).collect())
  }
}
