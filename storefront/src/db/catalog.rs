// storefront/src/db/catalog.rs

use async_trait::async_trait;
use orderflow::{Catalog, CatalogEntry, StoreError};
use sqlx::PgPool;
use tracing::instrument;

use super::backend;
use crate::models::ProductRow;

pub struct PgCatalog {
  pool: PgPool,
}

impl PgCatalog {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl Catalog for PgCatalog {
  #[instrument(name = "PgCatalog::lookup", skip(self), err(Display))]
  async fn lookup(&self, product_ids: &[String]) -> Result<Vec<CatalogEntry>, StoreError> {
    if product_ids.is_empty() {
      return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, ProductRow>(
      "SELECT id, name, price_cents, available FROM products WHERE id = ANY($1)",
    )
    .bind(product_ids)
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;
    Ok(rows.into_iter().map(CatalogEntry::from).collect())
  }
}
