// storefront/src/db/statuses.rs

use async_trait::async_trait;
use orderflow::model::Status;
use orderflow::{StatusSource, StoreError};
use sqlx::PgPool;

use super::backend;
use crate::models::StatusRow;

pub struct PgStatusSource {
  pool: PgPool,
}

impl PgStatusSource {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl StatusSource for PgStatusSource {
  async fn load_statuses(&self) -> Result<Vec<Status>, StoreError> {
    let rows = sqlx::query_as::<_, StatusRow>(
      "SELECT id, name, label, color, icon, position, active FROM order_statuses ORDER BY position, id",
    )
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;
    Ok(rows.into_iter().map(Status::from).collect())
  }
}
