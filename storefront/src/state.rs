// storefront/src/state.rs
use crate::config::AppConfig;
use orderflow::OrderService;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub service: Arc<OrderService>,
  pub config: Arc<AppConfig>,
}
