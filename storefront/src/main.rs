// storefront/src/main.rs

mod config;
mod db;
mod errors;
mod models;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::db::{PgCatalog, PgCheckoutSessionStore, PgOrderRepository, PgStatusSource};
use crate::services::{MockEmailSink, MockPaymentGateway};
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use orderflow::{ChannelOutbox, OrderService, OutboxDispatcher, ServiceDeps, StatusDirectory, SystemClock};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

fn startup_error(what: &str, e: impl std::fmt::Display) -> std::io::Error {
  tracing::error!(error = %e, "{}", what);
  std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", what, e))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront order server...");

  let app_config = Arc::new(AppConfig::from_env().map_err(|e| startup_error("Failed to load application configuration", e))?);
  let calendar = app_config
    .business_calendar()
    .map_err(|e| startup_error("Invalid business calendar", e))?;

  let db_pool = PgPool::connect(&app_config.database_url)
    .await
    .map_err(|e| startup_error("Failed to connect to the database", e))?;
  tracing::info!("Successfully connected to the database.");

  sqlx::migrate!("./migrations")
    .run(&db_pool)
    .await
    .map_err(|e| startup_error("Failed to apply database migrations", e))?;

  let statuses = Arc::new(StatusDirectory::load(Arc::new(PgStatusSource::new(db_pool.clone()))).await);

  let (outbox, outbox_receiver) = ChannelOutbox::channel(app_config.outbox_capacity);
  let email_sink = Arc::new(MockEmailSink::new(
    app_config.mock_email_sender.clone(),
    app_config.admin_alert_email.clone(),
  ));
  let dispatcher = OutboxDispatcher::spawn(email_sink, outbox_receiver);

  let service = Arc::new(OrderService::new(ServiceDeps {
    orders: Arc::new(PgOrderRepository::new(db_pool.clone())),
    sessions: Arc::new(PgCheckoutSessionStore::new(db_pool.clone())),
    statuses,
    catalog: Arc::new(PgCatalog::new(db_pool.clone())),
    gateway: Arc::new(MockPaymentGateway::new(
      app_config.mock_gateway_account_id.clone(),
      app_config.app_base_url.clone(),
    )),
    outbox: Arc::new(outbox),
    clock: Arc::new(SystemClock),
    calendar,
    settings: app_config.checkout_settings(),
  }));

  let purge_service = service.clone();
  let session_ttl = app_config.session_ttl();
  let purger = tokio::spawn(async move {
    let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
      ticker.tick().await;
      if let Err(e) = purge_service.sessions().purge_stale(session_ttl).await {
        tracing::warn!(error = %e, "Stale checkout session purge failed.");
      }
    }
  });

  let app_state = AppState {
    db_pool,
    service,
    config: app_config.clone(),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  let result = HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await;

  purger.abort();
  // The dispatcher drains queued notifications once the last outbox handle is gone.
  if tokio::time::timeout(Duration::from_secs(5), dispatcher).await.is_err() {
    tracing::warn!("Notification dispatcher did not drain before shutdown.");
  }
  result
}
