// storefront/src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use orderflow::model::OrderId;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Deserialize, Debug)]
pub struct StatusChangePayload {
  pub status: String,
}

#[derive(Deserialize, Debug)]
pub struct DeliverySchedulePayload {
  pub date: NaiveDate,
  #[serde(default)]
  pub time: Option<NaiveTime>,
  #[serde(default)]
  pub notes: Option<String>,
}

#[instrument(name = "handler::admin_transition_status", skip(app_state, _admin, payload), fields(status = %payload.status))]
pub async fn transition_status_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  order_id: web::Path<OrderId>,
  payload: web::Json<StatusChangePayload>,
) -> Result<HttpResponse, AppError> {
  let order_id = order_id.into_inner();
  let order = app_state
    .service
    .admin_transition_status(order_id, payload.status.trim())
    .await?;
  info!(order_id, status = %order.status, "Order status changed by admin.");
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}

#[instrument(name = "handler::admin_set_delivery_schedule", skip(app_state, _admin, payload))]
pub async fn set_delivery_schedule_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  order_id: web::Path<OrderId>,
  payload: web::Json<DeliverySchedulePayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let order = app_state
    .service
    .admin_set_delivery_schedule(order_id.into_inner(), payload.date, payload.time, payload.notes)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}

#[instrument(name = "handler::admin_refresh_statuses", skip(app_state, _admin))]
pub async fn refresh_statuses_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let refreshed = app_state.service.refresh_statuses().await;
  if !refreshed {
    warn!("Status refresh failed; previous directory kept.");
  }
  Ok(HttpResponse::Ok().json(json!({
    "refreshed": refreshed,
    "statuses": app_state.service.list_statuses(),
  })))
}
