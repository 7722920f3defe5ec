// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use orderflow::model::{OrderFilter, OrderId};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug, Default)]
pub struct OrderListQuery {
  pub from: Option<DateTime<Utc>>,
  pub before: Option<DateTime<Utc>>,
}

impl OrderListQuery {
  fn into_filter(self) -> Result<OrderFilter, AppError> {
    if let (Some(from), Some(before)) = (self.from, self.before) {
      if from >= before {
        return Err(AppError::Validation("'from' must be earlier than 'before'".to_string()));
      }
    }
    Ok(OrderFilter {
      created_from: self.from,
      created_before: self.before,
    })
  }
}

#[instrument(name = "handler::list_orders", skip(app_state, auth_user, query), fields(owner = %auth_user.owner))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  query: web::Query<OrderListQuery>,
) -> Result<HttpResponse, AppError> {
  let filter = query.into_inner().into_filter()?;
  let orders = app_state.service.list_orders_for_owner(&auth_user.owner, &filter).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[instrument(name = "handler::order_eligibility", skip(app_state, auth_user), fields(owner = %auth_user.owner))]
pub async fn eligibility_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let decision = app_state.service.can_place_order(&auth_user.owner).await;
  Ok(HttpResponse::Ok().json(decision))
}

#[instrument(name = "handler::cancel_order", skip(app_state, auth_user), fields(owner = %auth_user.owner))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  order_id: web::Path<OrderId>,
) -> Result<HttpResponse, AppError> {
  let order_id = order_id.into_inner();
  let order = app_state.service.cancel_order(order_id, &auth_user.owner).await?;
  info!(order_id, "Order cancelled by its owner.");
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}
