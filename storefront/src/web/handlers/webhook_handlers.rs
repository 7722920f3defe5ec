// storefront/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument, warn};

use orderflow::{GatewayConfirmation, GatewayOutcome};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::GatewayCaller;

/// Gateway callback. Retries of an already-recorded reference are answered with 200 so the gateway stops resending.
#[instrument(
  name = "handler::gateway_webhook",
  skip(app_state, _caller, payload),
  fields(reference = %payload.reference, approved = payload.approved)
)]
pub async fn gateway_webhook_handler(
  app_state: web::Data<AppState>,
  _caller: GatewayCaller,
  payload: web::Json<GatewayConfirmation>,
) -> Result<HttpResponse, AppError> {
  let outcome = app_state.service.confirm_gateway_payment(payload.into_inner()).await?;
  match &outcome {
    GatewayOutcome::Recorded { order } => {
      info!(order_id = order.id, "Gateway payment recorded.");
      Ok(HttpResponse::Created().json(&outcome))
    }
    GatewayOutcome::AlreadyRecorded { order } => {
      info!(order_id = order.id, "Duplicate gateway callback acknowledged.");
      Ok(HttpResponse::Ok().json(&outcome))
    }
    GatewayOutcome::Declined { reference } => {
      warn!(reference = %reference, "Gateway reported a declined payment.");
      Ok(HttpResponse::Ok().json(&outcome))
    }
  }
}
