// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use orderflow::model::{CartLine, CheckoutForm, Money, PaymentPath, SessionId, SessionUpdate};
use orderflow::Settlement;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

/// Snapshot of the checkout page. `computed_total` is the client's own figure, in cents.
#[derive(Deserialize, Debug)]
pub struct SyncSessionPayload {
  #[serde(default)]
  pub form: CheckoutForm,
  #[serde(default)]
  pub cart: Vec<CartLine>,
  #[serde(default)]
  pub computed_total: Option<Money>,
}

#[derive(Deserialize, Debug)]
pub struct SettlePayload {
  pub payment_path: PaymentPath,
  /// Final page state; when present it is stored before settling.
  #[serde(default)]
  pub form: Option<CheckoutForm>,
  #[serde(default)]
  pub cart: Option<Vec<CartLine>>,
  #[serde(default)]
  pub computed_total: Option<Money>,
}

impl SettlePayload {
  fn final_update(&mut self, session_id: &SessionId) -> Result<Option<SessionUpdate>, AppError> {
    match (self.form.take(), self.cart.take()) {
      (Some(form), Some(cart)) => Ok(Some(SessionUpdate {
        session_id: session_id.clone(),
        form,
        cart,
        computed_total: self.computed_total,
      })),
      (None, None) => Ok(None),
      _ => Err(AppError::Validation(
        "Send both 'form' and 'cart' with the final checkout state, or neither".to_string(),
      )),
    }
  }
}

fn session_id_from_path(raw: String) -> Result<SessionId, AppError> {
  Ok(SessionId::new(raw)?)
}

#[instrument(name = "handler::sync_checkout_session", skip(app_state, payload), fields(session_id = %session_id))]
pub async fn sync_session_handler(
  app_state: web::Data<AppState>,
  session_id: web::Path<String>,
  payload: web::Json<SyncSessionPayload>,
) -> Result<HttpResponse, AppError> {
  let session_id = session_id_from_path(session_id.into_inner())?;
  let payload = payload.into_inner();
  let session = app_state
    .service
    .sync_checkout_session(SessionUpdate {
      session_id,
      form: payload.form,
      cart: payload.cart,
      computed_total: payload.computed_total,
    })
    .await?;
  Ok(HttpResponse::Ok().json(json!({
    "session_id": session.session_id,
    "revision": session.revision,
    "updated_at": session.updated_at,
  })))
}

#[instrument(
  name = "handler::settle_checkout_session",
  skip(app_state, auth_user, payload),
  fields(owner = %auth_user.owner, session_id = %session_id, payment_path = %payload.payment_path)
)]
pub async fn settle_session_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  session_id: web::Path<String>,
  payload: web::Json<SettlePayload>,
) -> Result<HttpResponse, AppError> {
  let session_id = session_id_from_path(session_id.into_inner())?;
  let mut payload = payload.into_inner();
  let final_update = payload.final_update(&session_id)?;

  let settlement = app_state
    .service
    .create_order_from_session(&auth_user.owner, &session_id, payload.payment_path, final_update)
    .await?;

  match &settlement {
    Settlement::Placed { order, .. } => {
      info!(order_id = order.id, "Bank transfer order placed.");
      Ok(HttpResponse::Created().json(&settlement))
    }
    Settlement::Redirect { reference, .. } => {
      info!(reference = %reference, "Buyer redirected to the payment gateway.");
      Ok(HttpResponse::Ok().json(&settlement))
    }
  }
}
