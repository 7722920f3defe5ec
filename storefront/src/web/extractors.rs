// storefront/src/web/extractors.rs

use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;

use orderflow::model::OwnerId;

use crate::errors::AppError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";
pub const GATEWAY_ACCOUNT_HEADER: &str = "X-Gateway-Account";

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
  req
    .headers()
    .get(name)
    .and_then(|value| value.to_str().ok())
    .map(str::trim)
    .filter(|value| !value.is_empty())
}

fn state(req: &HttpRequest) -> Result<&web::Data<AppState>, AppError> {
  req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("Application state is not registered".to_string()))
}

/// The buyer making the request, identified by the `X-User-ID` header set by the upstream auth layer.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub owner: OwnerId,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let owner = header(req, USER_ID_HEADER).and_then(|raw| OwnerId::new(raw).ok());
    match owner {
      Some(owner) => ready(Ok(AuthenticatedUser { owner })),
      None => {
        warn!("AuthenticatedUser extractor: Missing or invalid X-User-ID header.");
        ready(Err(AppError::Auth(
          "User authentication required. Missing or invalid X-User-ID header.".to_string(),
        )))
      }
    }
  }
}

/// Operator access, granted by a matching `X-Admin-Token`.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser;

fn authorize_admin(req: &HttpRequest) -> Result<AdminUser, AppError> {
  let expected = state(req)?
    .config
    .admin_api_token
    .as_deref()
    .ok_or_else(|| AppError::Forbidden("Admin access is not configured".to_string()))?;
  match header(req, ADMIN_TOKEN_HEADER) {
    Some(token) if token == expected => Ok(AdminUser),
    Some(_) => {
      warn!("AdminUser extractor: admin token mismatch.");
      Err(AppError::Forbidden("Invalid admin token".to_string()))
    }
    None => Err(AppError::Auth("Missing X-Admin-Token header".to_string())),
  }
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    ready(authorize_admin(req))
  }
}

/// A callback signed by the configured gateway account.
#[derive(Debug, Clone, Copy)]
pub struct GatewayCaller;

fn authorize_gateway(req: &HttpRequest) -> Result<GatewayCaller, AppError> {
  let expected = &state(req)?.config.mock_gateway_account_id;
  match header(req, GATEWAY_ACCOUNT_HEADER) {
    Some(account) if account == expected.as_str() => Ok(GatewayCaller),
    _ => {
      warn!("Gateway callback rejected: unknown or missing account header.");
      Err(AppError::Forbidden("Unrecognized gateway account".to_string()))
    }
  }
}

impl FromRequest for GatewayCaller {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    ready(authorize_gateway(req))
  }
}
