// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use orderflow::OrderError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("{source}")]
  Order {
    #[from]
    source: OrderError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Stable machine-readable code sent to clients.
  pub fn kind(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "validation_error",
      AppError::Auth(_) => "authentication_required",
      AppError::Forbidden(_) => "forbidden",
      AppError::Config(_) => "configuration_error",
      AppError::Order { source } => source.kind(),
      AppError::Internal(_) => "internal_error",
    }
  }
}

fn order_status_code(err: &OrderError) -> StatusCode {
  match err {
    OrderError::Validation(_) => StatusCode::BAD_REQUEST,
    OrderError::DailyLimitExceeded { .. } => StatusCode::CONFLICT,
    OrderError::NotAuthorized { .. } => StatusCode::FORBIDDEN,
    OrderError::NotCancellable { .. } => StatusCode::CONFLICT,
    OrderError::DuplicateSettlement { .. } => StatusCode::CONFLICT,
    OrderError::ProviderUnavailable { .. } => StatusCode::BAD_GATEWAY,
    OrderError::PersistenceFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
    OrderError::SessionNotFound { .. } | OrderError::OrderNotFound { .. } => StatusCode::NOT_FOUND,
    OrderError::SessionLocked { .. } => StatusCode::CONFLICT,
    OrderError::InvalidTransition { .. } => StatusCode::CONFLICT,
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::Order { source } => order_status_code(source),
      AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }

    let mut body = json!({ "error": self.kind() });
    match self {
      // Internal details stay in the logs.
      AppError::Config(_) | AppError::Internal(_) => {
        body["message"] = json!("An internal error occurred");
      }
      AppError::Order { source } => {
        body["message"] = json!(source.to_string());
        body["retryable"] = json!(source.is_retryable());
        if let OrderError::DailyLimitExceeded { blocking_order } = source {
          body["blocking_order"] = json!({
            "id": blocking_order.id,
            "order_number": blocking_order.order_number,
            "status": blocking_order.status.name,
            "created_at": blocking_order.created_at,
          });
        }
      }
      other => {
        body["message"] = json!(other.to_string());
      }
    }
    HttpResponse::build(status).json(body)
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
