// storefront/src/config.rs

use crate::errors::{AppError, Result};
use chrono::Duration as ChronoDuration;
use dotenvy::dotenv;
use orderflow::model::Money;
use orderflow::{BusinessCalendar, CheckoutSettings, DeliveryRates};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub app_base_url: String,

  pub store_currency: String,
  /// Offset of the store's reference timezone from UTC, in minutes.
  pub store_utc_offset_minutes: i32,
  pub delivery_domestic_cents: i64,
  pub delivery_pickup_cents: i64,
  pub checkout_sync_timeout_ms: u64,
  pub session_ttl_hours: i64,

  /// Admin endpoints are disabled when unset.
  pub admin_api_token: Option<String>,

  pub mock_gateway_account_id: String,
  pub mock_email_sender: String,
  pub admin_alert_email: String,
  pub outbox_capacity: usize,
}

fn parse_var<T: FromStr>(name: &str, raw: String) -> Result<T>
where
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e)))
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let get_or = |var_name: &str, default: &str| get_env(var_name).unwrap_or_else(|_| default.to_string());

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = parse_var("SERVER_PORT", get_or("SERVER_PORT", "8080"))?;
    let database_url = get_env("DATABASE_URL")?;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let store_currency = get_or("STORE_CURRENCY", "USD").trim().to_uppercase();
    if store_currency.len() != 3 {
      return Err(AppError::Config(format!(
        "Invalid STORE_CURRENCY '{}': expected a 3-letter code",
        store_currency
      )));
    }
    let store_utc_offset_minutes = parse_var("STORE_UTC_OFFSET_MINUTES", get_or("STORE_UTC_OFFSET_MINUTES", "0"))?;
    let delivery_domestic_cents = parse_var("DELIVERY_DOMESTIC_CENTS", get_or("DELIVERY_DOMESTIC_CENTS", "2000"))?;
    let delivery_pickup_cents = parse_var("DELIVERY_PICKUP_CENTS", get_or("DELIVERY_PICKUP_CENTS", "0"))?;
    let checkout_sync_timeout_ms = parse_var("CHECKOUT_SYNC_TIMEOUT_MS", get_or("CHECKOUT_SYNC_TIMEOUT_MS", "2000"))?;
    let session_ttl_hours = parse_var("SESSION_TTL_HOURS", get_or("SESSION_TTL_HOURS", "72"))?;

    let admin_api_token = get_env("ADMIN_API_TOKEN").ok().filter(|t| !t.trim().is_empty());
    if admin_api_token.is_none() {
      tracing::warn!("ADMIN_API_TOKEN not set; admin endpoints will reject every request.");
    }

    let mock_gateway_account_id = get_or("MOCK_GATEWAY_ACCOUNT_ID", "mock_gateway_acct");
    let mock_email_sender = get_or("MOCK_EMAIL_SENDER", "noreply@example.com");
    let admin_alert_email = get_or("ADMIN_ALERT_EMAIL", "orders@example.com");
    let outbox_capacity = parse_var("OUTBOX_CAPACITY", get_or("OUTBOX_CAPACITY", "256"))?;

    let config = Self {
      server_host,
      server_port,
      database_url,
      app_base_url,
      store_currency,
      store_utc_offset_minutes,
      delivery_domestic_cents,
      delivery_pickup_cents,
      checkout_sync_timeout_ms,
      session_ttl_hours,
      admin_api_token,
      mock_gateway_account_id,
      mock_email_sender,
      admin_alert_email,
      outbox_capacity,
    };
    config.validate()?;

    tracing::info!("Application configuration loaded successfully.");
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    if self.delivery_domestic_cents < 0 || self.delivery_pickup_cents < 0 {
      return Err(AppError::Config("Delivery rates cannot be negative".to_string()));
    }
    if self.session_ttl_hours <= 0 {
      return Err(AppError::Config("SESSION_TTL_HOURS must be positive".to_string()));
    }
    self.business_calendar().map(|_| ())
  }

  pub fn business_calendar(&self) -> Result<BusinessCalendar> {
    BusinessCalendar::from_offset_minutes(self.store_utc_offset_minutes).ok_or_else(|| {
      AppError::Config(format!(
        "STORE_UTC_OFFSET_MINUTES {} is out of range",
        self.store_utc_offset_minutes
      ))
    })
  }

  pub fn checkout_settings(&self) -> CheckoutSettings {
    CheckoutSettings {
      currency: self.store_currency.clone(),
      delivery_rates: DeliveryRates {
        pickup: Money::from_cents(self.delivery_pickup_cents),
        domestic: Money::from_cents(self.delivery_domestic_cents),
      },
      forced_sync_timeout: Duration::from_millis(self.checkout_sync_timeout_ms),
    }
  }

  pub fn session_ttl(&self) -> ChronoDuration {
    ChronoDuration::hours(self.session_ttl_hours)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> AppConfig {
    AppConfig {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      database_url: "postgres://localhost/storefront".to_string(),
      app_base_url: "http://127.0.0.1:8080".to_string(),
      store_currency: "USD".to_string(),
      store_utc_offset_minutes: -180,
      delivery_domestic_cents: 2000,
      delivery_pickup_cents: 0,
      checkout_sync_timeout_ms: 1500,
      session_ttl_hours: 72,
      admin_api_token: Some("secret".to_string()),
      mock_gateway_account_id: "acct".to_string(),
      mock_email_sender: "noreply@example.com".to_string(),
      admin_alert_email: "orders@example.com".to_string(),
      outbox_capacity: 16,
    }
  }

  #[test]
  fn settings_carry_configured_rates_and_timeout() {
    let settings = sample().checkout_settings();
    assert_eq!(settings.delivery_rates.domestic, Money::from_major(20));
    assert_eq!(settings.forced_sync_timeout, Duration::from_millis(1500));
  }

  #[test]
  fn out_of_range_offset_is_rejected() {
    let config = AppConfig {
      store_utc_offset_minutes: 24 * 60,
      ..sample()
    };
    assert!(matches!(config.validate(), Err(AppError::Config(_))));
    assert!(sample().validate().is_ok());
  }
}
