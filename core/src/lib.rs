// src/lib.rs

//! Orderflow: the order lifecycle core of a single-vendor storefront.
//!
//! It covers what happens between "the buyer has a cart" and "the order is
//! delivered":
//!  - A status directory loaded once and shared, with a safe fallback.
//!  - A daily limit of one live order per buyer per business day.
//!  - Buyer-initiated cancellation while the order is still early enough.
//!  - A server-side mirror of the in-progress checkout.
//!  - Settlement through a hosted gateway or a discounted bank transfer.
//!  - Back-office status transitions and delivery appointments.
//!
//! Storage, the payment gateway and notification delivery are collaborator
//! traits; in-memory implementations live in [`store::memory`].

pub mod admin;
pub mod calendar;
pub mod cancellation;
pub mod catalog;
pub mod error;
pub mod gateway;
pub mod limit;
pub mod model;
pub mod notify;
pub mod pricing;
pub mod service;
pub mod session;
pub mod settings;
pub mod settlement;
pub mod status;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::admin::AdminOrderDesk;
pub use crate::calendar::{BusinessCalendar, Clock, ManualClock, SystemClock};
pub use crate::cancellation::CancellationPolicy;
pub use crate::catalog::{Catalog, CatalogEntry, StaticCatalog};
pub use crate::error::{GatewayError, OrderError, OrderResult, StoreError};
pub use crate::gateway::{GatewayConfirmation, PaymentGateway, PaymentToken, PaymentTokenRequest};
pub use crate::limit::{DailyLimitGuard, LimitDecision, LimitReason};
pub use crate::notify::{
  ChannelOutbox, DeliveryReport, NotificationOutbox, NotificationSink, OrderNotification, OutboxDispatcher,
};
pub use crate::service::{OrderService, ServiceDeps};
pub use crate::session::{CheckoutSessionSynchronizer, PreSettlementSync};
pub use crate::settings::{CheckoutSettings, DeliveryRates};
pub use crate::settlement::{GatewayOutcome, PaymentSettlementResolver, Settlement, SettlementDeps};
pub use crate::status::StatusDirectory;
pub use crate::store::{CheckoutSessionStore, OrderRepository, StatusSource};
