// orderflow/src/settlement.rs

//! Payment settlement: turns a checkout session into exactly one order.
//!
//! Both payment paths share the session id as their idempotency reference.
//! Bank transfers create the order synchronously; the hosted gateway only
//! issues a token here and the order appears when the gateway confirms.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::calendar::Clock;
use crate::catalog::Catalog;
use crate::error::{OrderError, OrderResult, StoreError};
use crate::gateway::{settlement_reference, GatewayConfirmation, PaymentGateway, PaymentToken, PaymentTokenRequest};
use crate::limit::DailyLimitGuard;
use crate::model::{
  generate_order_number, status_names, BuyerSnapshot, CheckoutSession, LineItem, NewOrder, Order, OwnerId,
  PaymentHold, PaymentPath, PaymentRecord, PriceBreakdown, SessionId,
};
use crate::notify::{NotificationOutbox, OrderNotification};
use crate::pricing::{build_line_items, quote};
use crate::session::CheckoutSessionSynchronizer;
use crate::settings::CheckoutSettings;
use crate::status::StatusDirectory;
use crate::store::OrderRepository;

/// What `settle` hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Settlement {
  /// Hosted gateway: send the buyer to `token.redirect_url`. No order yet.
  Redirect {
    reference: String,
    token: PaymentToken,
    pricing: PriceBreakdown,
    currency: String,
  },
  /// Bank transfer: the order exists. The client should empty its cart.
  Placed { order: Order, clear_cart: bool },
}

/// Result of feeding a gateway callback back into settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GatewayOutcome {
  Recorded { order: Order },
  /// A retried callback for a reference that already produced an order.
  AlreadyRecorded { order: Order },
  Declined { reference: String },
}

/// A session that passed validation and pricing.
struct PricedCheckout {
  buyer: BuyerSnapshot,
  line_items: Vec<LineItem>,
  pricing: PriceBreakdown,
  currency: String,
}

impl PricedCheckout {
  fn hold(self, held_at: DateTime<Utc>) -> PaymentHold {
    PaymentHold {
      buyer: self.buyer,
      line_items: self.line_items,
      pricing: self.pricing,
      currency: self.currency,
      held_at,
    }
  }
}

impl From<PaymentHold> for PricedCheckout {
  fn from(hold: PaymentHold) -> Self {
    PricedCheckout {
      buyer: hold.buyer,
      line_items: hold.line_items,
      pricing: hold.pricing,
      currency: hold.currency,
    }
  }
}

pub struct SettlementDeps {
  pub sessions: CheckoutSessionSynchronizer,
  pub orders: Arc<dyn OrderRepository>,
  pub limit: DailyLimitGuard,
  pub statuses: Arc<StatusDirectory>,
  pub catalog: Arc<dyn Catalog>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub outbox: Arc<dyn NotificationOutbox>,
  pub clock: Arc<dyn Clock>,
  pub settings: CheckoutSettings,
}

pub struct PaymentSettlementResolver {
  deps: SettlementDeps,
}

impl PaymentSettlementResolver {
  pub fn new(deps: SettlementDeps) -> Self {
    Self { deps }
  }

  /// Settles the session `session_id` for `owner` through `path`.
  ///
  /// Calling it again after a transient failure is safe: a bank transfer that
  /// already went through is reported as `DuplicateSettlement`, and a repeated
  /// gateway request charges the amount frozen by the first one.
  #[instrument(
    name = "PaymentSettlementResolver::settle",
    skip(self),
    fields(owner = %owner, session_id = %session_id, path = %path),
    err(Display)
  )]
  pub async fn settle(&self, owner: &OwnerId, session_id: &SessionId, path: PaymentPath) -> OrderResult<Settlement> {
    let session = self.deps.sessions.consume(session_id).await?;
    let unbound = self.check_session_owner(&session, owner)?;

    let reference = settlement_reference(session_id);
    self.reject_reused_reference(&reference).await?;
    self.deps.limit.enforce(owner).await?;

    match path {
      PaymentPath::HostedGateway => {
        let hold = match session.payment_hold.clone() {
          Some(hold) => {
            info!(total = %hold.pricing.total, "Reusing the checkout frozen by an earlier token request.");
            hold
          }
          None => self.price(&session, path).await?.hold(self.deps.clock.now()),
        };
        self.deps.sessions.submit(session_id, owner, Some(&hold)).await?;

        let request = PaymentTokenRequest {
          reference: reference.clone(),
          amount: hold.pricing.total,
          currency: hold.currency.clone(),
          description: format!("Order of {} item(s)", hold.line_items.len()),
          payer_email: hold.buyer.contact.email.clone(),
        };
        let token = self
          .deps
          .gateway
          .request_token(request)
          .await
          .map_err(|source| OrderError::ProviderUnavailable { source })?;
        info!(%reference, total = %hold.pricing.total, "Gateway token issued.");
        Ok(Settlement::Redirect {
          reference,
          token,
          pricing: hold.pricing,
          currency: hold.currency,
        })
      }
      PaymentPath::BankTransfer => {
        let priced = self.price(&session, path).await?;
        if unbound {
          self.deps.sessions.submit(session_id, owner, None).await?;
        }
        let payment = PaymentRecord {
          path: PaymentPath::BankTransfer,
          gateway_payment_id: None,
        };
        let order = self.create_order(owner, reference, priced, payment).await?;
        info!(order_id = order.id, total = %order.pricing.total, "Bank-transfer order placed.");
        Ok(Settlement::Placed { order, clear_cart: true })
      }
    }
  }

  /// Records the outcome reported by the gateway callback.
  ///
  /// The order is built from the checkout frozen when the token was issued,
  /// never from the live session or catalog.
  /// Idempotent on the reference: a retried callback gets the existing order.
  /// The daily limit was checked when the token was issued; the payment is
  /// already captured at this point, so only the storage constraint applies.
  #[instrument(
    name = "PaymentSettlementResolver::confirm_gateway_payment",
    skip(self, confirmation),
    fields(reference = %confirmation.reference, approved = confirmation.approved),
    err(Display)
  )]
  pub async fn confirm_gateway_payment(&self, confirmation: GatewayConfirmation) -> OrderResult<GatewayOutcome> {
    if let Some(order) = self
      .deps
      .orders
      .find_by_reference(&confirmation.reference)
      .await
      .map_err(|e| OrderError::persistence("confirm_gateway_payment.lookup", e))?
    {
      info!(order_id = order.id, "Gateway callback already recorded.");
      return Ok(GatewayOutcome::AlreadyRecorded { order });
    }

    if !confirmation.approved {
      info!("Gateway reported a declined payment; nothing to record.");
      return Ok(GatewayOutcome::Declined {
        reference: confirmation.reference,
      });
    }

    let session_id = SessionId::new(confirmation.reference.clone())?;
    let session = self.deps.sessions.consume(&session_id).await?;
    let (owner, hold) = match (session.owner, session.payment_hold) {
      (Some(owner), Some(hold)) => (owner, hold),
      _ => {
        return Err(OrderError::Validation(format!(
          "Checkout session '{}' was never submitted for gateway payment.",
          session_id
        )))
      }
    };

    if hold.pricing.total != confirmation.amount {
      error!(
        expected = %hold.pricing.total,
        reported = %confirmation.amount,
        "Gateway amount does not match the frozen checkout total."
      );
      return Err(OrderError::Validation(format!(
        "Paid amount {} does not match the order total {}.",
        confirmation.amount, hold.pricing.total
      )));
    }

    let payment = PaymentRecord {
      path: PaymentPath::HostedGateway,
      gateway_payment_id: Some(confirmation.gateway_payment_id.clone()),
    };
    match self
      .create_order(&owner, confirmation.reference.clone(), hold.into(), payment)
      .await
    {
      Ok(order) => {
        info!(order_id = order.id, "Gateway payment recorded as order.");
        Ok(GatewayOutcome::Recorded { order })
      }
      // Two deliveries of the same callback raced; the other one won.
      Err(OrderError::DuplicateSettlement { reference }) => {
        let order = self
          .deps
          .orders
          .find_by_reference(&reference)
          .await
          .map_err(|e| OrderError::persistence("confirm_gateway_payment.reload", e))?
          .ok_or_else(|| OrderError::persistence("confirm_gateway_payment.reload", StoreError::NotFound))?;
        Ok(GatewayOutcome::AlreadyRecorded { order })
      }
      Err(e) => {
        if let OrderError::DailyLimitExceeded { blocking_order } = &e {
          error!(
            blocking_order = blocking_order.id,
            gateway_payment_id = %confirmation.gateway_payment_id,
            "Captured payment could not become an order; needs manual reconciliation."
          );
        }
        Err(e)
      }
    }
  }

  /// Refuses a session already submitted by another buyer. Returns whether
  /// the session still has to be bound to `owner`.
  fn check_session_owner(&self, session: &CheckoutSession, owner: &OwnerId) -> OrderResult<bool> {
    match &session.owner {
      Some(bound) if bound == owner => Ok(false),
      Some(_) => {
        warn!("Checkout session already submitted by another buyer.");
        Err(OrderError::NotAuthorized {
          resource: format!("checkout session {}", session.session_id),
        })
      }
      None => Ok(true),
    }
  }

  /// Early duplicate detection for a friendlier error. The store's unique
  /// reference is what actually prevents a second order, so an unreadable
  /// store does not stop settlement here.
  async fn reject_reused_reference(&self, reference: &str) -> OrderResult<()> {
    match self.deps.orders.find_by_reference(reference).await {
      Ok(Some(existing)) => {
        info!(order_id = existing.id, "Settlement reference already used.");
        Err(OrderError::DuplicateSettlement {
          reference: reference.to_string(),
        })
      }
      Ok(None) => Ok(()),
      Err(e) => {
        warn!(error = %e, "Could not pre-check settlement reference; relying on the store constraint.");
        Ok(())
      }
    }
  }

  async fn price(&self, session: &CheckoutSession, path: PaymentPath) -> OrderResult<PricedCheckout> {
    let buyer = session.form.to_buyer_snapshot()?;
    let line_items = build_line_items(self.deps.catalog.as_ref(), &session.cart).await?;
    let pricing = quote(
      &line_items,
      buyer.delivery_method,
      &self.deps.settings.delivery_rates,
      path,
    )?;

    // Display-only; the server quote is what gets charged.
    if let Some(shown) = session.computed_total.filter(|shown| *shown != pricing.total) {
      warn!(%shown, computed = %pricing.total, "Client-side total differs from the server quote.");
    }

    Ok(PricedCheckout {
      buyer,
      line_items,
      pricing,
      currency: self.deps.settings.currency.clone(),
    })
  }

  async fn create_order(
    &self,
    owner: &OwnerId,
    reference: String,
    priced: PricedCheckout,
    payment: PaymentRecord,
  ) -> OrderResult<Order> {
    let now = self.deps.clock.now();
    let business_day = self.deps.limit.calendar().business_day(now);
    let received = self.deps.statuses.resolve(status_names::RECEIVED);

    let new_order = NewOrder {
      order_number: Some(generate_order_number(business_day)),
      provider_reference: Some(reference.clone()),
      owner: owner.clone(),
      buyer: priced.buyer,
      line_items: priced.line_items,
      pricing: priced.pricing,
      currency: priced.currency,
      payment,
      status: received.reference(),
      business_day,
      created_at: now,
    };

    let order = match self.deps.orders.insert(new_order).await {
      Ok(order) => order,
      Err(StoreError::DuplicateReference { reference }) => {
        return Err(OrderError::DuplicateSettlement { reference });
      }
      Err(StoreError::ActiveOrderExists { .. }) => {
        // Lost the check-then-insert race; report whichever order won.
        let decision = self.deps.limit.can_place_order(owner).await;
        return match decision.blocking_order {
          Some(blocking) => Err(OrderError::DailyLimitExceeded {
            blocking_order: Box::new(blocking),
          }),
          None => Err(OrderError::persistence(
            "create_order",
            StoreError::ActiveOrderExists {
              owner: owner.to_string(),
              business_day,
            },
          )),
        };
      }
      Err(e) => return Err(OrderError::persistence("create_order", e)),
    };

    self.deps.outbox.enqueue(OrderNotification::from_order(&order));
    Ok(order)
  }
}
