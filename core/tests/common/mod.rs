// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use orderflow::model::{
  CartLine, CheckoutForm, CheckoutSession, DeliveryMethod, DeliverySchedule, Money, NewOrder, Order, OrderFilter,
  OrderId, OrderStatusRef, OwnerId, PaymentHold, SessionId, SessionUpdate, Status, StatusId,
};
use orderflow::store::{MemoryOrderStore, MemorySessionStore, MemoryStatusSource};
use orderflow::{
  BusinessCalendar, CatalogEntry, CheckoutSessionStore, CheckoutSettings, GatewayError, ManualClock,
  NotificationOutbox, NotificationSink, OrderNotification, OrderRepository, OrderService, PaymentGateway,
  PaymentToken, PaymentTokenRequest, ServiceDeps, StaticCatalog, StatusDirectory, StatusSource, StoreError,
};
use parking_lot::Mutex;
use std::sync::{
  atomic::{AtomicBool, AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Fixed points in time ---

/// Tuesday 2026-03-10, 15:00 UTC.
pub fn t0() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap()
}

pub fn owner(name: &str) -> OwnerId {
  OwnerId::new(name).unwrap()
}

/// A valid session id, distinct per `n`.
pub fn session_id(n: u32) -> SessionId {
  SessionId::new(format!("checkout-session-{:04}", n)).unwrap()
}

pub fn complete_form() -> CheckoutForm {
  CheckoutForm {
    full_name: Some("Ana Ruiz".to_string()),
    email: Some("ana@example.com".to_string()),
    phone: Some("+54 11 5555 0000".to_string()),
    document_id: Some("30111222".to_string()),
    delivery_method: Some(DeliveryMethod::Domestic),
    street: Some("Av. Siempre Viva 742".to_string()),
    city: Some("Rosario".to_string()),
    province: Some("Santa Fe".to_string()),
    postal_code: Some("2000".to_string()),
    notes: None,
  }
}

pub fn cart_line(product_id: &str, quantity: u32) -> CartLine {
  CartLine {
    product_id: product_id.to_string(),
    quantity,
    name: None,
    unit_price: None,
  }
}

/// 2 x cpap (100.00) + 1 x mask (50.00).
pub fn standard_cart() -> Vec<CartLine> {
  vec![cart_line("cpap", 2), cart_line("mask", 1)]
}

pub fn standard_update(id: &SessionId) -> SessionUpdate {
  SessionUpdate {
    session_id: id.clone(),
    form: complete_form(),
    cart: standard_cart(),
    computed_total: Some(Money::from_major(270)),
  }
}

pub fn test_catalog() -> StaticCatalog {
  let catalog = StaticCatalog::new()
    .with_product("cpap", "CPAP machine", Money::from_major(100))
    .with_product("mask", "Nasal mask", Money::from_major(50))
    .with_product("filter", "Replacement filter", Money::from_major(10));
  catalog.upsert(CatalogEntry {
    product_id: "discontinued".to_string(),
    name: "Old humidifier".to_string(),
    unit_price: Money::from_major(80),
    available: false,
  });
  catalog
}

// --- Order store with switchable outages ---

#[derive(Default)]
pub struct FlakyOrderStore {
  pub inner: MemoryOrderStore,
  pub fail_reads: AtomicBool,
  pub fail_writes: AtomicBool,
}

impl FlakyOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_fail_reads(&self, on: bool) {
    self.fail_reads.store(on, Ordering::SeqCst);
  }

  pub fn set_fail_writes(&self, on: bool) {
    self.fail_writes.store(on, Ordering::SeqCst);
  }

  fn read_guard(&self) -> Result<(), StoreError> {
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(anyhow::anyhow!("simulated read outage").into());
    }
    Ok(())
  }

  fn write_guard(&self) -> Result<(), StoreError> {
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(anyhow::anyhow!("simulated write outage").into());
    }
    Ok(())
  }

  /// Active orders per (owner, business day), straight from the backing table.
  pub async fn active_count(&self, owner: &OwnerId, day: chrono::NaiveDate) -> usize {
    self
      .inner
      .list_for_owner(owner, &OrderFilter::all())
      .await
      .unwrap()
      .iter()
      .filter(|o| o.business_day == day && o.is_active())
      .count()
  }
}

#[async_trait]
impl OrderRepository for FlakyOrderStore {
  async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
    self.write_guard()?;
    self.inner.insert(order).await
  }

  async fn find(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
    self.read_guard()?;
    self.inner.find(id).await
  }

  async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>, StoreError> {
    self.read_guard()?;
    self.inner.find_by_reference(reference).await
  }

  async fn list_for_owner(&self, owner: &OwnerId, filter: &OrderFilter) -> Result<Vec<Order>, StoreError> {
    self.read_guard()?;
    self.inner.list_for_owner(owner, filter).await
  }

  async fn update_status(
    &self,
    id: OrderId,
    expected: Option<StatusId>,
    next: &OrderStatusRef,
    at: DateTime<Utc>,
  ) -> Result<Order, StoreError> {
    self.write_guard()?;
    self.inner.update_status(id, expected, next, at).await
  }

  async fn set_delivery_schedule(
    &self,
    id: OrderId,
    expected: StatusId,
    schedule: &DeliverySchedule,
    at: DateTime<Utc>,
  ) -> Result<Order, StoreError> {
    self.write_guard()?;
    self.inner.set_delivery_schedule(id, expected, schedule, at).await
  }
}

// --- Session store that can be slowed down or broken ---

#[derive(Default)]
pub struct SlowSessionStore {
  pub inner: MemorySessionStore,
  pub upsert_delay_ms: AtomicUsize,
  pub fail_upserts: AtomicBool,
}

impl SlowSessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_upsert_delay(&self, delay: std::time::Duration) {
    self.upsert_delay_ms.store(delay.as_millis() as usize, Ordering::SeqCst);
  }

  pub fn set_fail_upserts(&self, on: bool) {
    self.fail_upserts.store(on, Ordering::SeqCst);
  }
}

#[async_trait]
impl CheckoutSessionStore for SlowSessionStore {
  async fn upsert(&self, update: SessionUpdate, at: DateTime<Utc>) -> Result<CheckoutSession, StoreError> {
    let delay = self.upsert_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
      tokio::time::sleep(std::time::Duration::from_millis(delay as u64)).await;
    }
    if self.fail_upserts.load(Ordering::SeqCst) {
      return Err(anyhow::anyhow!("simulated session store outage").into());
    }
    self.inner.upsert(update, at).await
  }

  async fn get(&self, id: &SessionId) -> Result<Option<CheckoutSession>, StoreError> {
    self.inner.get(id).await
  }

  async fn submit(
    &self,
    id: &SessionId,
    owner: &OwnerId,
    hold: Option<&PaymentHold>,
  ) -> Result<CheckoutSession, StoreError> {
    self.inner.submit(id, owner, hold).await
  }

  async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
    self.inner.purge_older_than(cutoff).await
  }
}

// --- Status source that can go dark after the first load ---

pub struct SwitchableStatusSource {
  pub inner: Mutex<MemoryStatusSource>,
  pub fail: AtomicBool,
}

impl SwitchableStatusSource {
  pub fn seeded() -> Self {
    Self {
      inner: Mutex::new(MemoryStatusSource::seeded()),
      fail: AtomicBool::new(false),
    }
  }

  pub fn failing() -> Self {
    let source = Self::seeded();
    source.fail.store(true, Ordering::SeqCst);
    source
  }

  pub fn replace(&self, statuses: Vec<Status>) {
    *self.inner.lock() = MemoryStatusSource::new(statuses);
  }
}

#[async_trait]
impl StatusSource for SwitchableStatusSource {
  async fn load_statuses(&self) -> Result<Vec<Status>, StoreError> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(anyhow::anyhow!("status table unreachable").into());
    }
    let source = self.inner.lock().clone();
    source.load_statuses().await
  }
}

// --- Outbox and sink doubles ---

#[derive(Default)]
pub struct RecordingOutbox {
  pub queued: Mutex<Vec<OrderNotification>>,
}

impl RecordingOutbox {
  pub fn count(&self) -> usize {
    self.queued.lock().len()
  }
}

impl NotificationOutbox for RecordingOutbox {
  fn enqueue(&self, notification: OrderNotification) {
    self.queued.lock().push(notification);
  }
}

#[derive(Default)]
pub struct RecordingSink {
  pub fail_customer: AtomicBool,
  pub fail_admin: AtomicBool,
  pub customer_sent: Mutex<Vec<OrderId>>,
  pub admin_sent: Mutex<Vec<OrderId>>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
  async fn send_customer_confirmation(&self, notification: &OrderNotification) -> anyhow::Result<()> {
    if self.fail_customer.load(Ordering::SeqCst) {
      anyhow::bail!("smtp relay refused the customer message");
    }
    self.customer_sent.lock().push(notification.order_id);
    Ok(())
  }

  async fn send_admin_alert(&self, notification: &OrderNotification) -> anyhow::Result<()> {
    if self.fail_admin.load(Ordering::SeqCst) {
      anyhow::bail!("smtp relay refused the admin message");
    }
    self.admin_sent.lock().push(notification.order_id);
    Ok(())
  }
}

// --- Gateway double ---

#[derive(Default)]
pub struct MockGateway {
  pub unreachable: AtomicBool,
  pub requests: Mutex<Vec<PaymentTokenRequest>>,
}

#[async_trait]
impl PaymentGateway for MockGateway {
  async fn request_token(&self, request: PaymentTokenRequest) -> Result<PaymentToken, GatewayError> {
    if self.unreachable.load(Ordering::SeqCst) {
      return Err(GatewayError::Unreachable {
        source: anyhow::anyhow!("connection refused"),
      });
    }
    let token = PaymentToken {
      token: format!("tok_{}", request.reference),
      redirect_url: format!("https://pay.example.test/checkout/{}", request.reference),
      expires_at: t0() + Duration::minutes(30),
    };
    self.requests.lock().push(request);
    Ok(token)
  }
}

// --- Fully wired service over in-memory collaborators ---

pub struct Harness {
  pub service: OrderService,
  pub orders: Arc<FlakyOrderStore>,
  pub sessions: Arc<SlowSessionStore>,
  pub statuses: Arc<StatusDirectory>,
  pub status_source: Arc<SwitchableStatusSource>,
  pub catalog: Arc<StaticCatalog>,
  pub gateway: Arc<MockGateway>,
  pub outbox: Arc<RecordingOutbox>,
  pub clock: Arc<ManualClock>,
  pub calendar: BusinessCalendar,
}

impl Harness {
  pub async fn new() -> Self {
    Self::with_calendar(BusinessCalendar::utc()).await
  }

  pub async fn with_calendar(calendar: BusinessCalendar) -> Self {
    Self::build(calendar, Arc::new(SwitchableStatusSource::seeded())).await
  }

  /// Wires the service over `status_source`, whatever state it is in.
  pub async fn with_status_source(status_source: Arc<SwitchableStatusSource>) -> Self {
    Self::build(BusinessCalendar::utc(), status_source).await
  }

  async fn build(calendar: BusinessCalendar, status_source: Arc<SwitchableStatusSource>) -> Self {
    let orders = Arc::new(FlakyOrderStore::new());
    let sessions = Arc::new(SlowSessionStore::new());
    let statuses = Arc::new(StatusDirectory::load(status_source.clone()).await);
    let catalog = Arc::new(test_catalog());
    let gateway = Arc::new(MockGateway::default());
    let outbox = Arc::new(RecordingOutbox::default());
    let clock = Arc::new(ManualClock::new(t0()));
    let settings = CheckoutSettings {
      forced_sync_timeout: std::time::Duration::from_millis(100),
      ..CheckoutSettings::default()
    };

    let service = OrderService::new(ServiceDeps {
      orders: orders.clone(),
      sessions: sessions.clone(),
      statuses: statuses.clone(),
      catalog: catalog.clone(),
      gateway: gateway.clone(),
      outbox: outbox.clone(),
      clock: clock.clone(),
      calendar,
      settings,
    });

    Self {
      service,
      orders,
      sessions,
      statuses,
      status_source,
      catalog,
      gateway,
      outbox,
      clock,
      calendar,
    }
  }

  /// Syncs the standard checkout under session `n` and returns its id.
  pub async fn prepare_session(&self, n: u32) -> SessionId {
    let id = session_id(n);
    self.service.sync_checkout_session(standard_update(&id)).await.unwrap();
    id
  }

  /// Places a bank-transfer order for `who` through a fresh session `n`.
  pub async fn place_bank_order(&self, who: &OwnerId, n: u32) -> Order {
    let id = self.prepare_session(n).await;
    match self
      .service
      .create_order_from_session(who, &id, orderflow::model::PaymentPath::BankTransfer, None)
      .await
      .unwrap()
    {
      orderflow::Settlement::Placed { order, .. } => order,
      other => panic!("expected a placed order, got {:?}", other),
    }
  }
}
