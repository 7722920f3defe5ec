// orderflow/src/model/mod.rs

//! Value types shared by every component.

pub mod checkout;
pub mod money;
pub mod order;
pub mod status;

pub use checkout::{CartLine, CheckoutForm, CheckoutSession, PaymentHold, SessionId, SessionUpdate};
pub use money::Money;
pub use order::{
  generate_order_number, BuyerSnapshot, ContactDetails, DeliveryMethod, DeliverySchedule, LineItem,
  LineItemsDocument, NewOrder, Order, OrderFilter, OrderId, OwnerId, PaymentPath, PaymentRecord, PriceBreakdown,
  ShippingAddress, SNAPSHOT_SCHEMA_VERSION,
};
pub use status::{names as status_names, OrderStatusRef, Status, StatusId, StatusKey, CANCELLABLE_STATUSES};
