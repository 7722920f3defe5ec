// storefront/src/models/mod.rs

//! Row shapes for the Postgres tables and their conversion into core types.

pub mod checkout_session;
pub mod order;
pub mod product;
pub mod status;

pub use checkout_session::CheckoutSessionRow;
pub use order::{OrderRow, ORDER_COLUMNS};
pub use product::ProductRow;
pub use status::StatusRow;
