// storefront/src/db/mod.rs

//! Postgres implementations of the core's storage traits.

pub mod catalog;
pub mod orders;
pub mod sessions;
pub mod statuses;

pub use catalog::PgCatalog;
pub use orders::PgOrderRepository;
pub use sessions::PgCheckoutSessionStore;
pub use statuses::PgStatusSource;

use orderflow::StoreError;

pub(crate) const UNIQUE_VIOLATION: &str = "23505";

/// Name of the unique constraint a failed statement tripped, if that is what happened.
pub(crate) fn violated_unique_constraint(err: &sqlx::Error) -> Option<String> {
  match err {
    sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
      Some(db_err.constraint().unwrap_or_default().to_string())
    }
    _ => None,
  }
}

pub(crate) fn backend(err: sqlx::Error) -> StoreError {
  StoreError::Backend { source: err.into() }
}
