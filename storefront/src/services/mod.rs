// storefront/src/services/mod.rs

//! Stand-ins for the external collaborators: email delivery and the hosted payment gateway.

pub mod email_mock;
pub mod payment_mock;

pub use email_mock::MockEmailSink;
pub use payment_mock::MockPaymentGateway;
