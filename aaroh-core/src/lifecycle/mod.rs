//! Order and payment lifecycle.
//!
//! Purchases and custom song orders share one payment state machine.
//! The rules in [`state`] decide what is allowed; [`OrderLifecycle`]
//! applies them through guarded conditional updates so that concurrent
//! confirmations, webhooks and admin actions never double-apply.

mod error;
pub mod pricing;
mod service;
pub mod state;
mod validation;

#[cfg(test)]
mod tests;

pub use error::LifecycleError;
pub use pricing::{MIN_GATEWAY_AMOUNT, resolve_price, to_minor_units};
pub use service::{LifecycleStore, OrderLifecycle, PaymentSettings, WebhookOutcome};
pub use validation::email as validate_email;
