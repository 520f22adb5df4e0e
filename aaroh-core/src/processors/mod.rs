//! Background processors.
//!
//! - `Notifier`: receives `NotificationEvent`, composes and sends emails

pub mod notifier;

pub use notifier::{NotifyError, Notifier, compose_messages};
