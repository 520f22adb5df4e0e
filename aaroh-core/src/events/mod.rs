//! Notification events.
//!
//! The lifecycle service emits a [`NotificationEvent`] after every state
//! change a human should hear about. Events carry identifiers rather than
//! full data; the [`Notifier`](crate::processors::Notifier) re-fetches what
//! it needs before composing emails.
//!
//! Delivery is best effort: a full or closed channel is logged and the
//! originating request still succeeds.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, NotificationReceiver, NotificationSender, emit, notification_channel,
};
pub use types::NotificationEvent;
