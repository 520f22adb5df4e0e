//! Notifier processor.
//!
//! The Notifier is responsible for:
//! - Receiving `NotificationEvent` from the channel
//! - Looking up the order the event refers to
//! - Composing buyer and admin emails
//! - Handing them to the mailer
//!
//! Delivery is best effort. A failed send is logged and dropped; it never
//! reaches the request that caused the event.

use crate::clients::{EmailMessage, MailError, SendEmail};
use crate::config::EmailConfig;
use crate::entities::order_summary::{GetOrderSummary, OrderSummary};
use crate::entities::payable_order::{OrderKind, OrderRef};
use crate::events::{NotificationEvent, NotificationReceiver};
use kanau::processor::Processor;
use smallvec::{SmallVec, smallvec};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("order not found: {0}")]
    OrderNotFound(OrderRef),
}

pub struct Notifier<S, M> {
    store: S,
    mailer: M,
    email: Arc<RwLock<EmailConfig>>,
    events_rx: NotificationReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S, M> Notifier<S, M>
where
    S: Processor<GetOrderSummary, Output = Option<OrderSummary>, Error = sqlx::Error>,
    M: Processor<SendEmail, Output = (), Error = MailError>,
{
    pub fn new(
        store: S,
        mailer: M,
        email: Arc<RwLock<EmailConfig>>,
        events_rx: NotificationReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            mailer,
            email,
            events_rx,
            shutdown_rx,
        }
    }

    /// Run until shutdown is signalled or every sender is gone.
    pub async fn run(mut self) {
        info!("Notifier started");

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("Notifier received shutdown signal");
                        break;
                    }
                }

                event = self.events_rx.recv() => {
                    let Some(event) = event else {
                        info!("Notification channel closed");
                        break;
                    };
                    debug!(event = event.kind(), "Received NotificationEvent");

                    if let Err(e) = self.process_event(&event).await {
                        warn!(event = event.kind(), error = %e, "Failed to process NotificationEvent");
                    }
                }
            }
        }

        info!("Notifier shutdown complete");
    }

    /// Compose and send every email for `event`. Returns how many were accepted.
    async fn process_event(&self, event: &NotificationEvent) -> Result<usize, NotifyError> {
        let summary = match subject_order(event) {
            Some(order) => Some(
                self.store
                    .process(GetOrderSummary { order })
                    .await?
                    .ok_or(NotifyError::OrderNotFound(order))?,
            ),
            None => None,
        };
        let admin_address = self.email.read().await.admin_address.clone();

        let mut delivered = 0;
        for message in compose_messages(event, summary.as_ref(), &admin_address) {
            let to = message.to.clone();
            match self.mailer.process(SendEmail(message)).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(event = event.kind(), to = %to, error = %e, "Email delivery failed"),
            }
        }
        Ok(delivered)
    }
}

fn subject_order(event: &NotificationEvent) -> Option<OrderRef> {
    match event {
        NotificationEvent::OrderCreated { order }
        | NotificationEvent::PaymentCompleted { order }
        | NotificationEvent::PaymentFailed { order, .. } => Some(*order),
        NotificationEvent::PreviewReady { order_id } => Some(OrderRef::custom_song(*order_id)),
        NotificationEvent::OtpRequested { .. } => None,
    }
}

fn order_noun(kind: OrderKind) -> &'static str {
    match kind {
        OrderKind::Purchase => "course purchase",
        OrderKind::CustomSong => "custom song order",
    }
}

/// Emails for `event`: at most one to the buyer and one to the admin.
///
/// Order events without a `summary` produce nothing.
pub fn compose_messages(
    event: &NotificationEvent,
    summary: Option<&OrderSummary>,
    admin_address: &str,
) -> SmallVec<[EmailMessage; 2]> {
    if let NotificationEvent::OtpRequested { email, code } = event {
        return smallvec![EmailMessage {
            to: email.clone(),
            subject: "Your Aaroh login code".to_string(),
            text: format!("Your login code is {code}. It expires in 10 minutes."),
        }];
    }
    let Some(s) = summary else {
        return SmallVec::new();
    };
    let noun = order_noun(s.order.kind);

    match event {
        NotificationEvent::OrderCreated { .. } => smallvec![
            EmailMessage {
                to: s.user_email.clone(),
                subject: format!("We received your {noun}"),
                text: format!(
                    "Thank you! Your {noun} \"{}\" ({}) has been received. Amount: {}.",
                    s.title, s.order.id, s.amount
                ),
            },
            EmailMessage {
                to: admin_address.to_string(),
                subject: format!("New {noun}: {}", s.title),
                text: format!("{} placed {} ({}) for {}.", s.user_email, s.order, s.title, s.amount),
            },
        ],
        NotificationEvent::PreviewReady { .. } => smallvec![EmailMessage {
            to: s.user_email.clone(),
            subject: "Your song preview is ready".to_string(),
            text: format!(
                "The preview of \"{}\" is ready: {}\nComplete the payment to receive the full song.",
                s.title,
                s.preview_url.as_deref().unwrap_or("-")
            ),
        }],
        NotificationEvent::PaymentCompleted { .. } => smallvec![
            EmailMessage {
                to: s.user_email.clone(),
                subject: "Payment received".to_string(),
                text: format!("We received your payment of {} for \"{}\".", s.amount, s.title),
            },
            EmailMessage {
                to: admin_address.to_string(),
                subject: format!("Payment received: {}", s.title),
                text: format!("{} paid {} for {}.", s.user_email, s.amount, s.order),
            },
        ],
        NotificationEvent::PaymentFailed { reason, .. } => smallvec![EmailMessage {
            to: s.user_email.clone(),
            subject: "Payment failed".to_string(),
            text: format!(
                "Your payment for \"{}\" did not go through ({}). You can try again from your orders page.",
                s.title,
                reason.as_deref().unwrap_or("no reason given")
            ),
        }],
        NotificationEvent::OtpRequested { .. } => SmallVec::new(),
    }
}
