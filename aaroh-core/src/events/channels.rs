use super::types::NotificationEvent;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

/// Default buffer size for the notification channel.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

pub type NotificationSender = mpsc::Sender<NotificationEvent>;
pub type NotificationReceiver = mpsc::Receiver<NotificationEvent>;

/// Create the notification channel shared by the API and the notifier.
pub fn notification_channel() -> (NotificationSender, NotificationReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Queue an event without waiting. Never fails the caller.
pub fn emit(sender: &NotificationSender, event: NotificationEvent) {
    let kind = event.kind();
    match sender.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            warn!(event = kind, "Notification channel full, dropping event");
        }
        Err(TrySendError::Closed(_)) => {
            warn!(event = kind, "Notification channel closed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_on_closed_channel_is_silent() {
        let (tx, rx) = notification_channel();
        drop(rx);
        emit(
            &tx,
            NotificationEvent::OtpRequested {
                email: "a@b.c".into(),
                code: "123456".into(),
            },
        );
    }

    #[tokio::test]
    async fn emit_delivers_in_order() {
        let (tx, mut rx) = notification_channel();
        let first = uuid::Uuid::now_v7();
        emit(&tx, NotificationEvent::PreviewReady { order_id: first });
        emit(
            &tx,
            NotificationEvent::OtpRequested {
                email: "a@b.c".into(),
                code: "000111".into(),
            },
        );
        assert_eq!(
            rx.recv().await,
            Some(NotificationEvent::PreviewReady { order_id: first })
        );
        assert_eq!(rx.recv().await.map(|e| e.kind()), Some("otp_requested"));
    }
}
