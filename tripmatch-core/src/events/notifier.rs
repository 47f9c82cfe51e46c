use super::channels::NotificationSender;
use super::types::Notification;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

/// Fire-and-forget notification sink injected into the processors.
///
/// `emit` never blocks and never fails; a notification that cannot be queued
/// is dropped.
pub trait Notifier: Send + Sync {
    fn emit(&self, notification: Notification);
}

/// Queues notifications for the `NotificationDispatcher`.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: NotificationSender,
}

impl ChannelNotifier {
    pub fn new(tx: NotificationSender) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn emit(&self, notification: Notification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(n)) => {
                warn!(user_id = %n.user_id, kind = ?n.kind, "Notification queue full, dropping");
            }
            Err(TrySendError::Closed(n)) => {
                warn!(user_id = %n.user_id, kind = ?n.kind, "Notification queue closed, dropping");
            }
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn emit(&self, _notification: Notification) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::notification_channel;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_channel_notifier_drops_when_full() {
        let (tx, mut rx) = notification_channel(1);
        let notifier = ChannelNotifier::new(tx);
        let user = Uuid::new_v4();
        let post = Uuid::new_v4();

        notifier.emit(Notification::new_post(user, post, "Paris"));
        notifier.emit(Notification::new_post(user, post, "Rome"));

        let first = rx.recv().await.unwrap();
        assert!(first.payload.message.contains("Paris"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_channel_notifier_survives_closed_queue() {
        let (tx, rx) = notification_channel(4);
        drop(rx);
        let notification = Notification::new_post(Uuid::new_v4(), Uuid::new_v4(), "Oslo");
        ChannelNotifier::new(tx).emit(notification);
    }
}
