//! Event channel factories and handles.

use super::types::{Delivery, Notification};
use tokio::sync::{broadcast, mpsc};

/// Default buffer size for event channels.
///
/// This provides enough buffer to handle bursts while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for queued notifications.
pub type NotificationSender = mpsc::Sender<Notification>;
/// Receiver handle for queued notifications.
pub type NotificationReceiver = mpsc::Receiver<Notification>;

/// Sender handle for socket deliveries.
pub type DeliverySender = broadcast::Sender<Delivery>;
/// Receiver handle for socket deliveries.
pub type DeliveryReceiver = broadcast::Receiver<Delivery>;

/// Create the notification queue drained by the dispatcher.
pub fn notification_channel(buffer: usize) -> (NotificationSender, NotificationReceiver) {
    mpsc::channel(buffer.max(1))
}

/// Create the delivery broadcast. Receivers come from `subscribe()`.
pub fn delivery_channel(buffer: usize) -> DeliverySender {
    let (tx, _) = broadcast::channel(buffer.max(1));
    tx
}
