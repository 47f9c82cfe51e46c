//! Notification plumbing.
//!
//! The matching processors never deliver anything themselves. They hand a
//! [`Notification`] to an injected [`Notifier`] and move on; delivery is best
//! effort.
//!
//! # Event Flow
//!
//! 1. A processor calls `Notifier::emit`
//! 2. `ChannelNotifier` queues the notification on an mpsc channel
//! 3. `NotificationDispatcher` drains the channel and broadcasts a
//!    `Delivery` for each notification addressed to an online user
//! 4. Each WebSocket connection forwards the deliveries for its own user

pub mod channels;
pub mod notifier;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, DeliveryReceiver, DeliverySender, NotificationReceiver,
    NotificationSender, delivery_channel, notification_channel,
};
pub use notifier::{ChannelNotifier, NoopNotifier, Notifier};
pub use types::{Delivery, Notification};
