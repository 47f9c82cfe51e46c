//! NotificationDispatcher processor.
//!
//! The NotificationDispatcher is responsible for:
//! - Receiving `Notification` events from the queue
//! - Dropping notifications for users with no open connection
//! - Broadcasting the rest as `Delivery::Notify` to every socket task
//!
//! [`OnlineUsers`] counts open connections per user and broadcasts the
//! online list whenever it changes.

use crate::events::{
    Delivery, DeliveryReceiver, DeliverySender, Notification, NotificationReceiver,
};
use kanau::processor::Processor;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info};
use uuid::Uuid;

/// Connection counts per user. A user may have several sockets open.
#[derive(Clone)]
pub struct OnlineUsers {
    connections: Arc<RwLock<HashMap<Uuid, usize>>>,
    deliveries: DeliverySender,
}

impl OnlineUsers {
    pub fn new(deliveries: DeliverySender) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            deliveries,
        }
    }

    /// Subscribe before calling [`connect`](Self::connect) to receive the
    /// online list that includes yourself.
    pub fn subscribe(&self) -> DeliveryReceiver {
        self.deliveries.subscribe()
    }

    pub async fn connect(&self, user_id: Uuid) {
        let snapshot = {
            let mut connections = self.connections.write().await;
            *connections.entry(user_id).or_insert(0) += 1;
            sorted_users(&connections)
        };
        debug!(user_id = %user_id, online = snapshot.len(), "User connected");
        let _ = self.deliveries.send(Delivery::OnlineUsers(snapshot));
    }

    pub async fn disconnect(&self, user_id: Uuid) {
        let snapshot = {
            let mut connections = self.connections.write().await;
            match connections.get_mut(&user_id) {
                Some(n) if *n > 1 => *n -= 1,
                Some(_) => {
                    connections.remove(&user_id);
                }
                None => return,
            }
            sorted_users(&connections)
        };
        debug!(user_id = %user_id, online = snapshot.len(), "User disconnected");
        let _ = self.deliveries.send(Delivery::OnlineUsers(snapshot));
    }

    pub async fn is_online(&self, user_id: Uuid) -> bool {
        self.connections.read().await.contains_key(&user_id)
    }

    pub async fn snapshot(&self) -> Vec<Uuid> {
        sorted_users(&*self.connections.read().await)
    }
}

fn sorted_users(connections: &HashMap<Uuid, usize>) -> Vec<Uuid> {
    let mut users: Vec<Uuid> = connections.keys().copied().collect();
    users.sort();
    users
}

pub struct NotificationDispatcher {
    online: OnlineUsers,
    notification_rx: NotificationReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl NotificationDispatcher {
    /// Create a new NotificationDispatcher.
    ///
    /// # Arguments
    ///
    /// * `online` - Presence registry shared with the socket handlers
    /// * `notification_rx` - Receiver for queued notifications
    /// * `shutdown_rx` - Receiver for shutdown signal
    pub fn new(
        online: OnlineUsers,
        notification_rx: NotificationReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            online,
            notification_rx,
            shutdown_rx,
        }
    }

    /// Run the NotificationDispatcher.
    pub async fn run(mut self) {
        info!("NotificationDispatcher started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("NotificationDispatcher received shutdown signal");
                        break;
                    }
                }

                Some(notification) = self.notification_rx.recv() => {
                    let Ok(_delivered) = self.process(notification).await;
                }

                else => {
                    info!("Notification channel closed");
                    break;
                }
            }
        }

        info!("NotificationDispatcher shutdown complete");
    }
}

impl Processor<Notification> for NotificationDispatcher {
    /// Whether the notification was handed to at least one socket.
    type Output = bool;
    type Error = Infallible;
    async fn process(&self, notification: Notification) -> Result<bool, Infallible> {
        if !self.online.is_online(notification.user_id).await {
            debug!(
                user_id = %notification.user_id,
                kind = ?notification.kind,
                "User offline, dropping notification"
            );
            return Ok(false);
        }
        let delivered = self
            .online
            .deliveries
            .send(Delivery::Notify(notification))
            .is_ok();
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{delivery_channel, notification_channel};

    fn dispatcher() -> (NotificationDispatcher, OnlineUsers) {
        let online = OnlineUsers::new(delivery_channel(16));
        let (_tx, rx) = notification_channel(16);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        (
            NotificationDispatcher::new(online.clone(), rx, shutdown_rx),
            online,
        )
    }

    #[tokio::test]
    async fn test_presence_counts_connections() {
        let online = OnlineUsers::new(delivery_channel(16));
        let mut rx = online.subscribe();
        let user = Uuid::new_v4();

        online.connect(user).await;
        online.connect(user).await;
        online.disconnect(user).await;
        assert!(online.is_online(user).await);
        online.disconnect(user).await;
        assert!(!online.is_online(user).await);

        assert_eq!(rx.recv().await.unwrap(), Delivery::OnlineUsers(vec![user]));
        assert_eq!(rx.recv().await.unwrap(), Delivery::OnlineUsers(vec![user]));
        assert_eq!(rx.recv().await.unwrap(), Delivery::OnlineUsers(vec![user]));
        assert_eq!(rx.recv().await.unwrap(), Delivery::OnlineUsers(vec![]));
    }

    #[tokio::test]
    async fn test_offline_users_are_skipped() {
        let (dispatcher, online) = dispatcher();
        let mut rx = online.subscribe();
        let offline = Uuid::new_v4();

        let delivered = dispatcher
            .process(Notification::new_post(offline, Uuid::new_v4(), "Lima"))
            .await
            .unwrap();
        assert!(!delivered);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_online_users_receive_notifications() {
        let (dispatcher, online) = dispatcher();
        let user = Uuid::new_v4();
        online.connect(user).await;
        let mut rx = online.subscribe();

        let notification = Notification::new_post(user, Uuid::new_v4(), "Lima");
        let delivered = dispatcher.process(notification.clone()).await.unwrap();
        assert!(delivered);
        assert_eq!(rx.recv().await.unwrap(), Delivery::Notify(notification));
    }

    #[tokio::test]
    async fn test_run_drains_queue_until_shutdown() {
        let online = OnlineUsers::new(delivery_channel(16));
        let (tx, rx) = notification_channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let user = Uuid::new_v4();
        online.connect(user).await;
        let mut deliveries = online.subscribe();

        let handle = tokio::spawn(NotificationDispatcher::new(online, rx, shutdown_rx).run());
        let notification = Notification::new_post(user, Uuid::new_v4(), "Quito");
        tx.send(notification.clone()).await.unwrap();
        let delivered = deliveries.recv().await.unwrap();
        assert_eq!(delivered, Delivery::Notify(notification));

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
