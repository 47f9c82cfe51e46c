//! Application state shared across all request handlers.

use std::sync::Arc;
use tripmatch_core::config::SharedConfig;
use tripmatch_core::events::Notifier;
use tripmatch_core::processors::{
    MatchFinder, MatchLifecycle, OnlineUsers, PostPublisher, TripPromotion,
};
use tripmatch_core::store::MatchStore;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration (reloaded via SIGHUP).
    pub config: SharedConfig,
    pub publisher: PostPublisher,
    pub finder: MatchFinder,
    pub lifecycle: MatchLifecycle,
    pub promotion: TripPromotion,
    /// Presence registry shared with the notification dispatcher.
    pub online: OnlineUsers,
}

impl AppState {
    /// Create a new AppState.
    ///
    /// # Arguments
    ///
    /// * `store` - Match store every processor reads and writes through
    /// * `notifier` - Where processors queue notifications
    /// * `config` - Shared runtime configuration
    /// * `online` - Presence registry, also handed to the dispatcher
    pub fn new(
        store: Arc<dyn MatchStore>,
        notifier: Arc<dyn Notifier>,
        config: SharedConfig,
        online: OnlineUsers,
    ) -> Self {
        Self {
            publisher: PostPublisher::new(store.clone(), notifier.clone()),
            finder: MatchFinder::new(store.clone(), notifier.clone()),
            lifecycle: MatchLifecycle::new(
                store.clone(),
                notifier.clone(),
                config.matching.clone(),
            ),
            promotion: TripPromotion::new(store, notifier),
            config,
            online,
        }
    }
}
