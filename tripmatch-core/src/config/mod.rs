//! Runtime configuration for Tripmatch.
//!
//! These types hold the validated configuration used by the processors and
//! the server. Loading and parsing the TOML file is the server crate's job.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Server configuration (listen address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Matching behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingConfig {
    /// Only the literals `accept` and `reject` are valid match responses.
    /// When off, anything other than `accept` counts as a rejection.
    pub strict_responses: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            strict_responses: true,
        }
    }
}

/// Promotion sweeper schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweeperConfig {
    pub enabled: bool,
    pub interval: Duration,
    /// Maximum acceptances re-checked per tick.
    pub batch_size: u32,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            batch_size: 50,
        }
    }
}

/// Notification queue sizing. Only read at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationsConfig {
    pub channel_buffer: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            channel_buffer: crate::events::DEFAULT_CHANNEL_BUFFER,
        }
    }
}

/// Shared configuration state with separate locks for each section.
///
/// This allows independent access to different configuration sections
/// without blocking other readers/writers.
#[derive(Clone)]
pub struct SharedConfig {
    pub server: Arc<RwLock<ServerConfig>>,
    pub matching: Arc<RwLock<MatchingConfig>>,
    pub sweeper: Arc<RwLock<SweeperConfig>>,
    pub notifications: Arc<RwLock<NotificationsConfig>>,
}

impl SharedConfig {
    pub fn new(
        server: ServerConfig,
        matching: MatchingConfig,
        sweeper: SweeperConfig,
        notifications: NotificationsConfig,
    ) -> Self {
        Self {
            server: Arc::new(RwLock::new(server)),
            matching: Arc::new(RwLock::new(matching)),
            sweeper: Arc::new(RwLock::new(sweeper)),
            notifications: Arc::new(RwLock::new(notifications)),
        }
    }
}
