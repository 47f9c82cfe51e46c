//! PromotionSweeper processor.
//!
//! Acceptance and trip promotion are separate writes, so a failed promotion
//! leaves an accepted match on an open post. The sweeper periodically
//! re-runs [`TripPromotion`] for accepted non-creator matches on active
//! posts, acting as the match's own user so the counterpart looked for is
//! the creator's seat. Failures are logged and retried on the next tick.
//!
//! Candidates are read oldest first. When a whole batch promotes nothing,
//! the next sweep starts after it, so rows that keep failing cannot hide
//! newer ones. The cursor wraps back to the start once a short batch is read.

use crate::config::SweeperConfig;
use crate::processors::trip_promotion::{PromoteToTrip, TripPromotion};
use crate::store::MatchStore;
use kanau::processor::Processor;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::{RwLock, watch};
use tracing::{debug, error, info, warn};

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    pub promoted: usize,
    pub failed: usize,
}

pub struct PromotionSweeper {
    store: Arc<dyn MatchStore>,
    promotion: TripPromotion,
    config: Arc<RwLock<SweeperConfig>>,
    shutdown_rx: watch::Receiver<bool>,
    offset: AtomicU32,
}

impl PromotionSweeper {
    /// Create a new PromotionSweeper.
    ///
    /// # Arguments
    ///
    /// * `store` - Match store
    /// * `promotion` - Trip promotion processor to re-run
    /// * `config` - Sweeper section of the shared config, re-read every tick
    /// * `shutdown_rx` - Receiver for shutdown signal
    pub fn new(
        store: Arc<dyn MatchStore>,
        promotion: TripPromotion,
        config: Arc<RwLock<SweeperConfig>>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            promotion,
            config,
            shutdown_rx,
            offset: AtomicU32::new(0),
        }
    }

    /// Run the PromotionSweeper until shutdown.
    pub async fn run(mut self) {
        info!("PromotionSweeper started");

        loop {
            let interval = self.config.read().await.interval;
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("PromotionSweeper received shutdown signal");
                        break;
                    }
                }

                _ = tokio::time::sleep(interval) => {
                    let (enabled, batch_size) = {
                        let config = self.config.read().await;
                        (config.enabled, config.batch_size)
                    };
                    if !enabled {
                        continue;
                    }
                    match self.sweep_once(batch_size).await {
                        Ok(report) if report.checked > 0 => {
                            info!(
                                checked = report.checked,
                                promoted = report.promoted,
                                failed = report.failed,
                                "Promotion sweep finished"
                            );
                        }
                        Ok(_) => debug!("Promotion sweep found nothing to do"),
                        Err(e) => error!(error = %e, "Promotion sweep failed"),
                    }
                }
            }
        }

        info!("PromotionSweeper shutdown complete");
    }

    /// Re-run promotion for up to `batch_size` pending acceptances.
    pub async fn sweep_once(
        &self,
        batch_size: u32,
    ) -> Result<SweepReport, crate::error::StoreError> {
        let offset = self.offset.load(Ordering::Relaxed);
        let candidates = self
            .store
            .find_unpromoted_acceptances(batch_size, offset)
            .await?;
        let full_batch = batch_size > 0 && candidates.len() >= batch_size as usize;
        let mut report = SweepReport {
            checked: candidates.len(),
            ..SweepReport::default()
        };

        for record in candidates {
            let cmd = PromoteToTrip {
                match_id: record.id,
                acting_user: record.user_id,
            };
            match self.promotion.process(cmd).await {
                Ok(Some(trip)) => {
                    info!(post_id = %trip.post_id, trip_id = %trip.id, "Sweeper promoted trip");
                    report.promoted += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(match_id = %record.id, error = %e, "Sweeper promotion failed");
                    report.failed += 1;
                }
            }
        }

        if full_batch && report.promoted == 0 {
            warn!(
                offset,
                failed = report.failed,
                "Whole promotion batch stalled, skipping past it next sweep"
            );
            let next = offset.saturating_add(batch_size);
            self.offset.store(next, Ordering::Relaxed);
        } else {
            self.offset.store(0, Ordering::Relaxed);
        }

        Ok(report)
    }
}
