//! Account refresh coordinator
//!
//! Wraps the gateway's `update` in a bounded, scheduled refresh and publishes
//! the result as an immutable snapshot list on a watch channel. A failed or
//! timed-out refresh never tears anything down: consumers keep reading the
//! previous list until a later refresh succeeds.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::error::{FormentorError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::weconnect::{VehicleGateway, VehicleSnapshot};

/// Aggregate counters over all refresh attempts
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollStats {
    pub total_polls: u64,
    pub failed_polls: u64,
    pub last_duration_ms: Option<u64>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Periodic refresh driver with stale-cache fallback
pub struct UpdateCoordinator {
    gateway: Arc<dyn VehicleGateway>,
    refresh_timeout: Duration,
    cache_tx: watch::Sender<Arc<Vec<VehicleSnapshot>>>,
    stats: Mutex<PollStats>,
    logger: StructuredLogger,
}

impl UpdateCoordinator {
    pub fn new(gateway: Arc<dyn VehicleGateway>, refresh_timeout: Duration) -> Self {
        let (cache_tx, _rx) = watch::channel(Arc::new(Vec::new()));
        Self {
            gateway,
            refresh_timeout,
            cache_tx,
            stats: Mutex::new(PollStats::default()),
            logger: get_logger("coordinator"),
        }
    }

    /// Latest published snapshot list
    pub fn cached(&self) -> Arc<Vec<VehicleSnapshot>> {
        self.cache_tx.borrow().clone()
    }

    /// Watch handle that observes every cache replacement
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<VehicleSnapshot>>> {
        self.cache_tx.subscribe()
    }

    pub fn stats(&self) -> PollStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Eager refresh at startup. Unlike [`Self::refresh`], errors propagate so
    /// setup can fail loudly instead of running on an empty cache.
    pub async fn first_refresh(&self) -> Result<Arc<Vec<VehicleSnapshot>>> {
        self.try_refresh().await
    }

    /// Scheduled refresh. On failure the previous cache is returned unchanged;
    /// the failure only shows up in the log and the stats.
    pub async fn refresh(&self) -> Arc<Vec<VehicleSnapshot>> {
        match self.try_refresh().await {
            Ok(list) => list,
            Err(FormentorError::Timeout { .. }) => {
                self.logger
                    .error("Timeout communicating with We Connect servers");
                self.cached()
            }
            Err(e) => {
                self.logger.error(&format!("Vehicle refresh failed: {}", e));
                self.cached()
            }
        }
    }

    async fn try_refresh(&self) -> Result<Arc<Vec<VehicleSnapshot>>> {
        let started = std::time::Instant::now();
        let outcome = tokio::time::timeout(self.refresh_timeout, self.gateway.update()).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(Ok(())) => {
                let list = Arc::new(self.gateway.vehicles());
                // Atomic replacement: readers see either the old or the new list
                self.cache_tx.send_replace(list.clone());
                Ok(list)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(FormentorError::timeout(format!(
                "Account refresh exceeded {}s",
                self.refresh_timeout.as_secs()
            ))),
        };

        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.total_polls += 1;
        stats.last_duration_ms = Some(duration_ms);
        match &result {
            Ok(list) => {
                stats.last_success_at = Some(Utc::now());
                stats.last_error = None;
                drop(stats);
                self.logger.debug(&format!(
                    "Refreshed {} vehicle(s) in {}ms",
                    list.len(),
                    duration_ms
                ));
            }
            Err(e) => {
                stats.failed_polls += 1;
                stats.last_error = Some(e.to_string());
            }
        }
        result
    }
}
