//! Bridge runtime
//!
//! Owns the daemon lifecycle: login plus an eager first refresh at setup,
//! the periodic refresh loop, a typed status snapshot for web consumers and
//! an orderly logout on shutdown. All shared state travels in an explicit
//! [`BridgeContext`] instead of a process-global registry.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, interval_at};

use crate::config::Config;
use crate::coordinator::UpdateCoordinator;
use crate::error::{FormentorError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::weconnect::{VehicleGateway, WeConnectClient};

/// Everything a component needs to participate in one bridge instance
#[derive(Clone)]
pub struct BridgeContext {
    pub config: Arc<Config>,
    pub gateway: Arc<dyn VehicleGateway>,
    pub coordinator: Arc<UpdateCoordinator>,
}

impl BridgeContext {
    /// Wire the production gateway from the account config
    pub fn new(config: Config) -> Result<Self> {
        let request_timeout = Duration::from_secs(config.polling.request_timeout_seconds);
        let gateway: Arc<dyn VehicleGateway> =
            Arc::new(WeConnectClient::new(&config.account, request_timeout)?);
        Ok(Self::with_gateway(config, gateway))
    }

    /// Wire an explicit gateway; tests inject stubs here
    pub fn with_gateway(config: Config, gateway: Arc<dyn VehicleGateway>) -> Self {
        let refresh_timeout = Duration::from_secs(config.polling.refresh_timeout_seconds);
        let coordinator = Arc::new(UpdateCoordinator::new(gateway.clone(), refresh_timeout));
        Self {
            config: Arc::new(config),
            gateway,
            coordinator,
        }
    }
}

/// Lifecycle state of the bridge
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeState {
    /// Logging in and fetching the first snapshot
    Initializing,
    /// Poll loop active
    Running,
    /// Setup failed; the daemon is exiting
    Error(String),
    /// Shutdown requested, logout in progress
    ShuttingDown,
}

impl BridgeState {
    fn as_label(&self) -> String {
        match self {
            Self::Initializing => "initializing".to_string(),
            Self::Running => "running".to_string(),
            Self::Error(e) => format!("error: {}", e),
            Self::ShuttingDown => "shutting_down".to_string(),
        }
    }
}

/// Point-in-time bridge status published for web consumers
#[derive(Debug, Clone, Serialize)]
pub struct BridgeSnapshot {
    pub timestamp: String,
    pub version: String,
    pub bridge_state: String,
    pub vehicle_count: usize,
    pub poll_interval_seconds: u64,
    pub total_polls: u64,
    pub failed_polls: u64,
    pub last_poll_duration_ms: Option<u64>,
    pub last_success_at: Option<String>,
    pub last_error: Option<String>,
}

/// Daemon lifecycle owner
pub struct CupraBridge {
    ctx: BridgeContext,
    logger: StructuredLogger,
    state: watch::Sender<BridgeState>,
    shutdown_tx: mpsc::UnboundedSender<()>,
    shutdown_rx: mpsc::UnboundedReceiver<()>,
    status_tx: broadcast::Sender<String>,
    snapshot_tx: watch::Sender<Arc<BridgeSnapshot>>,
    snapshot_rx: watch::Receiver<Arc<BridgeSnapshot>>,
}

impl CupraBridge {
    pub fn new(ctx: BridgeContext) -> Self {
        let logger = get_logger("bridge");
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(BridgeState::Initializing);
        let (status_tx, _) = broadcast::channel::<String>(100);

        let initial = Arc::new(BridgeSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("APP_VERSION").to_string(),
            bridge_state: BridgeState::Initializing.as_label(),
            vehicle_count: 0,
            poll_interval_seconds: ctx.config.polling.interval_seconds,
            total_polls: 0,
            failed_polls: 0,
            last_poll_duration_ms: None,
            last_success_at: None,
            last_error: None,
        });
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        Self {
            ctx,
            logger,
            state,
            shutdown_tx,
            shutdown_rx,
            status_tx,
            snapshot_tx,
            snapshot_rx,
        }
    }

    /// Login and eager first refresh. Errors here are fatal for the daemon,
    /// matching the setup-flow contract: invalid credentials, unreachable
    /// servers and an empty garage all abort startup.
    pub async fn setup(&self) -> Result<()> {
        self.logger.info("Connecting to We Connect");
        self.ctx.gateway.login().await?;

        let vehicles = self.ctx.coordinator.first_refresh().await?;
        if vehicles.is_empty() {
            return Err(FormentorError::NoVehicles);
        }
        for vehicle in vehicles.iter() {
            self.logger.info(&format!(
                "Found vehicle {} ({})",
                vehicle.vin,
                vehicle.display_name()
            ));
        }
        Ok(())
    }

    /// Run the bridge main loop until shutdown is requested
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info("Starting We Connect bridge");

        if let Err(e) = self.setup().await {
            self.state.send_replace(BridgeState::Error(e.to_string()));
            self.publish_status();
            return Err(e);
        }
        self.state.send_replace(BridgeState::Running);
        self.publish_status();

        // Setup already refreshed once, so the first tick waits a full period
        let period = Duration::from_secs(self.ctx.config.polling.interval_seconds);
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.ctx.coordinator.refresh().await;
                    self.publish_status();
                }
                _ = self.shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }

        self.state.send_replace(BridgeState::ShuttingDown);
        self.publish_status();
        if let Err(e) = self.ctx.gateway.logout().await {
            self.logger.warn(&format!("Logout failed: {}", e));
        }
        self.logger.info("Bridge shutdown complete");
        Ok(())
    }

    fn publish_status(&self) {
        let stats = self.ctx.coordinator.stats();
        let snapshot = Arc::new(BridgeSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("APP_VERSION").to_string(),
            bridge_state: self.state.borrow().as_label(),
            vehicle_count: self.ctx.coordinator.cached().len(),
            poll_interval_seconds: self.ctx.config.polling.interval_seconds,
            total_polls: stats.total_polls,
            failed_polls: stats.failed_polls,
            last_poll_duration_ms: stats.last_duration_ms,
            last_success_at: stats.last_success_at.map(|t| t.to_rfc3339()),
            last_error: stats.last_error,
        });
        if let Ok(line) = serde_json::to_string(&*snapshot) {
            let _ = self.status_tx.send(line);
        }
        let _ = self.snapshot_tx.send(snapshot);
    }

    pub fn state(&self) -> BridgeState {
        self.state.borrow().clone()
    }

    /// Watch handle observing every published status snapshot
    pub fn subscribe_snapshot(&self) -> watch::Receiver<Arc<BridgeSnapshot>> {
        self.snapshot_rx.clone()
    }

    /// Broadcast handle feeding the SSE status stream
    pub fn status_sender(&self) -> broadcast::Sender<String> {
        self.status_tx.clone()
    }

    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<()> {
        self.shutdown_tx.clone()
    }

    pub fn request_shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
