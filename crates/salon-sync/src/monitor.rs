//! # Active Walk-Ins Monitor
//!
//! Keeps a periodically refreshed list of in-progress visits for the
//! reception dashboard.
//!
//! ## Refresh Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Active Walk-Ins Refresh                             │
//! │                                                                         │
//! │  load()  ──► refresh(silent = false)                                   │
//! │               ok  → replace snapshot                                   │
//! │               err → error! + notifier + return Err                     │
//! │                                                                         │
//! │  spawn() ──► every poll interval (default 15s):                        │
//! │              refresh(silent = true)                                    │
//! │               ok  → replace snapshot                                   │
//! │               err → warn! only, keep previous snapshot                 │
//! │                                                                         │
//! │  handle.shutdown() ──► loop exits after the current refresh            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use salon_core::Money;

use crate::api::SalonApi;
use crate::config::ClientConfig;
use crate::error::{SyncError, SyncResult};
use crate::notify::{Notifier, TracingNotifier};
use crate::protocol::{ActiveSession, ServiceOrderStatus};

/// Shortest accepted poll interval.
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

// =============================================================================
// Snapshot
// =============================================================================

/// The most recent successful view of active walk-ins.
#[derive(Debug, Clone, Default)]
pub struct WalkInsSnapshot {
    pub sessions: Vec<ActiveSession>,
    /// When `sessions` was last replaced.
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Error of the latest failed refresh, cleared on success.
    pub last_error: Option<String>,
}

impl WalkInsSnapshot {
    /// Number of open services across all visits.
    pub fn open_services(&self) -> usize {
        self.sessions
            .iter()
            .flat_map(|s| &s.services)
            .filter(|o| o.status != ServiceOrderStatus::Cancelled)
            .count()
    }

    /// Value of all open services.
    pub fn running_total(&self) -> Money {
        self.sessions.iter().map(ActiveSession::running_total).sum()
    }
}

// =============================================================================
// Monitor
// =============================================================================

/// Polls `GET /walk-ins/active`.
#[derive(Clone)]
pub struct ActiveWalkInsMonitor {
    api: Arc<dyn SalonApi>,
    notifier: Arc<dyn Notifier>,
    snapshot: Arc<RwLock<WalkInsSnapshot>>,
    interval: Duration,
}

impl ActiveWalkInsMonitor {
    /// Intervals below one second are raised to one second.
    pub fn new(api: Arc<dyn SalonApi>, interval: Duration) -> Self {
        if interval < MIN_POLL_INTERVAL {
            warn!(?interval, "Walk-ins poll interval too short, using 1s");
        }
        let interval = interval.max(MIN_POLL_INTERVAL);
        ActiveWalkInsMonitor {
            api,
            notifier: Arc::new(TracingNotifier),
            snapshot: Arc::new(RwLock::new(WalkInsSnapshot::default())),
            interval,
        }
    }

    pub fn from_config(api: Arc<dyn SalonApi>, config: &ClientConfig) -> Self {
        Self::new(api, config.polling.active_walk_ins_interval())
    }

    /// Sets where surfaced errors go.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current snapshot.
    pub async fn snapshot(&self) -> WalkInsSnapshot {
        self.snapshot.read().await.clone()
    }

    /// User-triggered initial fetch. Errors are surfaced.
    pub async fn load(&self) -> SyncResult<usize> {
        self.refresh(false).await
    }

    /// Fetches active walk-ins and replaces the snapshot.
    ///
    /// With `silent` a failure is only logged; the previous sessions stay
    /// visible and the notifier is not called.
    pub async fn refresh(&self, silent: bool) -> SyncResult<usize> {
        match self.api.active_walk_ins().await {
            Ok(sessions) => {
                let count = sessions.len();
                let mut snapshot = self.snapshot.write().await;
                snapshot.sessions = sessions;
                snapshot.refreshed_at = Some(Utc::now());
                snapshot.last_error = None;
                debug!(count, "Active walk-ins refreshed");
                Ok(count)
            }
            Err(e) => {
                self.snapshot.write().await.last_error = Some(e.to_string());
                if silent {
                    warn!(error = %e, "Background walk-ins refresh failed");
                } else {
                    error!(error = %e, "Failed to load active walk-ins");
                    self.notifier.error(&e.user_message());
                }
                Err(e)
            }
        }
    }

    /// Starts background polling and returns a handle to stop it.
    ///
    /// The first poll happens one interval from now; call [`Self::load`]
    /// beforehand for the initial fetch.
    pub fn spawn(&self) -> ActiveWalkInsHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(self.clone().run(shutdown_rx));

        ActiveWalkInsHandle {
            shutdown_tx,
            snapshot: self.snapshot.clone(),
            task,
        }
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(interval_secs = self.interval.as_secs(), "Walk-ins monitor starting");

        let start = tokio::time::Instant::now() + self.interval;
        let mut interval = tokio::time::interval_at(start, self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    // Failures are already logged inside refresh.
                    let _ = self.refresh(true).await;
                }

                _ = shutdown_rx.recv() => {
                    info!("Walk-ins monitor shutting down");
                    break;
                }
            }
        }

        info!("Walk-ins monitor stopped");
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Handle for a running monitor.
pub struct ActiveWalkInsHandle {
    shutdown_tx: mpsc::Sender<()>,
    snapshot: Arc<RwLock<WalkInsSnapshot>>,
    task: JoinHandle<()>,
}

impl ActiveWalkInsHandle {
    pub async fn snapshot(&self) -> WalkInsSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Stops polling and waits for the loop to exit.
    pub async fn shutdown(self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::ChannelError("Monitor shutdown channel closed".into()))?;
        self.task.await.map_err(|_| SyncError::ShuttingDown)
    }
}
