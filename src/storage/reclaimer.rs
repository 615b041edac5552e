//! Background TTL Reclaimer
//!
//! Each [`Database`] runs one reclaimer. On every tick it asks the database to
//! purge the expired prefix of its expiry list, which removes the TTL records
//! and the values they point at in one step.
//!
//! ## Lifecycle
//!
//! ```text
//!   Database::open ──spawn──> reclaimer_loop ──tick──> Database::purge_expired
//!         │                        ▲
//!         │                        │ watch::Sender<bool> / JoinHandle::abort
//!   Database::destroy ─────────────┘
//! ```
//!
//! The task only holds a [`Weak`] reference to its database, so it never keeps
//! a database alive and exits on its own once the database is released.

use crate::storage::Database;
use parking_lot::Mutex;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Configuration for the reclaimer.
#[derive(Debug, Clone)]
pub struct ReclaimerConfig {
    /// Interval between sweeps (default: 500ms)
    pub interval: Duration,
}

impl Default for ReclaimerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
        }
    }
}

/// A handle to a running reclaimer.
///
/// When this handle is dropped, the reclaimer task will be stopped.
#[derive(Debug)]
pub struct Reclaimer {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
    /// The spawned task, taken by `join`
    task: Mutex<Option<JoinHandle<()>>>,
    /// Name of the database being swept (for logging)
    database: String,
}

impl Reclaimer {
    /// Starts the reclaimer for `database` as a background task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(database: Weak<Database>, name: &str, config: ReclaimerConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(reclaimer_loop(
            database,
            name.to_string(),
            config.interval,
            shutdown_rx,
        ));

        debug!(database = %name, interval_ms = config.interval.as_millis(), "Reclaimer started");

        Self {
            shutdown_tx,
            task: Mutex::new(Some(task)),
            database: name.to_string(),
        }
    }

    /// Stops the reclaimer.
    ///
    /// Signals the loop and aborts the task. A sweep that is already running
    /// finishes first, since sweeps never yield.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.lock().as_ref() {
            task.abort();
        }
        debug!(database = %self.database, "Reclaimer stopped");
    }

    /// Returns true while the background task is still alive.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Stops the reclaimer and waits until its task has terminated.
    pub async fn join(self) {
        self.stop();
        let task = self.task.lock().take();
        if let Some(task) = task {
            // Cancellation is the expected outcome here.
            let _ = task.await;
        }
    }
}

impl Drop for Reclaimer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.get_mut().as_ref() {
            task.abort();
        }
    }
}

/// The main reclaimer loop.
async fn reclaimer_loop(
    database: Weak<Database>,
    name: String,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    trace!(database = %name, "Reclaimer received shutdown signal");
                    return;
                }
            }
        }

        let Some(db) = database.upgrade() else {
            trace!(database = %name, "Database released, reclaimer exiting");
            return;
        };

        let reclaimed = db.purge_expired();
        if reclaimed > 0 {
            debug!(
                database = %name,
                reclaimed = reclaimed,
                keys_remaining = db.len(),
                "Expired keys reclaimed"
            );
        }
    }
}
