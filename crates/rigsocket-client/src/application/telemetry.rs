//! Device telemetry: building the status report and pushing it periodically.
//!
//! # How a report is built
//!
//! 1. Ask the [`DeviceInventory`] for every device, in inventory order.
//! 2. Ask the [`ActiveMinerRegistry`] which device indexes are mining.
//! 3. Convert each reading into a [`DeviceStatus`] row.  A device whose
//!    reading failed, or whose values cannot be represented on the wire, is
//!    left out of this report; the rest are still sent.
//!
//! # Scheduling
//!
//! [`TelemetryScheduler`] fires once per interval (60 s by default), with
//! the first tick one interval after start.  Every tick hands the report to
//! the [`OutboundChannel`].  A send issued while disconnected is also what
//! prompts the connection supervisor to reconnect, so the scheduler keeps
//! ticking no matter what happened to earlier sends.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rigsocket_core::domain::device::DeviceStatusError;
use rigsocket_core::{encode_status_report, DeviceReading, DeviceStatus, StatusReport};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::application::OutboundChannel;

/// Default period between status pushes.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(60);

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a single device was left out of a report.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The inventory could not read the device.
    #[error("device {index}: reading failed: {reason}")]
    Read { index: u32, reason: String },

    /// The reading was obtained but is not representable on the wire.
    #[error(transparent)]
    Status(#[from] DeviceStatusError),
}

// ── Collaborator traits ───────────────────────────────────────────────────────

/// Source of per-device telemetry readings.
///
/// Implementations return one entry per known device, in a stable order.
/// A device that could not be read is returned as an `Err` so the rest of
/// the inventory is still reported.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceInventory: Send + Sync {
    fn list_devices(&self) -> Vec<Result<DeviceReading, TelemetryError>>;
}

/// Knows which devices currently have a miner running on them.
#[cfg_attr(test, mockall::automock)]
pub trait ActiveMinerRegistry: Send + Sync {
    fn active_device_indexes(&self) -> HashSet<u32>;
}

// ── Report building ───────────────────────────────────────────────────────────

/// Builds a report covering every device the inventory could read.
pub fn build_status_report(
    inventory: &dyn DeviceInventory,
    registry: &dyn ActiveMinerRegistry,
) -> StatusReport {
    let active = registry.active_device_indexes();

    let devices = inventory
        .list_devices()
        .into_iter()
        .filter_map(|reading| {
            let status = reading.and_then(|r| {
                let is_active = active.contains(&r.index);
                DeviceStatus::from_reading(&r, is_active).map_err(TelemetryError::from)
            });
            match status {
                Ok(status) => Some(status),
                Err(e) => {
                    warn!(component = "socket", "omitting device from status report: {e}");
                    None
                }
            }
        })
        .collect();

    StatusReport::new(devices)
}

/// Builds a report and hands it to the outbound channel.
pub struct StatusReporter {
    inventory: Arc<dyn DeviceInventory>,
    registry: Arc<dyn ActiveMinerRegistry>,
    outbound: Arc<dyn OutboundChannel>,
}

impl StatusReporter {
    pub fn new(
        inventory: Arc<dyn DeviceInventory>,
        registry: Arc<dyn ActiveMinerRegistry>,
        outbound: Arc<dyn OutboundChannel>,
    ) -> Self {
        Self {
            inventory,
            registry,
            outbound,
        }
    }

    /// Builds the current report and sends it.  Never fails: encode errors
    /// are logged and the push is skipped.
    pub fn push_now(&self) {
        let report = build_status_report(self.inventory.as_ref(), self.registry.as_ref());
        match encode_status_report(&report) {
            Ok(payload) => {
                debug!(component = "socket", "pushing status for {} device(s)", report.len());
                self.outbound.send(payload);
            }
            Err(e) => warn!(component = "socket", "could not encode status report: {e}"),
        }
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Periodic timer that calls [`StatusReporter::push_now`].
pub struct TelemetryScheduler {
    interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TelemetryScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: Mutex::new(None),
        }
    }

    /// Starts ticking.  Returns `false` (and does nothing) if already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, reporter: Arc<StatusReporter>) -> bool {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            return false;
        }

        let period = self.interval;
        *task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                reporter.push_now();
            }
        }));
        true
    }

    /// Stops ticking.  Safe to call when not running.
    pub fn stop(&self) {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = task {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for TelemetryScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
