//! In-memory device collaborators.
//!
//! The rig agent owns the vendor libraries that actually read GPUs and CPUs.
//! It feeds readings into [`StaticDeviceInventory`] and marks running miners
//! in [`StaticMinerRegistry`]; the telemetry scheduler reads both on every
//! tick.  Tests use them as ready-made fakes.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use rigsocket_core::DeviceReading;

use crate::application::telemetry::{ActiveMinerRegistry, DeviceInventory, TelemetryError};

/// Device inventory whose contents are replaced wholesale by the owner.
#[derive(Debug, Default)]
pub struct StaticDeviceInventory {
    devices: RwLock<Vec<DeviceReading>>,
}

impl StaticDeviceInventory {
    pub fn new(devices: Vec<DeviceReading>) -> Self {
        Self {
            devices: RwLock::new(devices),
        }
    }

    /// Replaces the inventory.  Order is preserved in the next report.
    pub fn set_devices(&self, devices: Vec<DeviceReading>) {
        *self.devices.write().unwrap_or_else(PoisonError::into_inner) = devices;
    }
}

impl DeviceInventory for StaticDeviceInventory {
    fn list_devices(&self) -> Vec<Result<DeviceReading, TelemetryError>> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .map(Ok)
            .collect()
    }
}

/// Registry of device indexes with a miner running.
#[derive(Debug, Default)]
pub struct StaticMinerRegistry {
    active: RwLock<HashSet<u32>>,
}

impl StaticMinerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&self, index: u32, active: bool) {
        let mut set = self.active.write().unwrap_or_else(PoisonError::into_inner);
        if active {
            set.insert(index);
        } else {
            set.remove(&index);
        }
    }
}

impl ActiveMinerRegistry for StaticMinerRegistry {
    fn active_device_indexes(&self) -> HashSet<u32> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
