//! Device telemetry snapshots and the composite status code.
//!
//! The coordination service renders one row per device.  Each row is sent as
//! a positional JSON array:
//!
//! ```text
//! [index, name, status_code, load, temperature, fan_speed]
//! ```
//!
//! # Composite status code
//!
//! The status code packs two facts into a single integer:
//!
//! ```text
//! status_code = active_flag + (device_type_ordinal + 1) * 2
//!               └─ bit 0 ─┘   └──── remaining bits ────┘
//! ```
//!
//! Because `(ordinal + 1) * 2` is always even, bit 0 is free to carry the
//! "currently mining" flag and the service can recover the device type with
//! `(code >> 1) - 1`.

use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Hardware family of a device, as numbered by the coordination service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Cpu,
    Nvidia,
    Amd,
}

impl DeviceType {
    /// Returns the ordinal the service uses for this device family.
    pub fn ordinal(self) -> u16 {
        match self {
            DeviceType::Cpu => 0,
            DeviceType::Nvidia => 1,
            DeviceType::Amd => 2,
        }
    }
}

/// Computes the composite status code for a device.
///
/// # Examples
///
/// ```rust
/// use rigsocket_core::status_code;
///
/// // An active NVIDIA device (ordinal 1): 1 + (1 + 1) * 2 = 5
/// assert_eq!(status_code(true, 1), 5);
/// // The same device while idle.
/// assert_eq!(status_code(false, 1), 4);
/// ```
pub fn status_code(active: bool, type_ordinal: u16) -> u32 {
    u32::from(active) + (u32::from(type_ordinal) + 1) * 2
}

/// A raw telemetry reading as reported by the device inventory.
///
/// Load and temperature are floating point because that is how the vendor
/// libraries expose them; they are rounded when the wire row is built.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReading {
    /// Stable device index used as the row identifier.
    pub index: u32,
    /// Display name, e.g. `"GeForce GTX 1080 Ti"`.
    pub name: String,
    pub device_type: DeviceType,
    /// Utilisation in percent.
    pub load: f64,
    /// Core temperature in degrees Celsius.
    pub temperature: f64,
    /// Fan speed as reported by the device source (`-1` when unavailable).
    pub fan_speed: i32,
}

/// Reasons a single device row cannot be built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceStatusError {
    /// A float reading was NaN or infinite.
    #[error("device {index}: {field} reading is not a finite number")]
    NonFinite { index: u32, field: &'static str },

    /// A float reading does not fit in the wire integer after rounding.
    #[error("device {index}: {field} reading {value} is out of range")]
    OutOfRange {
        index: u32,
        field: &'static str,
        value: f64,
    },
}

/// One row of a [`StatusReport`].
///
/// The status code is never stored independently of its inputs: the only
/// constructor, [`DeviceStatus::from_reading`], derives it from the
/// activity flag and the device type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    index: u32,
    name: String,
    status_code: u32,
    load: i32,
    temperature: i32,
    fan_speed: i32,
}

impl DeviceStatus {
    /// Builds a wire row from a raw reading.
    ///
    /// Load and temperature are rounded to the nearest integer, with ties
    /// going to the even neighbour.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceStatusError`] when a float reading is not finite or
    /// does not fit in an `i32`.
    pub fn from_reading(reading: &DeviceReading, active: bool) -> Result<Self, DeviceStatusError> {
        Ok(Self {
            index: reading.index,
            name: reading.name.clone(),
            status_code: status_code(active, reading.device_type.ordinal()),
            load: round_reading(reading.index, "load", reading.load)?,
            temperature: round_reading(reading.index, "temperature", reading.temperature)?,
            fan_speed: reading.fan_speed,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status_code(&self) -> u32 {
        self.status_code
    }

    /// Returns `true` when bit 0 of the status code is set.
    pub fn is_active(&self) -> bool {
        self.status_code & 1 == 1
    }

    pub fn load(&self) -> i32 {
        self.load
    }

    pub fn temperature(&self) -> i32 {
        self.temperature
    }

    pub fn fan_speed(&self) -> i32 {
        self.fan_speed
    }
}

fn round_reading(index: u32, field: &'static str, value: f64) -> Result<i32, DeviceStatusError> {
    if !value.is_finite() {
        return Err(DeviceStatusError::NonFinite { index, field });
    }
    let rounded = value.round_ties_even();
    if rounded < f64::from(i32::MIN) || rounded > f64::from(i32::MAX) {
        return Err(DeviceStatusError::OutOfRange {
            index,
            field,
            value,
        });
    }
    Ok(rounded as i32)
}

impl Serialize for DeviceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_tuple(6)?;
        row.serialize_element(&self.index)?;
        row.serialize_element(&self.name)?;
        row.serialize_element(&self.status_code)?;
        row.serialize_element(&self.load)?;
        row.serialize_element(&self.temperature)?;
        row.serialize_element(&self.fan_speed)?;
        row.end()
    }
}

/// A snapshot of every reportable device, in inventory order.
///
/// Built fresh on every telemetry tick and discarded after it is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub devices: Vec<DeviceStatus>,
}

impl StatusReport {
    pub fn new(devices: Vec<DeviceStatus>) -> Self {
        Self { devices }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
