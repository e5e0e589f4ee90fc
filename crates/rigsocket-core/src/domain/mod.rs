//! Domain layer: device status snapshots and payout credentials.
//!
//! Nothing in here performs I/O.  The client application gathers raw device
//! readings from its collaborators and hands them to these types to produce
//! the values that go on the wire.

pub mod credentials;
pub mod device;

pub use credentials::{Base58CheckValidator, CredentialError, CredentialValidator, Credentials};
pub use device::{status_code, DeviceReading, DeviceStatus, DeviceType, StatusReport};
