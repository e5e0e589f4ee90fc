//! # rigsocket-core
//!
//! Shared library for the RigSocket stats client containing the JSON wire
//! messages, the codec that converts them to and from text frames, and the
//! device / credential domain types the client reports.
//!
//! It has zero dependencies on sockets, timers, or async runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! A mining rig agent keeps one long-lived WebSocket open to a remote
//! coordination service.  Over that socket it:
//!
//! - *sends* a device status report every minute (which doubles as the
//!   keep-alive), and the user's payout credentials when they change;
//! - *receives* pricing, balance, version, deprecation, and exchange-rate
//!   notifications.
//!
//! This crate defines:
//!
//! - **`protocol`** – The JSON messages on the wire.  Inbound frames are
//!   decoded into a closed [`InboundMessage`] enum keyed by the `method`
//!   field; outbound messages serialize to the exact shapes the service
//!   expects.
//!
//! - **`domain`** – Pure logic with no I/O: the composite device status code,
//!   per-device snapshots, and Base58Check credential validation.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `rigsocket_core::StatusReport` instead of the full module path.
pub use domain::credentials::{Base58CheckValidator, CredentialValidator, Credentials};
pub use domain::device::{status_code, DeviceReading, DeviceStatus, DeviceType, StatusReport};
pub use protocol::codec::{decode_inbound, encode_credentials, encode_status_report, CodecError};
pub use protocol::messages::InboundMessage;
