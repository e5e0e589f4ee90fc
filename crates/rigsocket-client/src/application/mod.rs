//! Application layer use cases for the stats client.
//!
//! # What use cases does the client have?
//!
//! - **`dispatch`** – Decodes each inbound text frame and routes it by its
//!   `method` tag to the remote state and the event hub.
//!
//! - **`telemetry`** – Builds the device status report from the device
//!   inventory and the active-miner registry, and runs the 60-second
//!   scheduler that pushes it.
//!
//! - **`events`** – Observer registry: consumers subscribe to balance,
//!   version, burn, pricing, exchange-rate, and lifecycle notifications.
//!
//! - **`state`** – The latest values received from the service.
//!
//! **Dependency rule**: this layer never imports `infrastructure`.  Outbound
//! frames leave through the [`OutboundChannel`] trait, which the connection
//! supervisor implements.

pub mod dispatch;
pub mod events;
pub mod state;
pub mod telemetry;

/// Fire-and-forget sink for serialized outbound frames.
///
/// Implementations must never block the caller and must silently drop the
/// payload when no session exists.
#[cfg_attr(test, mockall::automock)]
pub trait OutboundChannel: Send + Sync {
    fn send(&self, payload: String);
}
