//! Infrastructure layer: everything that touches the outside world.
//!
//! - **`network`** – The connection supervisor, the `Transport` seam, and
//!   the tokio-tungstenite WebSocket transport.
//! - **`devices`** – In-memory device inventory and miner registry.
//! - **`storage`** – TOML configuration file.

pub mod devices;
pub mod network;
pub mod storage;
