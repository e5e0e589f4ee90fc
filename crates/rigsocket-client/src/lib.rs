//! rigsocket-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the stats client do? (for beginners)
//!
//! A mining rig agent runs for days at a time.  The stats client keeps a
//! single WebSocket open to the remote coordination service for that whole
//! time and:
//!
//! 1. Connects on startup and, as soon as the session is established, pushes
//!    a status report so the rig shows up on the dashboard immediately.
//! 2. Pushes a fresh status report every 60 seconds.  This is also the only
//!    keep-alive: a push issued while disconnected triggers a reconnect.
//! 3. Receives pay rates, balance, version, deprecation, and exchange-rate
//!    notifications, stores the latest values, and notifies subscribers.
//! 4. Sends the payout address and worker name whenever they change, after
//!    validating them locally.
//!
//! # Layers
//!
//! - **`application`** – Dispatching, telemetry, events, shared state.  No
//!   sockets.
//! - **`infrastructure`** – The connection supervisor and its WebSocket
//!   transport, in-memory device collaborators, and the TOML config file.
//! - **`client`** – [`StatsClient`], the single context object that wires
//!   the two together.

/// Application layer: dispatch, telemetry, events, and remote state.
pub mod application;

/// Composition root tying the application and infrastructure layers together.
pub mod client;

/// Infrastructure layer: network, device collaborators, and storage.
pub mod infrastructure;

pub use client::{ClientOptions, StatsClient};
