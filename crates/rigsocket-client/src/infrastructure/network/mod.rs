//! Network layer: the transport seam and the connection supervisor.
//!
//! # Why a `Transport` trait?
//!
//! The supervisor only needs three things from the wire: open a connection,
//! write a text frame, and read the next frame.  Keeping those behind
//! [`Transport`], [`FrameSink`], and [`FrameStream`] lets the production
//! client use a real WebSocket ([`ws::WsTransport`]) while tests drive the
//! supervisor with in-memory channels and a paused clock.

pub mod supervisor;
pub mod ws;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use supervisor::{ConnectionSupervisor, SupervisorConfig, DEFAULT_CONNECT_TIMEOUT};
pub use ws::WsTransport;

/// Lifecycle of the single session owned by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// One frame read from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// Errors raised by a transport.  The supervisor never returns these to
/// callers; they end the current session and are logged.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("connecting to {address} timed out after {after:?}")]
    ConnectTimeout { address: String, after: Duration },

    #[error("send failed: {0}")]
    Send(String),

    #[error("receive failed: {0}")]
    Receive(String),
}

/// Write half of an open connection.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Best-effort graceful close.
    async fn close(&mut self);
}

/// Read half of an open connection.
#[async_trait]
pub trait FrameStream: Send {
    /// Returns `None` once the peer has closed the connection.
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>>;
}

/// Opens connections to the coordination service.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(
        &self,
        address: &str,
    ) -> Result<(Box<dyn FrameSink>, Box<dyn FrameStream>), TransportError>;
}

/// Receives lifecycle notifications from the supervisor.
///
/// All three methods run on the session task, one at a time, in the order
/// the underlying events happened.
pub trait SessionHandler: Send + Sync {
    /// A connection was opened.
    fn on_established(&self);

    /// A frame arrived.  `raw` is lossily decoded when `is_text` is false.
    fn on_frame(&self, raw: &str, is_text: bool);

    /// A connection attempt failed or an open connection was dropped.
    fn on_lost(&self);
}
