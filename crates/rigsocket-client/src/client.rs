//! `StatsClient`: the single context object a rig agent owns.
//!
//! It wires the application layer (dispatcher, telemetry, events, state) to
//! the infrastructure layer (connection supervisor over some [`Transport`]).
//! Construct one per process and share it by reference; there are no global
//! statics, so tests can build as many as they like with fake transports.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rigsocket_client::infrastructure::devices::{StaticDeviceInventory, StaticMinerRegistry};
//! use rigsocket_client::infrastructure::network::WsTransport;
//! use rigsocket_client::{ClientOptions, StatsClient};
//!
//! # async fn run() {
//! let client = StatsClient::new(
//!     Arc::new(WsTransport::new()),
//!     Arc::new(StaticDeviceInventory::default()),
//!     Arc::new(StaticMinerRegistry::new()),
//!     ClientOptions::default(),
//! );
//! client.events().on_balance_update(|b| println!("balance: {b}"));
//! client.start("wss://nhmws.nicehash.com/v2/nhm");
//! client.set_credentials("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", "rig01");
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use rigsocket_core::{encode_credentials, Base58CheckValidator, CredentialValidator, Credentials};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::application::dispatch::InboundDispatcher;
use crate::application::events::EventHub;
use crate::application::state::RemoteState;
use crate::application::telemetry::{
    ActiveMinerRegistry, DeviceInventory, StatusReporter, TelemetryScheduler,
    DEFAULT_STATUS_INTERVAL,
};
use crate::application::OutboundChannel;
use crate::infrastructure::network::{
    ConnectionSupervisor, SessionHandler, SessionState, SupervisorConfig, Transport,
    DEFAULT_CONNECT_TIMEOUT,
};

/// Tuning knobs for [`StatsClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Period of the status push.
    pub status_interval: Duration,
    /// Automatic reconnect delay; `None` reconnects only on the next send.
    pub reconnect_delay: Option<Duration>,
    /// Upper bound on one connect attempt.
    pub connect_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            status_interval: DEFAULT_STATUS_INTERVAL,
            reconnect_delay: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Self-healing stats connection plus everything that hangs off it.
pub struct StatsClient {
    supervisor: Arc<ConnectionSupervisor>,
    scheduler: TelemetryScheduler,
    reporter: Arc<StatusReporter>,
    dispatcher: Arc<InboundDispatcher>,
    events: Arc<EventHub>,
    state: Arc<RemoteState>,
    validator: Arc<dyn CredentialValidator>,
}

impl StatsClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        inventory: Arc<dyn DeviceInventory>,
        registry: Arc<dyn ActiveMinerRegistry>,
        options: ClientOptions,
    ) -> Self {
        let supervisor = Arc::new(ConnectionSupervisor::new(
            transport,
            SupervisorConfig {
                reconnect_delay: options.reconnect_delay,
                connect_timeout: options.connect_timeout,
            },
        ));
        let reporter = Arc::new(StatusReporter::new(
            inventory,
            registry,
            Arc::clone(&supervisor) as Arc<dyn OutboundChannel>,
        ));
        let events = Arc::new(EventHub::default());
        let state = Arc::new(RemoteState::new());
        let dispatcher = Arc::new(InboundDispatcher::new(
            Arc::clone(&state),
            Arc::clone(&events),
        ));

        Self {
            supervisor,
            scheduler: TelemetryScheduler::new(options.status_interval),
            reporter,
            dispatcher,
            events,
            state,
            validator: Arc::new(Base58CheckValidator),
        }
    }

    /// Replaces the default Base58Check credential validator.
    pub fn with_validator(mut self, validator: Arc<dyn CredentialValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Starts the session and the status timer.
    ///
    /// Returns `false` if already started; nothing is re-wired in that case.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, address: &str) -> bool {
        let handler = Arc::new(ClientSessionHandler {
            reporter: Arc::clone(&self.reporter),
            dispatcher: Arc::clone(&self.dispatcher),
            events: Arc::clone(&self.events),
        });
        if !self.supervisor.start(address, handler) {
            return false;
        }
        self.scheduler.start(Arc::clone(&self.reporter));
        info!(component = "socket", "stats client started against {address}");
        true
    }

    /// Stops the timer and releases the session.  In-flight writes finish on
    /// their own.
    pub fn stop(&self) {
        self.scheduler.stop();
        self.supervisor.stop();
    }

    /// Like [`stop`](Self::stop), then waits for the connection to close.
    pub async fn shutdown(&self) {
        self.scheduler.stop();
        self.supervisor.shutdown().await;
    }

    /// Sends the payout address and worker name if both are well formed.
    ///
    /// An invalid pair is dropped without sending anything.
    pub fn set_credentials(&self, address: &str, worker: &str) {
        let credentials = Credentials::new(address, worker);
        if let Err(e) = self.validator.validate(&credentials) {
            debug!(component = "socket", "not sending credentials: {e}");
            return;
        }
        match encode_credentials(&credentials) {
            Ok(payload) => self.supervisor.send(payload),
            Err(e) => warn!(component = "socket", "could not encode credentials: {e}"),
        }
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    pub fn state(&self) -> &RemoteState {
        &self.state
    }

    pub fn session_state(&self) -> SessionState {
        self.supervisor.state()
    }

    pub fn subscribe_session_state(&self) -> watch::Receiver<SessionState> {
        self.supervisor.subscribe_state()
    }
}

impl Drop for StatsClient {
    fn drop(&mut self) {
        // The session task holds the supervisor through the handler.
        self.stop();
    }
}

/// Bridges supervisor callbacks into the application layer.
struct ClientSessionHandler {
    reporter: Arc<StatusReporter>,
    dispatcher: Arc<InboundDispatcher>,
    events: Arc<EventHub>,
}

impl SessionHandler for ClientSessionHandler {
    fn on_established(&self) {
        // Populate rig stats immediately instead of waiting for the first tick.
        self.reporter.push_now();
        self.events.connection_established.emit(&());
    }

    fn on_frame(&self, raw: &str, is_text: bool) {
        self.dispatcher.handle_frame(raw, is_text);
    }

    fn on_lost(&self) {
        info!(component = "socket", "connection lost; next status push will reconnect");
        self.events.connection_lost.emit(&());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
