//! ConnectionSupervisor: owns the one session and its reconnect behaviour.
//!
//! # Session task
//!
//! `start` spawns a single task that owns the transport halves.  Callers
//! never touch the socket; they push serialized frames into an unbounded
//! queue through [`OutboundChannel::send`], which never blocks.
//!
//! ```text
//!                ┌───────────── connect ok ─────────────┐
//!                │                                      ▼
//!  Disconnected ─┴─► Connecting ──── connect err ──► Disconnected
//!        ▲                                              │
//!        │        Connected ── drop / read err ─────────┤
//!        │                                              │
//!        └─── outbound send (probe) or retry delay ◄────┘
//! ```
//!
//! While disconnected the task sleeps until either a payload is queued (the
//! telemetry tick is the usual source) or the optional retry delay elapses,
//! then makes exactly one connect attempt.  On success the payload that woke
//! it is written right after the established notification has been handled.
//! On failure that payload is dropped.  An attempt that outlives
//! `connect_timeout` counts as a failure.
//!
//! # State publication
//!
//! Every session spawned by one supervisor publishes into the same watch
//! channel, tagged with a generation number.  `stop` retires the current
//! generation, so a stopped task that is still winding down cannot
//! overwrite the state of its successor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::OutboundChannel;

use super::{Frame, FrameSink, FrameStream, SessionHandler, SessionState, Transport};

/// Upper bound on one connect attempt, handshake included.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Supervisor tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// When set, a disconnected session also retries on this timer.  When
    /// `None`, it waits for the next outbound send.
    pub reconnect_delay: Option<Duration>,
    pub connect_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Session state shared across sessions, with stale writers fenced off.
#[derive(Clone)]
struct StateCell {
    tx: Arc<watch::Sender<SessionState>>,
    generation: Arc<AtomicU64>,
}

impl StateCell {
    fn new() -> Self {
        let (tx, _) = watch::channel(SessionState::Disconnected);
        Self {
            tx: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Publishes `state` unless `generation` has been retired.
    fn publish(&self, generation: u64, state: SessionState) {
        self.tx.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            let changed = *current != state;
            *current = state;
            changed
        });
    }

    /// Fences off the current generation and reports `Disconnected`.
    fn retire(&self) {
        self.tx.send_if_modified(|current| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            let changed = *current != SessionState::Disconnected;
            *current = SessionState::Disconnected;
            changed
        });
    }
}

struct ActiveSession {
    address: String,
    outbound_tx: mpsc::UnboundedSender<String>,
    // Dropping this sender wakes the task and ends it.
    _shutdown_tx: watch::Sender<()>,
    task: JoinHandle<()>,
}

/// Owns the session and exposes a non-blocking send.
pub struct ConnectionSupervisor {
    transport: Arc<dyn Transport>,
    config: SupervisorConfig,
    state: StateCell,
    session: Mutex<Option<ActiveSession>>,
}

impl ConnectionSupervisor {
    pub fn new(transport: Arc<dyn Transport>, config: SupervisorConfig) -> Self {
        Self {
            transport,
            config,
            state: StateCell::new(),
            session: Mutex::new(None),
        }
    }

    /// Creates the session and begins connecting to `address`.
    ///
    /// Returns `false` when a session already exists; the existing session
    /// keeps its original address and handler.  Must be called from within a
    /// Tokio runtime.
    pub fn start(&self, address: &str, handler: Arc<dyn SessionHandler>) -> bool {
        let mut session = self.lock_session();
        if let Some(existing) = session.as_ref() {
            if existing.address != address {
                warn!(
                    component = "socket",
                    "already started against {}; ignoring start({address})", existing.address
                );
            }
            return false;
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let task = tokio::spawn(run_session(SessionTask {
            transport: Arc::clone(&self.transport),
            address: address.to_string(),
            handler,
            reconnect_delay: self.config.reconnect_delay,
            connect_timeout: self.config.connect_timeout,
            state: self.state.clone(),
            generation: self.state.generation(),
            outbound_rx,
            shutdown_rx,
        }));

        *session = Some(ActiveSession {
            address: address.to_string(),
            outbound_tx,
            _shutdown_tx: shutdown_tx,
            task,
        });
        true
    }

    /// Ends the session.  Frames already queued may be lost.
    pub fn stop(&self) {
        let mut session = self.lock_session();
        if session.is_some() {
            self.state.retire();
        }
        // Dropping the session's senders signals the task.
        drop(session.take());
    }

    /// Ends the session and waits for the task to close the connection.
    pub async fn shutdown(&self) {
        let session = {
            let mut session = self.lock_session();
            if session.is_some() {
                self.state.retire();
            }
            session.take()
        };
        if let Some(ActiveSession {
            outbound_tx,
            _shutdown_tx,
            task,
            ..
        }) = session
        {
            drop(outbound_tx);
            drop(_shutdown_tx);
            if let Err(e) = task.await {
                warn!(component = "socket", "session task ended abnormally: {e}");
            }
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.tx.borrow()
    }

    /// Watch channel that yields every state transition.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.tx.subscribe()
    }

    /// Address of the current session, if started.
    pub fn address(&self) -> Option<String> {
        self.lock_session().as_ref().map(|s| s.address.clone())
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutboundChannel for ConnectionSupervisor {
    fn send(&self, payload: String) {
        match self.lock_session().as_ref() {
            Some(session) => {
                if session.outbound_tx.send(payload).is_err() {
                    debug!(component = "socket", "session task gone; dropping outbound frame");
                }
            }
            None => debug!(component = "socket", "no session; dropping outbound frame"),
        }
    }
}

// ── Session task ──────────────────────────────────────────────────────────────

struct SessionTask {
    transport: Arc<dyn Transport>,
    address: String,
    handler: Arc<dyn SessionHandler>,
    reconnect_delay: Option<Duration>,
    connect_timeout: Duration,
    state: StateCell,
    generation: u64,
    outbound_rx: mpsc::UnboundedReceiver<String>,
    shutdown_rx: watch::Receiver<()>,
}

enum SessionEnd {
    Lost,
    Shutdown,
}

enum Wake {
    Probe(String),
    Retry,
    Shutdown,
}

impl SessionTask {
    fn publish(&self, state: SessionState) {
        self.state.publish(self.generation, state);
    }
}

/// One connect attempt, bounded by `limit`.
async fn connect_within(
    transport: &dyn Transport,
    address: &str,
    limit: Duration,
) -> Result<(Box<dyn FrameSink>, Box<dyn FrameStream>), super::TransportError> {
    match tokio::time::timeout(limit, transport.connect(address)).await {
        Ok(result) => result,
        Err(_) => Err(super::TransportError::ConnectTimeout {
            address: address.to_string(),
            after: limit,
        }),
    }
}

async fn run_session(mut task: SessionTask) {
    let mut pending: Option<String> = None;

    loop {
        task.publish(SessionState::Connecting);
        let attempt = connect_within(&*task.transport, &task.address, task.connect_timeout);
        let connected = tokio::select! {
            biased;
            _ = task.shutdown_rx.changed() => break,
            result = attempt => result,
        };

        match connected {
            Ok((mut sink, mut stream)) => {
                let session_id = Uuid::new_v4();
                info!(component = "socket", %session_id, "connected to {}", task.address);
                task.publish(SessionState::Connected);
                task.handler.on_established();

                let end = drive(&mut task, &mut *sink, &mut *stream, pending.take()).await;
                task.publish(SessionState::Disconnected);
                match end {
                    SessionEnd::Shutdown => {
                        sink.close().await;
                        info!(component = "socket", %session_id, "session closed");
                        return;
                    }
                    SessionEnd::Lost => {
                        info!(component = "socket", %session_id, "connection lost");
                        task.handler.on_lost();
                    }
                }
            }
            Err(e) => {
                warn!(component = "socket", "{e}");
                task.publish(SessionState::Disconnected);
                let mut dropped = usize::from(pending.take().is_some());
                while task.outbound_rx.try_recv().is_ok() {
                    dropped += 1;
                }
                if dropped > 0 {
                    debug!(
                        component = "socket",
                        "dropped {dropped} outbound frame(s) after failed connect"
                    );
                }
                task.handler.on_lost();
            }
        }

        match wait_for_wake(&mut task).await {
            Wake::Probe(payload) => pending = Some(payload),
            Wake::Retry => {}
            Wake::Shutdown => break,
        }
    }

    task.publish(SessionState::Disconnected);
}

/// Pumps frames both ways until the connection ends or shutdown is requested.
async fn drive(
    task: &mut SessionTask,
    sink: &mut dyn FrameSink,
    stream: &mut dyn FrameStream,
    pending: Option<String>,
) -> SessionEnd {
    // Frames queued by the established handler go first, then the probe.
    let mut backlog = Vec::new();
    while let Ok(payload) = task.outbound_rx.try_recv() {
        backlog.push(payload);
    }
    backlog.extend(pending);
    for payload in backlog {
        if let Err(e) = write(sink, payload).await {
            warn!(component = "socket", "{e}");
            return SessionEnd::Lost;
        }
    }

    loop {
        tokio::select! {
            _ = task.shutdown_rx.changed() => return SessionEnd::Shutdown,
            frame = stream.next_frame() => match frame {
                Some(Ok(Frame::Text(text))) => task.handler.on_frame(&text, true),
                Some(Ok(Frame::Binary(bytes))) => {
                    task.handler.on_frame(&String::from_utf8_lossy(&bytes), false)
                }
                Some(Err(e)) => {
                    warn!(component = "socket", "{e}");
                    return SessionEnd::Lost;
                }
                None => return SessionEnd::Lost,
            },
            payload = task.outbound_rx.recv() => match payload {
                Some(payload) => {
                    if let Err(e) = write(sink, payload).await {
                        warn!(component = "socket", "{e}");
                        return SessionEnd::Lost;
                    }
                }
                None => return SessionEnd::Shutdown,
            },
        }
    }
}

async fn write(sink: &mut dyn FrameSink, payload: String) -> Result<(), super::TransportError> {
    debug!(component = "socket", "sending: {payload}");
    sink.send_text(payload).await
}

async fn wait_for_wake(task: &mut SessionTask) -> Wake {
    let delay = task.reconnect_delay;
    let retry = async move {
        match delay {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = task.shutdown_rx.changed() => Wake::Shutdown,
        payload = task.outbound_rx.recv() => match payload {
            Some(payload) => Wake::Probe(payload),
            None => Wake::Shutdown,
        },
        _ = retry => Wake::Retry,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::network::TransportError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    /// Server side of one fake connection.
    struct Peer {
        to_client: mpsc::UnboundedSender<Frame>,
        from_client: mpsc::UnboundedReceiver<String>,
    }

    struct ChannelSink(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl FrameSink for ChannelSink {
        async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
            self.0
                .send(text)
                .map_err(|_| TransportError::Send("peer gone".into()))
        }

        async fn close(&mut self) {}
    }

    struct ChannelStream(mpsc::UnboundedReceiver<Frame>);

    #[async_trait]
    impl FrameStream for ChannelStream {
        async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
            self.0.recv().await.map(Ok)
        }
    }

    struct FakeTransport {
        refuse: AtomicBool,
        attempts: AtomicUsize,
        peers: mpsc::UnboundedSender<Peer>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn connect(
            &self,
            address: &str,
        ) -> Result<(Box<dyn FrameSink>, Box<dyn FrameStream>), TransportError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.refuse.load(Ordering::SeqCst) {
                return Err(TransportError::Connect {
                    address: address.to_string(),
                    reason: "refused".into(),
                });
            }
            let (to_client, client_rx) = mpsc::unbounded_channel();
            let (client_tx, from_client) = mpsc::unbounded_channel();
            let _ = self.peers.send(Peer {
                to_client,
                from_client,
            });
            Ok((Box::new(ChannelSink(client_tx)), Box::new(ChannelStream(client_rx))))
        }
    }

    #[derive(Default)]
    struct RecordingHandler {
        log: Mutex<Vec<String>>,
    }

    impl SessionHandler for RecordingHandler {
        fn on_established(&self) {
            self.log.lock().unwrap().push("established".into());
        }

        fn on_frame(&self, raw: &str, is_text: bool) {
            self.log.lock().unwrap().push(format!("frame:{raw}:{is_text}"));
        }

        fn on_lost(&self) {
            self.log.lock().unwrap().push("lost".into());
        }
    }

    fn make_supervisor(
        refuse: bool,
    ) -> (
        Arc<ConnectionSupervisor>,
        Arc<FakeTransport>,
        mpsc::UnboundedReceiver<Peer>,
    ) {
        let (peers, accepted) = mpsc::unbounded_channel();
        let transport = Arc::new(FakeTransport {
            refuse: AtomicBool::new(refuse),
            attempts: AtomicUsize::new(0),
            peers,
        });
        let supervisor = Arc::new(ConnectionSupervisor::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            SupervisorConfig::default(),
        ));
        (supervisor, transport, accepted)
    }

    async fn wait_until(cond: impl Fn() -> bool) {
        timeout(WAIT, async {
            while !cond() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    fn count(handler: &RecordingHandler, entry: &str) -> usize {
        handler.log.lock().unwrap().iter().filter(|e| *e == entry).count()
    }

    async fn wait_for_state(supervisor: &ConnectionSupervisor, wanted: SessionState) {
        let mut rx = supervisor.subscribe_state();
        timeout(WAIT, rx.wait_for(|s| *s == wanted))
            .await
            .expect("state transition timed out")
            .expect("state channel closed");
    }

    #[test]
    fn test_new_supervisor_is_disconnected() {
        let (supervisor, _, _) = make_supervisor(false);
        assert_eq!(supervisor.state(), SessionState::Disconnected);
        assert_eq!(supervisor.address(), None);
    }

    #[test]
    fn test_send_without_session_is_silently_dropped() {
        let (supervisor, transport, _) = make_supervisor(false);

        supervisor.send("{}".into());

        assert_eq!(transport.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_connects_and_delivers_frames() {
        // Arrange
        let (supervisor, _, mut accepted) = make_supervisor(false);
        let handler = Arc::new(RecordingHandler::default());

        // Act
        assert!(supervisor.start("wss://example.test/v2", handler.clone()));
        let mut peer = timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        wait_for_state(&supervisor, SessionState::Connected).await;
        peer.to_client.send(Frame::Text("hello".into())).unwrap();
        supervisor.send("outbound".into());
        let received = timeout(WAIT, peer.from_client.recv()).await.unwrap();
        wait_until(|| count(&handler, "frame:hello:true") == 1).await;

        // Assert
        assert_eq!(received.as_deref(), Some("outbound"));
        assert_eq!(handler.log.lock().unwrap()[0], "established");
    }

    #[tokio::test]
    async fn test_second_start_is_a_no_op() {
        let (supervisor, transport, mut accepted) = make_supervisor(false);
        let handler = Arc::new(RecordingHandler::default());

        assert!(supervisor.start("wss://a.test", handler.clone()));
        assert!(!supervisor.start("wss://b.test", handler.clone()));
        let _peer = timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        wait_for_state(&supervisor, SessionState::Connected).await;

        assert_eq!(transport.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(supervisor.address().as_deref(), Some("wss://a.test"));
    }

    #[tokio::test]
    async fn test_peer_drop_fires_lost_and_probe_reconnects() {
        // Arrange
        let (supervisor, transport, mut accepted) = make_supervisor(false);
        let handler = Arc::new(RecordingHandler::default());
        supervisor.start("wss://example.test", handler.clone());
        let peer = timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        wait_for_state(&supervisor, SessionState::Connected).await;

        // Act: server goes away, then the next send probes
        drop(peer);
        wait_for_state(&supervisor, SessionState::Disconnected).await;
        supervisor.send("probe".into());
        let mut second = timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        let delivered = timeout(WAIT, second.from_client.recv()).await.unwrap();

        // Assert: the probe payload is written on the new connection
        assert_eq!(delivered.as_deref(), Some("probe"));
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);
        let log = handler.log.lock().unwrap().clone();
        assert_eq!(log, vec!["established", "lost", "established"]);
    }

    #[tokio::test]
    async fn test_failed_connect_drops_probe_payload() {
        // Arrange
        let (supervisor, transport, mut accepted) = make_supervisor(true);
        let handler = Arc::new(RecordingHandler::default());
        supervisor.start("wss://example.test", handler.clone());
        wait_until(|| count(&handler, "lost") == 1).await;

        // Act: probe while the server still refuses
        supervisor.send("lost-payload".into());
        wait_until(|| count(&handler, "lost") == 2).await;

        // Server recovers; the next probe succeeds
        transport.refuse.store(false, Ordering::SeqCst);
        supervisor.send("fresh".into());
        let mut peer = timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        let delivered = timeout(WAIT, peer.from_client.recv()).await.unwrap();

        // Assert
        assert_eq!(delivered.as_deref(), Some("fresh"));
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_shutdown_ends_session() {
        let (supervisor, _, mut accepted) = make_supervisor(false);
        supervisor.start("wss://example.test", Arc::new(RecordingHandler::default()));
        let mut peer = timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        wait_for_state(&supervisor, SessionState::Connected).await;

        supervisor.shutdown().await;

        assert_eq!(supervisor.state(), SessionState::Disconnected);
        assert_eq!(supervisor.address(), None);
        // Client sink dropped with the task.
        assert_eq!(timeout(WAIT, peer.from_client.recv()).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_delay_retries_without_a_probe() {
        // Arrange
        let (peers, mut accepted) = mpsc::unbounded_channel();
        let transport = Arc::new(FakeTransport {
            refuse: AtomicBool::new(true),
            attempts: AtomicUsize::new(0),
            peers,
        });
        let supervisor = ConnectionSupervisor::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            SupervisorConfig {
                reconnect_delay: Some(Duration::from_secs(10)),
                ..SupervisorConfig::default()
            },
        );
        supervisor.start("wss://example.test", Arc::new(RecordingHandler::default()));

        // Act
        tokio::time::sleep(Duration::from_secs(1)).await;
        transport.refuse.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;

        // Assert
        assert!(accepted.try_recv().is_ok(), "retry timer should reconnect");
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);
    }

    /// Transport whose first attempt hangs mid-handshake.
    struct StallingTransport {
        attempts: AtomicUsize,
        peers: mpsc::UnboundedSender<Peer>,
    }

    #[async_trait]
    impl Transport for StallingTransport {
        async fn connect(
            &self,
            _address: &str,
        ) -> Result<(Box<dyn FrameSink>, Box<dyn FrameStream>), TransportError> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending::<()>().await;
            }
            let (to_client, client_rx) = mpsc::unbounded_channel();
            let (client_tx, from_client) = mpsc::unbounded_channel();
            let _ = self.peers.send(Peer {
                to_client,
                from_client,
            });
            Ok((Box::new(ChannelSink(client_tx)), Box::new(ChannelStream(client_rx))))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_connect_times_out_and_retries() {
        // Arrange
        let (peers, mut accepted) = mpsc::unbounded_channel();
        let transport = Arc::new(StallingTransport {
            attempts: AtomicUsize::new(0),
            peers,
        });
        let supervisor = ConnectionSupervisor::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            SupervisorConfig {
                reconnect_delay: Some(Duration::from_secs(5)),
                connect_timeout: Duration::from_secs(30),
            },
        );
        let handler = Arc::new(RecordingHandler::default());
        supervisor.start("wss://example.test", handler.clone());

        // Act: queue a frame while the first attempt hangs
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(supervisor.state(), SessionState::Connecting);
        supervisor.send("stale".into());
        tokio::time::sleep(Duration::from_secs(40)).await;

        // Assert: the attempt was abandoned, its queue dropped, and the retry connected
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(supervisor.state(), SessionState::Connected);
        assert_eq!(
            *handler.log.lock().unwrap(),
            vec!["lost".to_string(), "established".to_string()]
        );
        let mut peer = accepted.try_recv().expect("retry should connect");
        assert!(peer.from_client.try_recv().is_err());
    }

    #[test]
    fn test_retired_generation_cannot_overwrite_state() {
        // Arrange
        let cell = StateCell::new();
        let old = cell.generation();
        cell.publish(old, SessionState::Connected);

        // Act: the old session is stopped and a new one connects before
        // the old task reports its final state
        cell.retire();
        let new = cell.generation();
        cell.publish(new, SessionState::Connected);
        cell.publish(old, SessionState::Disconnected);

        // Assert
        assert_ne!(old, new);
        assert_eq!(*cell.tx.borrow(), SessionState::Connected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_restart_after_stop_keeps_new_session_state() {
        // Arrange
        let (supervisor, transport, mut accepted) = make_supervisor(false);
        let handler = Arc::new(RecordingHandler::default());
        supervisor.start("wss://example.test", handler.clone());
        let _first = timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        wait_for_state(&supervisor, SessionState::Connected).await;

        // Act
        supervisor.stop();
        assert_eq!(supervisor.state(), SessionState::Disconnected);
        assert!(supervisor.start("wss://example.test", handler.clone()));
        let _second = timeout(WAIT, accepted.recv()).await.unwrap().unwrap();
        wait_for_state(&supervisor, SessionState::Connected).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Assert
        assert_eq!(transport.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(supervisor.state(), SessionState::Connected);
    }
}
