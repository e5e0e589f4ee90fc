//! Observer registry for client notifications.
//!
//! Each notification kind has its own [`Subscribers`] list.  Callbacks run
//! synchronously on the thread that emits the event (the session task for
//! everything except the ones documented otherwise), in registration order,
//! so tests can rely on a deterministic fan-out.
//!
//! # Usage
//!
//! ```rust
//! use rigsocket_client::application::events::EventHub;
//!
//! let hub = EventHub::default();
//! hub.balance_updated.subscribe(|balance| println!("balance is now {balance}"));
//! hub.balance_updated.emit(&"0.00012345".to_string());
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rigsocket_core::protocol::messages::{ExchangeRates, PayRate};
use tracing::error;

/// Handle returned by [`Subscribers::subscribe`]; pass it to
/// [`Subscribers::unsubscribe`] to remove the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// An ordered list of callbacks for one notification kind.
pub struct Subscribers<T> {
    name: &'static str,
    callbacks: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T> Subscribers<T> {
    /// Creates an empty list; `name` is used in log messages.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Appends a callback.  It will run after every callback registered before it.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Removes a callback.  Returns `false` if `id` was not registered here.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.lock();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes every callback with `value`, in registration order.
    ///
    /// The list is snapshotted before any callback runs, so a callback may
    /// subscribe or unsubscribe without deadlocking.  A panicking callback is
    /// logged and does not prevent the remaining callbacks from running.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();
        for callback in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                error!(component = "socket", "{} subscriber panicked", self.name);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Callback<T>)>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// All notifications the client exposes to consumers.
pub struct EventHub {
    /// The unpaid balance changed; carries the value as the service sent it.
    pub balance_updated: Subscribers<String>,
    /// A new client version was announced.
    pub version_updated: Subscribers<String>,
    /// This client version has been retired; carries the service's message.
    pub version_burn: Subscribers<String>,
    /// The pay-rate table was replaced.
    pub sma_updated: Subscribers<Vec<PayRate>>,
    /// Exchange rates were replaced.
    pub exchange_rates_updated: Subscribers<ExchangeRates>,
    /// A session was established (fires after the immediate status push).
    pub connection_established: Subscribers<()>,
    /// The session was lost.
    pub connection_lost: Subscribers<()>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self {
            balance_updated: Subscribers::new("balance_updated"),
            version_updated: Subscribers::new("version_updated"),
            version_burn: Subscribers::new("version_burn"),
            sma_updated: Subscribers::new("sma_updated"),
            exchange_rates_updated: Subscribers::new("exchange_rates_updated"),
            connection_established: Subscribers::new("connection_established"),
            connection_lost: Subscribers::new("connection_lost"),
        }
    }
}

impl EventHub {
    pub fn on_balance_update(&self, f: impl Fn(&String) + Send + Sync + 'static) -> SubscriptionId {
        self.balance_updated.subscribe(f)
    }

    pub fn on_version_update(&self, f: impl Fn(&String) + Send + Sync + 'static) -> SubscriptionId {
        self.version_updated.subscribe(f)
    }

    pub fn on_version_burn(&self, f: impl Fn(&String) + Send + Sync + 'static) -> SubscriptionId {
        self.version_burn.subscribe(f)
    }

    pub fn on_connection_established(
        &self,
        f: impl Fn(&()) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.connection_established.subscribe(f)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
