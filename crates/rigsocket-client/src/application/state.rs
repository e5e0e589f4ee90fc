//! Latest values received from the coordination service.
//!
//! All fields live behind a single `RwLock` and the dispatcher is the only
//! writer.  Readers therefore always see a consistent snapshot: an update
//! that is in flight is either fully visible or not visible at all.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rigsocket_core::protocol::messages::{AlgorithmId, ExchangeRates, PayRate};

/// Unpaid balance as last reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    /// Exactly as the service sent it, for display.
    pub text: String,
    pub amount: f64,
}

/// Copy of everything the service has told us so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSnapshot {
    pub balance: Option<Balance>,
    pub version: Option<String>,
    pub pay_rates: BTreeMap<AlgorithmId, f64>,
    pub stable_algorithms: BTreeSet<AlgorithmId>,
    pub exchange_rates: Option<ExchangeRates>,
}

/// Shared, synchronized holder of the [`RemoteSnapshot`].
#[derive(Debug, Default)]
pub struct RemoteState {
    inner: RwLock<RemoteSnapshot>,
}

impl RemoteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a consistent copy of every field.
    pub fn snapshot(&self) -> RemoteSnapshot {
        self.read().clone()
    }

    pub fn balance(&self) -> Option<Balance> {
        self.read().balance.clone()
    }

    pub fn version(&self) -> Option<String> {
        self.read().version.clone()
    }

    /// Current paying rate for one algorithm, if the service priced it.
    pub fn pay_rate(&self, algorithm: AlgorithmId) -> Option<f64> {
        self.read().pay_rates.get(&algorithm).copied()
    }

    pub fn is_stable(&self, algorithm: AlgorithmId) -> bool {
        self.read().stable_algorithms.contains(&algorithm)
    }

    pub fn exchange_rates(&self) -> Option<ExchangeRates> {
        self.read().exchange_rates.clone()
    }

    pub(crate) fn set_balance(&self, text: &str, amount: f64) {
        self.write().balance = Some(Balance {
            text: text.to_string(),
            amount,
        });
    }

    pub(crate) fn set_version(&self, version: &str) {
        self.write().version = Some(version.to_string());
    }

    /// Applies one `sma` update under a single write guard.
    ///
    /// The pay-rate table is always replaced.  The stable set is replaced
    /// only when `stable` is given; otherwise the previous set is kept.
    pub(crate) fn apply_sma(&self, rates: &[PayRate], stable: Option<&[AlgorithmId]>) {
        let table = rates.iter().map(|r| (r.algorithm, r.paying)).collect();
        let mut inner = self.write();
        inner.pay_rates = table;
        if let Some(algorithms) = stable {
            inner.stable_algorithms = algorithms.iter().copied().collect();
        }
    }

    pub(crate) fn set_exchange_rates(&self, rates: ExchangeRates) {
        self.write().exchange_rates = Some(rates);
    }

    fn read(&self) -> RwLockReadGuard<'_, RemoteSnapshot> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RemoteSnapshot> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
