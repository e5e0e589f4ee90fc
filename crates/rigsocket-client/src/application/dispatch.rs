//! InboundDispatcher: decodes received frames and routes them by `method`.
//!
//! | method           | effect                                                |
//! |------------------|-------------------------------------------------------|
//! | `sma`            | store stable set (if decodable), replace pay rates    |
//! | `balance`        | store balance, emit `balance_updated`                 |
//! | `versions`       | store version, emit `version_updated`                 |
//! | `burn`           | emit `version_burn` (no state change)                 |
//! | `exchange_rates` | store rates, emit `exchange_rates_updated`            |
//! | anything else    | ignored                                               |
//!
//! The connection supervisor calls [`InboundDispatcher::handle_frame`] from
//! its single session task, so frames are applied one at a time in arrival
//! order.  Nothing here returns an error to the supervisor: a frame that
//! fails to decode is logged and skipped, and the session carries on.

use std::sync::Arc;

use rigsocket_core::protocol::messages::StableField;
use rigsocket_core::{decode_inbound, InboundMessage};
use tracing::{debug, warn};

use crate::application::events::EventHub;
use crate::application::state::RemoteState;

/// Routes decoded inbound messages to [`RemoteState`] and [`EventHub`].
pub struct InboundDispatcher {
    state: Arc<RemoteState>,
    events: Arc<EventHub>,
}

impl InboundDispatcher {
    pub fn new(state: Arc<RemoteState>, events: Arc<EventHub>) -> Self {
        Self { state, events }
    }

    /// Handles one raw frame delivered by the transport.
    ///
    /// Non-text frames are ignored.  Decode failures are logged with the
    /// offending frame and dropped.
    pub fn handle_frame(&self, raw: &str, is_text: bool) {
        if !is_text {
            debug!(component = "socket", "ignoring non-text frame ({} bytes)", raw.len());
            return;
        }
        debug!(component = "socket", "received: {raw}");

        match decode_inbound(raw) {
            Ok(message) => {
                debug!(component = "socket", method = message.method(), "dispatching");
                self.dispatch(message);
            }
            Err(e) => warn!(component = "socket", "dropping undecodable frame: {e}; frame: {raw}"),
        }
    }

    /// Applies one decoded message.
    pub fn dispatch(&self, message: InboundMessage) {
        match message {
            InboundMessage::Sma { rates, stable } => {
                let stable = match stable {
                    StableField::Algorithms(ids) => Some(ids),
                    // Older payload versions never send `stable`.
                    StableField::Missing => {
                        debug!(component = "socket", "sma without stable field");
                        None
                    }
                    StableField::Invalid(reason) => {
                        warn!(
                            component = "socket",
                            "undecodable sma stable field ({reason}); applying rates only"
                        );
                        None
                    }
                };
                self.state.apply_sma(&rates, stable.as_deref());
                self.events.sma_updated.emit(&rates);
            }
            InboundMessage::Balance { text, amount } => {
                self.state.set_balance(&text, amount);
                self.events.balance_updated.emit(&text);
            }
            InboundMessage::Versions { legacy } => {
                self.state.set_version(&legacy);
                self.events.version_updated.emit(&legacy);
            }
            InboundMessage::Burn { message } => {
                warn!(component = "socket", "service retired this client version: {message}");
                self.events.version_burn.emit(&message);
            }
            InboundMessage::ExchangeRates(rates) => {
                self.state.set_exchange_rates(rates.clone());
                self.events.exchange_rates_updated.emit(&rates);
            }
            InboundMessage::Unknown { method } => {
                debug!(component = "socket", "ignoring unknown method {method:?}");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
