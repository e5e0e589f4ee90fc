//! Message types for the stats WebSocket protocol.
//!
//! # Inbound frames
//!
//! Every frame the service sends is a JSON object with a `"method"` field that
//! identifies its kind.  The remaining fields depend on the kind:
//!
//! ```json
//! {"method":"sma","data":[[20,"0.00012"],[24,0.0042]],"stable":"[20,24]"}
//! {"method":"balance","value":"0.00012345"}
//! {"method":"versions","legacy":"1.9.0.4"}
//! {"method":"burn","message":"This version is no longer supported"}
//! {"method":"exchange_rates","data":"{\"exchanges\":[...],\"exchanges_fiat\":{...}}"}
//! ```
//!
//! Decoding produces an [`InboundMessage`], a closed enum with one variant
//! per known method plus [`InboundMessage::Unknown`] for anything else, so
//! new server-side methods never break older clients.
//!
//! # Outbound frames
//!
//! ```json
//! {"btc":"1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa","worker":"rig01"}
//! {"devices":[[0,"GPU0",5,55,62,70]]}
//! ```
//!
//! The device report is [`crate::domain::StatusReport`]; the credentials frame
//! is [`CredentialsMessage`].

use std::collections::BTreeMap;

use serde::Serialize;

/// Method tag of a pricing update.
pub const METHOD_SMA: &str = "sma";
/// Method tag of a balance update.
pub const METHOD_BALANCE: &str = "balance";
/// Method tag of a version announcement.
pub const METHOD_VERSIONS: &str = "versions";
/// Method tag of a client deprecation notice.
pub const METHOD_BURN: &str = "burn";
/// Method tag of an exchange-rate update.
pub const METHOD_EXCHANGE_RATES: &str = "exchange_rates";

/// Algorithm identifier as numbered by the coordination service.
pub type AlgorithmId = i32;

/// Current paying rate for one algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayRate {
    pub algorithm: AlgorithmId,
    /// BTC paid per unit of hash rate per day.
    pub paying: f64,
}

/// The optional `stable` field of an `sma` message.
///
/// Older payload versions omit it entirely, so absence is distinguished from
/// a value that is present but cannot be decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum StableField {
    Missing,
    Invalid(String),
    Algorithms(Vec<AlgorithmId>),
}

/// Decoded exchange-rate payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExchangeRates {
    /// USD price of one BTC, if the `BTC` entry carried a parseable `USD` rate.
    pub usd_btc_rate: Option<f64>,
    /// USD → fiat conversion factors keyed by currency code.
    pub fiat: BTreeMap<String, f64>,
}

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Current pay rates, optionally with the set of price-stable algorithms.
    Sma {
        rates: Vec<PayRate>,
        stable: StableField,
    },
    /// Unpaid balance of the configured address.
    Balance {
        /// The value as the service sent it, for display.
        text: String,
        /// The same value parsed as a decimal number.
        amount: f64,
    },
    /// Latest released client version.
    Versions { legacy: String },
    /// This client version has been retired; the text explains why.
    Burn { message: String },
    ExchangeRates(ExchangeRates),
    /// A method this client does not know about.
    Unknown { method: String },
}

impl InboundMessage {
    /// Returns the `method` tag this message was decoded from.
    pub fn method(&self) -> &str {
        match self {
            InboundMessage::Sma { .. } => METHOD_SMA,
            InboundMessage::Balance { .. } => METHOD_BALANCE,
            InboundMessage::Versions { .. } => METHOD_VERSIONS,
            InboundMessage::Burn { .. } => METHOD_BURN,
            InboundMessage::ExchangeRates(_) => METHOD_EXCHANGE_RATES,
            InboundMessage::Unknown { method } => method,
        }
    }
}

/// Outbound frame that sets the payout address and worker name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialsMessage {
    pub btc: String,
    pub worker: String,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_of_known_variants() {
        assert_eq!(
            InboundMessage::Burn {
                message: "x".to_string()
            }
            .method(),
            "burn"
        );
        assert_eq!(
            InboundMessage::ExchangeRates(ExchangeRates::default()).method(),
            "exchange_rates"
        );
    }

    #[test]
    fn test_method_of_unknown_echoes_tag() {
        let msg = InboundMessage::Unknown {
            method: "mining.notify".to_string(),
        };
        assert_eq!(msg.method(), "mining.notify");
    }

    #[test]
    fn test_credentials_message_field_names() {
        // Arrange
        let msg = CredentialsMessage {
            btc: "addr".to_string(),
            worker: "rig".to_string(),
        };

        // Act
        let json = serde_json::to_string(&msg).unwrap();

        // Assert: the service expects exactly these two keys
        assert_eq!(json, r#"{"btc":"addr","worker":"rig"}"#);
    }
}
