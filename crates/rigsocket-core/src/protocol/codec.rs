//! JSON codec for stats protocol frames.
//!
//! Decoding is a two-step discriminated-union parse: the frame is first read
//! as a JSON object to extract its `method` tag, then the kind-specific
//! fields are decoded into the matching [`InboundMessage`] variant.  Unknown
//! methods decode successfully to [`InboundMessage::Unknown`].
//!
//! Several numeric fields arrive either as JSON numbers or as numeric
//! strings depending on the server version; both are accepted.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::credentials::Credentials;
use crate::domain::device::StatusReport;
use crate::protocol::messages::{
    AlgorithmId, CredentialsMessage, ExchangeRates, InboundMessage, PayRate, StableField,
    METHOD_BALANCE, METHOD_BURN, METHOD_EXCHANGE_RATES, METHOD_SMA, METHOD_VERSIONS,
};

/// Errors that can occur while encoding or decoding a frame.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The frame is not a JSON object (or could not be serialized).
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The envelope has no string `method` field.
    #[error("envelope has no string `method` field")]
    MissingMethod,

    /// A field required by this message kind is absent.
    #[error("`{method}` message is missing field `{field}`")]
    MissingField {
        method: &'static str,
        field: &'static str,
    },

    /// A field is present but has the wrong shape or an unparseable value.
    #[error("`{method}` message has invalid field `{field}`: {reason}")]
    InvalidField {
        method: &'static str,
        field: &'static str,
        reason: String,
    },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one inbound text frame.
///
/// # Errors
///
/// Returns [`CodecError`] if the frame is not a JSON object, has no `method`,
/// or a known method's required fields are missing or malformed.  A missing
/// or malformed `stable` field on an `sma` message is *not* an error; it is
/// reported through [`StableField`].
///
/// # Examples
///
/// ```rust
/// use rigsocket_core::{decode_inbound, InboundMessage};
///
/// let msg = decode_inbound(r#"{"method":"burn","message":"old client"}"#).unwrap();
/// assert_eq!(msg, InboundMessage::Burn { message: "old client".to_string() });
/// ```
pub fn decode_inbound(text: &str) -> Result<InboundMessage, CodecError> {
    let mut envelope: Map<String, Value> = serde_json::from_str(text)?;

    let method = match envelope.remove("method") {
        Some(Value::String(method)) => method,
        _ => return Err(CodecError::MissingMethod),
    };

    match method.as_str() {
        METHOD_SMA => decode_sma(&mut envelope),
        METHOD_BALANCE => decode_balance(&mut envelope),
        METHOD_VERSIONS => Ok(InboundMessage::Versions {
            legacy: take_string(&mut envelope, METHOD_VERSIONS, "legacy")?,
        }),
        METHOD_BURN => Ok(InboundMessage::Burn {
            message: take_string(&mut envelope, METHOD_BURN, "message")?,
        }),
        METHOD_EXCHANGE_RATES => decode_exchange_rates(&mut envelope),
        _ => Ok(InboundMessage::Unknown { method }),
    }
}

/// Encodes a credentials frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn encode_credentials(credentials: &Credentials) -> Result<String, CodecError> {
    let msg = CredentialsMessage {
        btc: credentials.address.clone(),
        worker: credentials.worker.clone(),
    };
    Ok(serde_json::to_string(&msg)?)
}

/// Encodes a device status report frame.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if serialization fails.
pub fn encode_status_report(report: &StatusReport) -> Result<String, CodecError> {
    Ok(serde_json::to_string(report)?)
}

// ── Per-method decoders ───────────────────────────────────────────────────────

fn decode_sma(envelope: &mut Map<String, Value>) -> Result<InboundMessage, CodecError> {
    let stable = decode_stable(envelope.remove("stable"));

    let data = take_field(envelope, METHOD_SMA, "data")?;
    let pairs: Vec<(AlgorithmId, Value)> =
        serde_json::from_value(data).map_err(|e| invalid(METHOD_SMA, "data", e))?;

    let rates = pairs
        .into_iter()
        .map(|(algorithm, paying)| {
            numeric(&paying)
                .map(|paying| PayRate { algorithm, paying })
                .ok_or_else(|| {
                    invalid(
                        METHOD_SMA,
                        "data",
                        format!("algorithm {algorithm} has non-numeric rate {paying}"),
                    )
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(InboundMessage::Sma { rates, stable })
}

/// The service sends `stable` as a JSON *string* holding an array; a bare
/// array is accepted as well.
fn decode_stable(value: Option<Value>) -> StableField {
    let decoded = match value {
        None | Some(Value::Null) => return StableField::Missing,
        Some(Value::String(text)) => serde_json::from_str::<Vec<AlgorithmId>>(&text),
        Some(array @ Value::Array(_)) => serde_json::from_value::<Vec<AlgorithmId>>(array),
        Some(other) => {
            return StableField::Invalid(format!("expected an encoded array, got {other}"))
        }
    };
    match decoded {
        Ok(ids) => StableField::Algorithms(ids),
        Err(e) => StableField::Invalid(e.to_string()),
    }
}

fn decode_balance(envelope: &mut Map<String, Value>) -> Result<InboundMessage, CodecError> {
    let value = take_field(envelope, METHOD_BALANCE, "value")?;
    let text = match &value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(invalid(
                METHOD_BALANCE,
                "value",
                format!("expected a number or numeric string, got {other}"),
            ))
        }
    };
    let amount = numeric(&value).ok_or_else(|| {
        invalid(METHOD_BALANCE, "value", format!("{text:?} is not a decimal number"))
    })?;
    Ok(InboundMessage::Balance { text, amount })
}

#[derive(Deserialize)]
struct RawExchangeRates {
    exchanges: Option<Vec<BTreeMap<String, Value>>>,
    exchanges_fiat: Option<BTreeMap<String, f64>>,
}

fn decode_exchange_rates(envelope: &mut Map<String, Value>) -> Result<InboundMessage, CodecError> {
    let data = take_field(envelope, METHOD_EXCHANGE_RATES, "data")?;
    let raw: RawExchangeRates = match data {
        Value::String(text) => serde_json::from_str(&text),
        object @ Value::Object(_) => serde_json::from_value(object),
        other => {
            return Err(invalid(
                METHOD_EXCHANGE_RATES,
                "data",
                format!("expected an encoded object, got {other}"),
            ))
        }
    }
    .map_err(|e| invalid(METHOD_EXCHANGE_RATES, "data", e))?;

    let (Some(exchanges), Some(fiat)) = (raw.exchanges, raw.exchanges_fiat) else {
        return Err(invalid(
            METHOD_EXCHANGE_RATES,
            "data",
            "both `exchanges` and `exchanges_fiat` are required",
        ));
    };

    let usd_btc_rate = exchanges.iter().find_map(|entry| {
        let is_btc = entry.get("coin").and_then(Value::as_str) == Some("BTC");
        if is_btc {
            entry.get("USD").and_then(numeric)
        } else {
            None
        }
    });

    Ok(InboundMessage::ExchangeRates(ExchangeRates {
        usd_btc_rate,
        fiat,
    }))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn take_field(
    envelope: &mut Map<String, Value>,
    method: &'static str,
    field: &'static str,
) -> Result<Value, CodecError> {
    match envelope.remove(field) {
        None | Some(Value::Null) => Err(CodecError::MissingField { method, field }),
        Some(value) => Ok(value),
    }
}

fn take_string(
    envelope: &mut Map<String, Value>,
    method: &'static str,
    field: &'static str,
) -> Result<String, CodecError> {
    match take_field(envelope, method, field)? {
        Value::String(s) => Ok(s),
        other => Err(invalid(method, field, format!("expected a string, got {other}"))),
    }
}

fn invalid(method: &'static str, field: &'static str, reason: impl ToString) -> CodecError {
    CodecError::InvalidField {
        method,
        field,
        reason: reason.to_string(),
    }
}

/// Reads a finite number from a JSON number or a numeric string.
fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
