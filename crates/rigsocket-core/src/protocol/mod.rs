//! Protocol module containing the JSON message types and their codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_inbound, encode_credentials, encode_status_report, CodecError};
pub use messages::*;
