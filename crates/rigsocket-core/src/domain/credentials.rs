//! Payout credentials and their validation.
//!
//! The client tells the coordination service which bitcoin address to pay
//! and which worker name to show for this rig.  Credentials are validated
//! before every send; invalid ones are never transmitted.
//!
//! # Address format
//!
//! The default validator accepts legacy Base58Check addresses:
//!
//! ```text
//! base58( version:1 | hash160:20 | checksum:4 )
//! checksum = sha256(sha256(version | hash160))[..4]
//! ```
//!
//! Version bytes `0x00` (P2PKH) and `0x05` (P2SH) are accepted on mainnet,
//! `0x6F` and `0xC4` on testnet.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Maximum worker-name length accepted by the service.
pub const MAX_WORKER_NAME_LEN: usize = 15;

const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const ADDRESS_PAYLOAD_LEN: usize = 25;
const ACCEPTED_VERSIONS: [u8; 4] = [0x00, 0x05, 0x6F, 0xC4];

/// A bitcoin payout address paired with a worker (rig) name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub address: String,
    pub worker: String,
}

impl Credentials {
    pub fn new(address: impl Into<String>, worker: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            worker: worker.into(),
        }
    }
}

/// Why a credential pair was rejected.
///
/// These are diagnostics only; the client treats any rejection as "do not
/// send" and does not surface it further.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("address length {0} is outside 26..=35 characters")]
    AddressLength(usize),

    #[error("address contains non-base58 character {0:?}")]
    InvalidCharacter(char),

    #[error("address decodes to more than {ADDRESS_PAYLOAD_LEN} bytes")]
    AddressOverflow,

    #[error("address version byte 0x{0:02X} is not accepted")]
    UnsupportedVersion(u8),

    #[error("address checksum mismatch")]
    ChecksumMismatch,

    #[error("worker name is longer than {MAX_WORKER_NAME_LEN} characters")]
    WorkerNameTooLong,

    #[error("worker name contains non-alphanumeric character {0:?}")]
    WorkerNameCharacter(char),
}

/// Validates payout credentials before they are sent.
///
/// The client depends on this trait rather than a concrete validator so that
/// deployments with other address formats can plug in their own rules.
pub trait CredentialValidator: Send + Sync {
    /// Checks the payout address format.
    fn validate_address(&self, address: &str) -> Result<(), CredentialError>;

    /// Checks the worker name format.
    fn validate_worker_name(&self, worker: &str) -> Result<(), CredentialError>;

    /// Checks both halves of a credential pair, address first.
    fn validate(&self, credentials: &Credentials) -> Result<(), CredentialError> {
        self.validate_address(&credentials.address)?;
        self.validate_worker_name(&credentials.worker)
    }
}

/// Default validator: Base58Check addresses and short alphanumeric worker names.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base58CheckValidator;

impl CredentialValidator for Base58CheckValidator {
    fn validate_address(&self, address: &str) -> Result<(), CredentialError> {
        if !(26..=35).contains(&address.len()) {
            return Err(CredentialError::AddressLength(address.len()));
        }

        let payload = decode_base58_payload(address)?;
        if !ACCEPTED_VERSIONS.contains(&payload[0]) {
            return Err(CredentialError::UnsupportedVersion(payload[0]));
        }

        let first = Sha256::digest(&payload[..21]);
        let second = Sha256::digest(first);
        if second[..4] != payload[21..] {
            return Err(CredentialError::ChecksumMismatch);
        }
        Ok(())
    }

    fn validate_worker_name(&self, worker: &str) -> Result<(), CredentialError> {
        // An empty worker name is allowed; the service then shows the rig
        // under the address alone.
        if worker.chars().count() > MAX_WORKER_NAME_LEN {
            return Err(CredentialError::WorkerNameTooLong);
        }
        match worker.chars().find(|c| !c.is_ascii_alphanumeric()) {
            Some(c) => Err(CredentialError::WorkerNameCharacter(c)),
            None => Ok(()),
        }
    }
}

/// Decodes a base58 string into a fixed 25-byte big-endian buffer.
fn decode_base58_payload(address: &str) -> Result<[u8; ADDRESS_PAYLOAD_LEN], CredentialError> {
    let mut out = [0u8; ADDRESS_PAYLOAD_LEN];
    for c in address.chars() {
        let digit = u8::try_from(c)
            .ok()
            .and_then(|b| BASE58_ALPHABET.iter().position(|&a| a == b))
            .ok_or(CredentialError::InvalidCharacter(c))?;

        let mut carry = digit as u32;
        for byte in out.iter_mut().rev() {
            carry += 58 * u32::from(*byte);
            *byte = (carry & 0xFF) as u8;
            carry >>= 8;
        }
        if carry != 0 {
            return Err(CredentialError::AddressOverflow);
        }
    }
    Ok(out)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS_P2PKH: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
    const BIP16_P2SH: &str = "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy";
    const TESTNET_P2PKH: &str = "mipcBbFg9gMiCh81Kj8tqqdgoZub1ZJRfn";

    #[test]
    fn test_mainnet_p2pkh_address_is_valid() {
        assert_eq!(Base58CheckValidator.validate_address(GENESIS_P2PKH), Ok(()));
    }

    #[test]
    fn test_mainnet_p2sh_address_is_valid() {
        assert_eq!(Base58CheckValidator.validate_address(BIP16_P2SH), Ok(()));
    }

    #[test]
    fn test_testnet_address_is_valid() {
        assert_eq!(Base58CheckValidator.validate_address(TESTNET_P2PKH), Ok(()));
    }

    #[test]
    fn test_single_character_change_breaks_checksum() {
        // Arrange: flip the last character of a valid address
        let tampered = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb";

        // Act
        let result = Base58CheckValidator.validate_address(tampered);

        // Assert
        assert_eq!(result, Err(CredentialError::ChecksumMismatch));
    }

    #[test]
    fn test_address_with_zero_character_is_rejected() {
        // '0' is excluded from the base58 alphabet
        let bad = "1A1zP1eP5QGefi2DMPTfTL5SLmv7Divf0a";
        assert_eq!(
            Base58CheckValidator.validate_address(bad),
            Err(CredentialError::InvalidCharacter('0'))
        );
    }

    #[test]
    fn test_short_address_is_rejected() {
        assert_eq!(
            Base58CheckValidator.validate_address("1abc"),
            Err(CredentialError::AddressLength(4))
        );
    }

    #[test]
    fn test_empty_address_is_rejected() {
        assert!(Base58CheckValidator.validate_address("").is_err());
    }

    #[test]
    fn test_worker_name_alphanumeric_is_valid() {
        assert_eq!(Base58CheckValidator.validate_worker_name("rig01"), Ok(()));
    }

    #[test]
    fn test_empty_worker_name_is_valid() {
        assert_eq!(Base58CheckValidator.validate_worker_name(""), Ok(()));
    }

    #[test]
    fn test_worker_name_with_space_is_rejected() {
        assert_eq!(
            Base58CheckValidator.validate_worker_name("my rig"),
            Err(CredentialError::WorkerNameCharacter(' '))
        );
    }

    #[test]
    fn test_worker_name_over_fifteen_characters_is_rejected() {
        assert_eq!(
            Base58CheckValidator.validate_worker_name("abcdefghijklmnop"),
            Err(CredentialError::WorkerNameTooLong)
        );
    }

    #[test]
    fn test_validate_checks_address_before_worker() {
        let creds = Credentials::new("not-an-address", "bad name!");
        assert!(matches!(
            Base58CheckValidator.validate(&creds),
            Err(CredentialError::AddressLength(_))
        ));
    }
}
