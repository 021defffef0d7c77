//! Account addresses.
//!
//! An address is 26 bytes, shown in base58:
//!
//! ```text
//! version(1) || chain_id(1) || hash_chain(public_key)[..20] || checksum(4)
//! ```
//!
//! where `checksum = hash_chain(first 22 bytes)[..4]`. The chain id byte is
//! what lets a transaction recover its network from the sender alone.

use thiserror::Error;

use crate::config::{
    ADDRESS_CHECKSUM_LENGTH, ADDRESS_HASH_LENGTH, ADDRESS_LENGTH, ADDRESS_VERSION,
};
use crate::crypto::hash::hash_chain;

const CHECKSUMMED_PREFIX: usize = ADDRESS_LENGTH - ADDRESS_CHECKSUM_LENGTH;

/// Errors produced while deriving or parsing addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is not valid base58: {0}")]
    InvalidBase58(String),

    #[error("address must be 26 bytes, got {0}")]
    InvalidLength(usize),

    #[error("unsupported address version {0}")]
    InvalidVersion(u8),

    #[error("address checksum mismatch")]
    ChecksumMismatch,

    #[error("chain id {0:?} is not a single-byte ASCII character")]
    InvalidChainId(char),
}

/// Raw 26-byte address for `public_key` on the chain `chain_id`.
pub fn address_bytes(public_key: &[u8], chain_id: char) -> Result<[u8; ADDRESS_LENGTH], AddressError> {
    if !chain_id.is_ascii() {
        return Err(AddressError::InvalidChainId(chain_id));
    }

    let mut out = [0u8; ADDRESS_LENGTH];
    out[0] = ADDRESS_VERSION;
    out[1] = chain_id as u8;
    out[2..2 + ADDRESS_HASH_LENGTH].copy_from_slice(&hash_chain(public_key)[..ADDRESS_HASH_LENGTH]);
    let checksum = hash_chain(&out[..CHECKSUMMED_PREFIX]);
    out[CHECKSUMMED_PREFIX..].copy_from_slice(&checksum[..ADDRESS_CHECKSUM_LENGTH]);
    Ok(out)
}

/// Base58 address for `public_key` on the chain `chain_id`.
///
/// # Example
///
/// ```
/// use lto_protocol::identity::derive_address;
///
/// let address = derive_address(&[7u8; 32], 'T').unwrap();
/// assert!(address.starts_with("3M"));
/// ```
pub fn derive_address(public_key: &[u8], chain_id: char) -> Result<String, AddressError> {
    Ok(bs58::encode(address_bytes(public_key, chain_id)?).into_string())
}

/// Decodes and fully validates a base58 address.
pub fn decode_address(address: &str) -> Result<[u8; ADDRESS_LENGTH], AddressError> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;
    check_address_bytes(&bytes)
}

/// Validates raw address bytes (as carried inside binary layouts).
pub fn check_address_bytes(bytes: &[u8]) -> Result<[u8; ADDRESS_LENGTH], AddressError> {
    let raw: [u8; ADDRESS_LENGTH] = bytes
        .try_into()
        .map_err(|_| AddressError::InvalidLength(bytes.len()))?;

    if raw[0] != ADDRESS_VERSION {
        return Err(AddressError::InvalidVersion(raw[0]));
    }
    let checksum = hash_chain(&raw[..CHECKSUMMED_PREFIX]);
    if raw[CHECKSUMMED_PREFIX..] != checksum[..ADDRESS_CHECKSUM_LENGTH] {
        return Err(AddressError::ChecksumMismatch);
    }
    Ok(raw)
}

/// The network identifier embedded in `address`.
pub fn chain_id_of(address: &str) -> Result<char, AddressError> {
    Ok(decode_address(address)?[1] as char)
}

/// `true` if `address` parses and its checksum holds.
pub fn is_valid_address(address: &str) -> bool {
    decode_address(address).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key() -> Vec<u8> {
        (0u8..32).collect()
    }

    #[test]
    fn known_mainnet_and_testnet_addresses() {
        assert_eq!(
            derive_address(&sample_key(), 'L').unwrap(),
            "3JdaptcAVyJUBT5jwFsiKzpy8c3xggXz9ZQ"
        );
        assert_eq!(
            derive_address(&sample_key(), 'T').unwrap(),
            "3MrHemUYoekBBzYrdTENssq9Re62EGSGFM5"
        );
    }

    #[test]
    fn raw_layout() {
        let raw = address_bytes(&sample_key(), 'L').unwrap();
        assert_eq!(
            hex::encode(raw),
            "014c1a0487022aab027d3e23ce00f1a4d4f10c54f900fdd9c7df"
        );
    }

    #[test]
    fn chain_id_is_recoverable() {
        let addr = derive_address(&sample_key(), 'T').unwrap();
        assert_eq!(chain_id_of(&addr).unwrap(), 'T');
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let mut raw = address_bytes(&sample_key(), 'L').unwrap();
        raw[25] ^= 0xff;
        assert_eq!(check_address_bytes(&raw), Err(AddressError::ChecksumMismatch));
        assert!(!is_valid_address(&bs58::encode(raw).into_string()));
    }

    #[test]
    fn malformed_inputs() {
        assert!(matches!(
            decode_address("0OIl"),
            Err(AddressError::InvalidBase58(_))
        ));
        assert_eq!(
            check_address_bytes(&[1u8; 10]),
            Err(AddressError::InvalidLength(10))
        );
        let mut raw = address_bytes(&sample_key(), 'L').unwrap();
        raw[0] = 2;
        assert_eq!(check_address_bytes(&raw), Err(AddressError::InvalidVersion(2)));
    }

    #[test]
    fn non_ascii_chain_id_is_rejected() {
        assert_eq!(
            derive_address(&sample_key(), 'é'),
            Err(AddressError::InvalidChainId('é'))
        );
    }
}
