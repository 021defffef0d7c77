//! # Hashing Utilities
//!
//! The three digests the wire formats rely on:
//!
//! - **SHA-256**: content hashes of messages and [`crate::binary::Binary::hash`].
//! - **BLAKE2b-256**: transaction ids.
//! - **Hash chain**: `SHA-256(BLAKE2b-256(x))`, used for address key hashes
//!   and address checksums.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use sha2::Sha256;

type Blake2b256 = Blake2b<U32>;

/// SHA-256 of `data` as a `Vec<u8>`.
///
/// # Example
///
/// ```
/// use lto_protocol::crypto::sha256;
///
/// assert_eq!(sha256(b"LTO").len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> Vec<u8> {
    sha256_array(data).to_vec()
}

/// SHA-256 returning a fixed-size array.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// BLAKE2b with a 256-bit output.
pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    Blake2b256::digest(data).into()
}

/// `SHA-256(BLAKE2b-256(data))`.
pub fn hash_chain(data: &[u8]) -> [u8; 32] {
    sha256_array(&blake2b256(data))
}
