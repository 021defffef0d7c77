//! # Cryptographic Primitives
//!
//! Everything security-related the codec touches flows through here:
//!
//! - **Ed25519** for account keys and detached signatures.
//! - **X25519** for message key agreement, on the same curve.
//! - **AES-256-GCM** for sealing message payloads.
//! - **SHA-256** and **BLAKE2b-256** for content hashes, ids and addresses.
//!
//! Everything here is a thin, type-safe wrapper around audited
//! implementations. Nothing in this module logs key material.

pub mod encryption;
pub mod hash;
pub mod keys;
pub mod signatures;

pub use encryption::{Decrypter, EncryptionError, Encrypter};
pub use hash::{blake2b256, hash_chain, sha256};
pub use keys::{KeyError, KeyType, Keypair};
pub use signatures::{verify, Signer, Verifier};
