//! # Digital Signatures
//!
//! The signing and verification capabilities the codec consumes.
//!
//! Transactions and messages never touch private keys. They hand their
//! canonical bytes to a [`Signer`] and keep whatever detached signature
//! comes back. Verification goes through a [`Verifier`], selected by the
//! key type recorded next to the public key.

use ed25519_dalek::{Signature as DalekSignature, Verifier as _};

use super::keys::{ed25519_verifying_key, KeyError, KeyType};
use crate::binary::Binary;
use crate::config::SIGNATURE_LENGTH;

/// Something that can sign on behalf of an account.
pub trait Signer {
    /// Base58 address of the account.
    fn address(&self) -> &str;

    fn key_type(&self) -> KeyType;

    /// Raw public key bytes.
    fn public_key(&self) -> Binary;

    /// Detached signature over `message`.
    fn sign(&self, message: &[u8]) -> Binary;
}

/// Checks detached signatures for one key type.
pub trait Verifier {
    fn verify_signature(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool;
}

/// Ed25519 verification (strict: small-order keys and malleable
/// signatures are rejected).
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl Verifier for Ed25519Verifier {
    fn verify_signature(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        let Ok(key) = ed25519_verifying_key(public_key) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; SIGNATURE_LENGTH]>::try_from(signature) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&sig_bytes);
        key.verify_strict(message, &sig).is_ok() && key.verify(message, &sig).is_ok()
    }
}

/// The verifier for `key_type`, if this build supports it.
pub fn verifier_for(key_type: KeyType) -> Result<&'static dyn Verifier, KeyError> {
    match key_type {
        KeyType::Ed25519 => Ok(&Ed25519Verifier),
        other => Err(KeyError::UnsupportedKeyType(other)),
    }
}

/// Verifies `signature` over `message` with the verifier for `key_type`.
pub fn verify(
    key_type: KeyType,
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<bool, KeyError> {
    Ok(verifier_for(key_type)?.verify_signature(message, signature, public_key))
}
