//! # Key Management
//!
//! Key-type tags and the ed25519 keypair that backs [`crate::identity::Account`].
//!
//! Deriving keys from seed phrases is the job of the wallet layer; this
//! module starts from raw 32-byte seeds. Key bytes are never logged.

use std::fmt;

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::binary::Binary;
use crate::config::{KEY_TYPE_ID_ED25519, KEY_TYPE_ID_SECP256K1, KEY_TYPE_ID_SECP256R1};

/// Errors that can occur during key operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid {0} key")]
    InvalidPublicKey(KeyType),

    #[error("unknown key type id {0}")]
    UnknownKeyTypeId(u8),

    #[error("unsupported key type {0}")]
    UnsupportedKeyType(KeyType),
}

// ---------------------------------------------------------------------------
// KeyType
// ---------------------------------------------------------------------------

/// Signature scheme of an account key. Serialized in JSON as its lowercase
/// name and on the wire as a one-byte id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    #[default]
    Ed25519,
    Secp256k1,
    Secp256r1,
}

impl KeyType {
    /// One-byte wire tag.
    pub fn id(self) -> u8 {
        match self {
            KeyType::Ed25519 => KEY_TYPE_ID_ED25519,
            KeyType::Secp256k1 => KEY_TYPE_ID_SECP256K1,
            KeyType::Secp256r1 => KEY_TYPE_ID_SECP256R1,
        }
    }

    pub fn from_id(id: u8) -> Result<Self, KeyError> {
        match id {
            KEY_TYPE_ID_ED25519 => Ok(KeyType::Ed25519),
            KEY_TYPE_ID_SECP256K1 => Ok(KeyType::Secp256k1),
            KEY_TYPE_ID_SECP256R1 => Ok(KeyType::Secp256r1),
            other => Err(KeyError::UnknownKeyTypeId(other)),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Ed25519 => write!(f, "ed25519"),
            KeyType::Secp256k1 => write!(f, "secp256k1"),
            KeyType::Secp256r1 => write!(f, "secp256r1"),
        }
    }
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// An ed25519 signing keypair.
///
/// Deliberately not `Serialize`: exporting secret material goes through
/// [`Keypair::secret_key_bytes`] and nothing else.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// A fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic keypair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Keypair from a seed held in an arbitrary slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let seed: [u8; SECRET_KEY_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn public_key(&self) -> Binary {
        Binary::from(self.public_key_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Detached 64-byte signature over `message`.
    pub fn sign(&self, message: &[u8]) -> Binary {
        Binary::from(self.signing_key.sign(message).to_bytes())
    }

    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// The X25519 scalar matching this key, for key agreement.
    pub(crate) fn x25519_secret(&self) -> [u8; 32] {
        self.signing_key.to_scalar_bytes()
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair(pub={})", self.public_key().to_base58())
    }
}

impl PartialEq for Keypair {
    fn eq(&self, other: &Self) -> bool {
        self.public_key_bytes() == other.public_key_bytes()
    }
}

impl Eq for Keypair {}

/// Parses raw ed25519 public key bytes.
pub fn ed25519_verifying_key(public_key: &[u8]) -> Result<VerifyingKey, KeyError> {
    let bytes: [u8; 32] = public_key
        .try_into()
        .map_err(|_| KeyError::InvalidPublicKey(KeyType::Ed25519))?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey(KeyType::Ed25519))
}

/// Montgomery (X25519) form of an ed25519 public key.
pub fn x25519_public_key(public_key: &[u8]) -> Result<[u8; 32], KeyError> {
    Ok(ed25519_verifying_key(public_key)?.to_montgomery().to_bytes())
}
