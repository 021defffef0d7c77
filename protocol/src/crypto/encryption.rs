//! # Message Encryption
//!
//! Seals message payloads for a recipient's ed25519 account key.
//!
//! The recipient's public key is mapped to its X25519 (Montgomery) form and
//! combined with a fresh ephemeral X25519 key. The shared secret goes
//! through BLAKE3 `derive_key` and the result keys AES-256-GCM, with both
//! public keys bound in as associated data.
//!
//! ## Wire format
//!
//! ```text
//! ephemeral_public(32) || nonce(12) || ciphertext || tag(16)
//! ```

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use x25519_dalek::{x25519, EphemeralSecret, PublicKey};

use super::keys::{x25519_public_key, KeyError, Keypair};
use crate::config::{AES_KEY_LENGTH, AES_NONCE_LENGTH, AES_TAG_LENGTH, MESSAGE_KDF_CONTEXT};

const EPHEMERAL_KEY_LENGTH: usize = 32;

/// Errors that can occur during encryption/decryption. Kept vague on
/// purpose: "wrong key" and "corrupted ciphertext" look the same.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncryptionError {
    #[error("encryption failed")]
    EncryptFailed,

    #[error("decryption failed -- wrong key or corrupted ciphertext")]
    DecryptFailed,

    #[error("ciphertext too short")]
    CiphertextTooShort,

    #[error("recipient key unusable for encryption: {0}")]
    Key(#[from] KeyError),
}

/// Capability to seal bytes for one account.
pub trait Encrypter {
    /// Address of the account the ciphertext is meant for.
    fn address(&self) -> &str;

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError>;
}

/// Capability to open bytes sealed for one account.
pub trait Decrypter {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, EncryptionError>;
}

/// Seals `plaintext` for the holder of the ed25519 `recipient_public_key`.
pub fn encrypt_for(recipient_public_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    let recipient = PublicKey::from(x25519_public_key(recipient_public_key)?);

    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(&recipient);

    let key = derive_key(shared.as_bytes());
    let aad = associated_data(ephemeral_public.as_bytes(), recipient.as_bytes());
    let sealed = seal(&key, plaintext, &aad)?;

    let mut out = Vec::with_capacity(EPHEMERAL_KEY_LENGTH + sealed.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Opens data produced by [`encrypt_for`] with the recipient's keypair.
pub fn decrypt_with(keypair: &Keypair, data: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    if data.len() < EPHEMERAL_KEY_LENGTH + AES_NONCE_LENGTH + AES_TAG_LENGTH {
        return Err(EncryptionError::CiphertextTooShort);
    }
    let (ephemeral_public, sealed) = data.split_at(EPHEMERAL_KEY_LENGTH);
    let ephemeral_public: [u8; 32] = ephemeral_public
        .try_into()
        .map_err(|_| EncryptionError::CiphertextTooShort)?;

    let shared = x25519(keypair.x25519_secret(), ephemeral_public);
    let key = derive_key(&shared);
    let own_public = x25519_public_key(&keypair.public_key_bytes())?;
    let aad = associated_data(&ephemeral_public, &own_public);

    open(&key, sealed, &aad)
}

fn derive_key(shared_secret: &[u8; 32]) -> [u8; AES_KEY_LENGTH] {
    blake3::derive_key(MESSAGE_KDF_CONTEXT, shared_secret)
}

fn associated_data(ephemeral_public: &[u8; 32], recipient_public: &[u8; 32]) -> [u8; 64] {
    let mut aad = [0u8; 64];
    aad[..32].copy_from_slice(ephemeral_public);
    aad[32..].copy_from_slice(recipient_public);
    aad
}

/// AES-256-GCM with a random nonce; returns `nonce || ciphertext`.
pub fn seal(
    key: &[u8; AES_KEY_LENGTH],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::EncryptFailed)?;

    let mut nonce_bytes = [0u8; AES_NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|_| EncryptionError::EncryptFailed)?;

    let mut out = Vec::with_capacity(AES_NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Inverse of [`seal`].
pub fn open(key: &[u8; AES_KEY_LENGTH], data: &[u8], aad: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    if data.len() < AES_NONCE_LENGTH {
        return Err(EncryptionError::CiphertextTooShort);
    }
    let (nonce_bytes, ciphertext) = data.split_at(AES_NONCE_LENGTH);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptionError::DecryptFailed)?;

    cipher
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| EncryptionError::DecryptFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        key
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = test_key();
        let sealed = seal(&key, b"payload", b"aad").unwrap();
        assert_eq!(sealed.len(), AES_NONCE_LENGTH + 7 + AES_TAG_LENGTH);
        assert_eq!(open(&key, &sealed, b"aad").unwrap(), b"payload");
    }

    #[test]
    fn wrong_aad_fails() {
        let key = test_key();
        let sealed = seal(&key, b"payload", b"right").unwrap();
        assert_eq!(
            open(&key, &sealed, b"wrong"),
            Err(EncryptionError::DecryptFailed)
        );
    }

    #[test]
    fn recipient_can_decrypt() {
        let recipient = Keypair::from_seed(&[9u8; 32]);
        let sealed = encrypt_for(&recipient.public_key_bytes(), b"for your eyes only").unwrap();
        assert_eq!(
            sealed.len(),
            EPHEMERAL_KEY_LENGTH + AES_NONCE_LENGTH + 18 + AES_TAG_LENGTH
        );
        assert_eq!(decrypt_with(&recipient, &sealed).unwrap(), b"for your eyes only");
    }

    #[test]
    fn other_account_cannot_decrypt() {
        let recipient = Keypair::generate();
        let eavesdropper = Keypair::generate();
        let sealed = encrypt_for(&recipient.public_key_bytes(), b"secret").unwrap();
        assert_eq!(
            decrypt_with(&eavesdropper, &sealed),
            Err(EncryptionError::DecryptFailed)
        );
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let recipient = Keypair::generate();
        let mut sealed = encrypt_for(&recipient.public_key_bytes(), b"secret").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(decrypt_with(&recipient, &sealed).is_err());
    }

    #[test]
    fn ciphertexts_are_randomized() {
        let recipient = Keypair::generate();
        let a = encrypt_for(&recipient.public_key_bytes(), b"same").unwrap();
        let b = encrypt_for(&recipient.public_key_bytes(), b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn short_input_is_rejected() {
        let recipient = Keypair::generate();
        assert_eq!(
            decrypt_with(&recipient, &[0u8; 20]),
            Err(EncryptionError::CiphertextTooShort)
        );
    }

    #[test]
    fn invalid_recipient_key_is_rejected() {
        assert!(matches!(
            encrypt_for(&[1u8; 10], b"x"),
            Err(EncryptionError::Key(_))
        ));
    }
}
