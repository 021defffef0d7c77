//! Accounts: a keypair bound to a network.
//!
//! [`Account`] is the full capability set the codec consumes: it signs as
//! a [`Signer`], accepts ciphertext as an [`Encrypter`] target and opens it
//! as a [`Decrypter`]. [`PublicAccount`] is the other side of the
//! conversation, known only by its public key.

use std::fmt;

use super::address::{derive_address, AddressError};
use crate::binary::Binary;
use crate::config::MAINNET_CHAIN_ID;
use crate::crypto::encryption::{self, Decrypter, EncryptionError, Encrypter};
use crate::crypto::keys::{KeyError, KeyType, Keypair};
use crate::crypto::signatures::{self, Signer};

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// An ed25519 keypair plus the chain it lives on.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    keypair: Keypair,
    chain_id: char,
    address: String,
}

impl Account {
    pub fn new(keypair: Keypair, chain_id: char) -> Result<Self, AddressError> {
        let address = derive_address(&keypair.public_key_bytes(), chain_id)?;
        Ok(Self {
            keypair,
            chain_id,
            address,
        })
    }

    /// A fresh random account on `chain_id`.
    pub fn generate(chain_id: char) -> Result<Self, AddressError> {
        Self::new(Keypair::generate(), chain_id)
    }

    /// A deterministic account from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32], chain_id: char) -> Result<Self, AddressError> {
        Self::new(Keypair::from_seed(seed), chain_id)
    }

    /// Mainnet account from a seed; mostly a test convenience.
    pub fn mainnet_from_seed(seed: &[u8; 32]) -> Result<Self, AddressError> {
        Self::from_seed(seed, MAINNET_CHAIN_ID)
    }

    pub fn chain_id(&self) -> char {
        self.chain_id
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// The shareable half of this account.
    pub fn public_account(&self) -> PublicAccount {
        PublicAccount {
            address: self.address.clone(),
            key_type: KeyType::Ed25519,
            public_key: self.keypair.public_key(),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl Signer for Account {
    fn address(&self) -> &str {
        &self.address
    }

    fn key_type(&self) -> KeyType {
        KeyType::Ed25519
    }

    fn public_key(&self) -> Binary {
        self.keypair.public_key()
    }

    fn sign(&self, message: &[u8]) -> Binary {
        self.keypair.sign(message)
    }
}

impl Encrypter for Account {
    fn address(&self) -> &str {
        &self.address
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        encryption::encrypt_for(&self.keypair.public_key_bytes(), plaintext)
    }
}

impl Decrypter for Account {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        encryption::decrypt_with(&self.keypair, ciphertext)
    }
}

// ---------------------------------------------------------------------------
// PublicAccount
// ---------------------------------------------------------------------------

/// A counterparty known by public key: can be encrypted to and can have
/// its signatures checked, nothing more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicAccount {
    address: String,
    key_type: KeyType,
    public_key: Binary,
}

#[derive(Debug, thiserror::Error)]
pub enum PublicAccountError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Address(#[from] AddressError),
}

impl PublicAccount {
    pub fn new(
        key_type: KeyType,
        public_key: impl Into<Binary>,
        chain_id: char,
    ) -> Result<Self, PublicAccountError> {
        let public_key = public_key.into();
        // Rejects keys of unsupported schemes up front.
        signatures::verifier_for(key_type)?;
        let address = derive_address(&public_key, chain_id)?;
        Ok(Self {
            address,
            key_type,
            public_key,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn public_key(&self) -> &Binary {
        &self.public_key
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, KeyError> {
        signatures::verify(self.key_type, &self.public_key, message, signature)
    }
}

impl Encrypter for PublicAccount {
    fn address(&self) -> &str {
        &self.address
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        encryption::encrypt_for(&self.public_key, plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::address::chain_id_of;

    #[test]
    fn address_matches_chain() {
        let acc = Account::from_seed(&[1u8; 32], 'T').unwrap();
        assert_eq!(chain_id_of(Signer::address(&acc)).unwrap(), 'T');
        assert_eq!(acc.chain_id(), 'T');
    }

    #[test]
    fn public_account_agrees_with_account() {
        let acc = Account::mainnet_from_seed(&[2u8; 32]).unwrap();
        let public = acc.public_account();
        let rebuilt = PublicAccount::new(KeyType::Ed25519, acc.keypair().public_key(), 'L').unwrap();
        assert_eq!(public, rebuilt);
        assert_eq!(public.address(), Signer::address(&acc));
    }

    #[test]
    fn public_account_verifies_signatures() {
        let acc = Account::generate('L').unwrap();
        let sig = Signer::sign(&acc, b"payload");
        let public = acc.public_account();
        assert!(public.verify(b"payload", &sig).unwrap());
        assert!(!public.verify(b"tampered", &sig).unwrap());
    }

    #[test]
    fn encrypt_to_public_account_decrypt_with_account() {
        let acc = Account::generate('L').unwrap();
        let sealed = acc.public_account().encrypt(b"hello").unwrap();
        assert_eq!(acc.decrypt(&sealed).unwrap(), b"hello");
    }

    #[test]
    fn unsupported_key_type_is_rejected() {
        assert!(matches!(
            PublicAccount::new(KeyType::Secp256k1, vec![2u8; 33], 'L'),
            Err(PublicAccountError::Key(KeyError::UnsupportedKeyType(_)))
        ));
    }

    #[test]
    fn debug_hides_key_material() {
        let acc = Account::generate('L').unwrap();
        let dbg = format!("{:?}", acc);
        assert!(dbg.contains(Signer::address(&acc)));
        assert!(!dbg.contains(&hex::encode(acc.keypair().secret_key_bytes())));
    }
}
