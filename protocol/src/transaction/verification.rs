//! Transaction errors and proof verification.
//!
//! [`verify_proofs`] re-derives the body bytes and checks the sender's
//! proof (always first) and, for sponsored transactions, the sponsor's
//! proof (always last). It says nothing about ledger state: balances,
//! association validity and fees are the node's business.

use thiserror::Error;

use super::builder::Transaction;
use crate::binary::{Binary, CodecError};
use crate::crypto::keys::KeyError;
use crate::crypto::signatures;
use crate::identity::AddressError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while building, encoding, signing or parsing a
/// transaction.
///
/// These are usage errors: the caller must fix the payload or the call
/// order. Nothing here is worth retrying.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// No binary layout exists for this version of this type.
    #[error("unsupported version {version} for transaction type {tx_type}")]
    UnsupportedVersion { tx_type: u8, version: u8 },

    #[error("unknown transaction type {0}")]
    UnknownType(u8),

    /// The payload is incomplete, so there is nothing meaningful to sign.
    #[error("transaction cannot be signed: {0}")]
    NotSignable(String),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// Sponsoring requires the sender's proof first.
    #[error("transaction must be signed by the sender first")]
    UnsignedTransaction,

    /// The first proof must come from the key recorded as sender.
    #[error("signer {0} does not hold the sender key")]
    SignerMismatch(String),

    /// The chain id lives in the sender address, which is not set yet.
    #[error("chain id unknown: sender is not set")]
    UnknownChain,

    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("expiration {expires} lies in the past (now {now})")]
    InvalidExpiration { expires: u64, now: u64 },

    #[error("fee overflows a 64-bit integer")]
    FeeOverflow,

    #[error("{0} unexpected bytes after the transaction body")]
    TrailingBytes(usize),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("invalid transaction JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Checks the cryptographic proofs of a signed transaction.
///
/// 1. **Sender**: the first proof must verify against the sender key.
/// 2. **Sponsor**: if a sponsor is set, the last proof must verify
///    against the sponsor key.
///
/// Returns `Ok(false)` for a proof that does not verify, and an error for
/// a transaction that is unsigned or cannot be encoded.
pub fn verify_proofs(tx: &Transaction) -> Result<bool, TransactionError> {
    let Some(first) = tx.proofs.first() else {
        return Err(TransactionError::UnsignedTransaction);
    };
    let body = tx.to_binary()?;
    let sender_key = tx
        .sender_public_key
        .as_ref()
        .ok_or(TransactionError::MissingField("senderPublicKey"))?;

    let sender_sig = Binary::from_base58(first)?;
    if !signatures::verify(tx.sender_key_type, sender_key, &body, &sender_sig)? {
        return Ok(false);
    }

    if let Some(sponsor) = &tx.sponsor {
        if tx.proofs.len() < 2 {
            return Ok(false);
        }
        let sponsor_sig = Binary::from_base58(&tx.proofs[tx.proofs.len() - 1])?;
        if !signatures::verify(sponsor.key_type, &sponsor.public_key, &body, &sponsor_sig)? {
            return Ok(false);
        }
    }

    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Account;
    use crate::transaction::{Association, TransactionBuilder};

    fn signed_tx() -> (Transaction, Account) {
        let sender = Account::from_seed(&[1u8; 32], 'T').unwrap();
        let recipient = Account::from_seed(&[2u8; 32], 'T').unwrap();
        let mut tx = TransactionBuilder::new(Association::new(
            crate::crypto::Signer::address(&recipient),
            1,
        ))
        .timestamp(1_700_000_000_000)
        .build()
        .unwrap();
        tx.sign_with(&sender).unwrap();
        (tx, sender)
    }

    #[test]
    fn valid_sender_proof() {
        let (tx, _) = signed_tx();
        assert!(verify_proofs(&tx).unwrap());
    }

    #[test]
    fn unsigned_is_an_error() {
        let (mut tx, _) = signed_tx();
        tx.proofs.clear();
        assert!(matches!(
            verify_proofs(&tx),
            Err(TransactionError::UnsignedTransaction)
        ));
    }

    #[test]
    fn tampered_body_fails() {
        let (mut tx, _) = signed_tx();
        tx.fee += 1;
        assert!(!verify_proofs(&tx).unwrap());
    }

    #[test]
    fn valid_sponsor_proof() {
        let (mut tx, _) = signed_tx();
        let sponsor = Account::from_seed(&[3u8; 32], 'T').unwrap();
        tx.sponsor_with(&sponsor).unwrap();
        assert!(verify_proofs(&tx).unwrap());
    }

    #[test]
    fn sponsor_without_its_proof_fails() {
        let (mut tx, _) = signed_tx();
        let sponsor = Account::from_seed(&[3u8; 32], 'T').unwrap();
        tx.sponsor_with(&sponsor).unwrap();
        tx.proofs.pop();
        assert!(!verify_proofs(&tx).unwrap());
    }

    #[test]
    fn garbage_proof_is_a_decode_error() {
        let (mut tx, _) = signed_tx();
        tx.proofs[0] = "0OIl".to_string();
        assert!(matches!(
            verify_proofs(&tx),
            Err(TransactionError::Codec(_))
        ));
    }
}
