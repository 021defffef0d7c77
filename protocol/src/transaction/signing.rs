//! Transaction signing and sponsorship.
//!
//! Signing is a separate step from building because the signer may not be
//! available at construction time (hardware wallet, remote signer). Both
//! operations sign the unsigned body from [`Transaction::to_binary`], so a
//! sponsor signs exactly what the sender signed.
//!
//! Sponsorship is explicit: the caller signs with the sender, then calls
//! [`Transaction::sponsor_with`] if someone else pays. Nothing is inferred
//! from the signer.
//!
//! Both operations work on a staged copy and commit it only after the
//! encoding and the signer call succeed, so a failure leaves the
//! transaction exactly as it was.

use chrono::Utc;
use tracing::debug;

use super::builder::Transaction;
use super::types::Sponsor;
use super::verification::TransactionError;
use crate::crypto::signatures::Signer;
use crate::identity::address::{chain_id_of, derive_address};

impl Transaction {
    /// Signs the transaction as (or on behalf of) the sender.
    ///
    /// 1. Sets `timestamp` to now if it is unset.
    /// 2. Takes the sender identity from `signer` if neither sender nor
    ///    sender key is set. A sender key without an address (decoded v1
    ///    mass transfers) gets its address derived on `signer`'s chain.
    /// 3. Signs `to_binary()` and adds the base58 signature, unless the
    ///    exact same proof is already present. On a sponsored transaction
    ///    the new proof goes before the sponsor's.
    ///
    /// Fails with `NotSignable` if the payload is incomplete, and with
    /// `SignerMismatch` if the first proof would not come from the sender
    /// key.
    ///
    /// # Example
    ///
    /// ```rust
    /// use lto_protocol::identity::Account;
    /// use lto_protocol::transaction::{Association, TransactionBuilder};
    ///
    /// let sender = Account::from_seed(&[1u8; 32], 'T').unwrap();
    /// let mut tx = TransactionBuilder::new(Association::new("3MueedSU6V6k9KMg88YXmnSpdc3YxHd1y4J", 1))
    ///     .build()
    ///     .unwrap();
    ///
    /// tx.sign_with(&sender).unwrap();
    /// assert!(tx.is_signed());
    /// ```
    pub fn sign_with<S: Signer + ?Sized>(&mut self, signer: &S) -> Result<&mut Self, TransactionError> {
        self.payload.ensure_signable()?;

        let mut staged = self.clone();
        if staged.timestamp.is_none() {
            staged.timestamp = Some(Utc::now().timestamp_millis().max(0) as u64);
        }
        match &staged.sender_public_key {
            None if staged.sender.is_none() => {
                staged.sender = Some(signer.address().to_string());
                staged.sender_key_type = signer.key_type();
                staged.sender_public_key = Some(signer.public_key());
            }
            Some(key) => {
                if staged.proofs.is_empty() && *key != signer.public_key() {
                    return Err(TransactionError::SignerMismatch(signer.address().to_string()));
                }
                if staged.sender.is_none() {
                    let chain_id = chain_id_of(signer.address())?;
                    staged.sender = Some(derive_address(key, chain_id)?);
                }
            }
            None => {}
        }

        let body = staged.to_binary()?;
        let proof = signer.sign(&body).to_base58();
        if !staged.proofs.contains(&proof) {
            // the sponsor's proof stays last
            let at = if staged.sponsor.is_some() {
                staged.proofs.len().saturating_sub(1)
            } else {
                staged.proofs.len()
            };
            staged.proofs.insert(at, proof);
        }

        debug!(
            tx_type = %staged.tx_type(),
            signer = signer.address(),
            proofs = staged.proofs.len(),
            "transaction signed"
        );
        *self = staged;
        Ok(self)
    }

    /// Adds (or replaces) the sponsor's proof.
    ///
    /// Fails with `UnsignedTransaction` if the sender has not signed yet.
    /// When a sponsor is already set, its proof (the last one) is dropped
    /// first, so at most one sponsor proof exists at any time.
    pub fn sponsor_with<S: Signer + ?Sized>(
        &mut self,
        sponsor: &S,
    ) -> Result<&mut Self, TransactionError> {
        if !self.is_signed() {
            return Err(TransactionError::UnsignedTransaction);
        }

        let mut staged = self.clone();
        if staged.sponsor.is_some() {
            staged.proofs.pop();
        }

        let body = staged.to_binary()?;
        let proof = sponsor.sign(&body).to_base58();
        staged.sponsor = Some(Sponsor {
            address: sponsor.address().to_string(),
            key_type: sponsor.key_type(),
            public_key: sponsor.public_key(),
        });
        staged.proofs.push(proof);

        debug!(
            tx_type = %staged.tx_type(),
            sponsor = sponsor.address(),
            proofs = staged.proofs.len(),
            "transaction sponsored"
        );
        *self = staged;
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Account;
    use crate::transaction::types::Transfer;
    use crate::transaction::{Association, MassTransfer, Payload, TransactionBuilder};

    fn account(seed: u8) -> Account {
        Account::from_seed(&[seed; 32], 'T').unwrap()
    }

    fn unsigned() -> Transaction {
        TransactionBuilder::new(Association::new(Signer::address(&account(9)), 7))
            .build()
            .unwrap()
    }

    #[test]
    fn sign_populates_sender_and_timestamp() {
        let sender = account(1);
        let mut tx = unsigned();
        let before = Utc::now().timestamp_millis() as u64;
        tx.sign_with(&sender).unwrap();

        assert!(tx.is_signed());
        assert_eq!(tx.sender.as_deref(), Some(Signer::address(&sender)));
        assert_eq!(tx.sender_public_key, Some(Signer::public_key(&sender)));
        assert!(tx.timestamp.unwrap() >= before);
        assert_eq!(tx.chain_id().unwrap(), 'T');
    }

    #[test]
    fn explicit_timestamp_is_kept() {
        let mut tx = unsigned();
        tx.timestamp = Some(1_600_000_000_000);
        tx.sign_with(&account(1)).unwrap();
        assert_eq!(tx.timestamp, Some(1_600_000_000_000));
    }

    #[test]
    fn signing_twice_is_idempotent() {
        let sender = account(1);
        let mut tx = unsigned();
        tx.sign_with(&sender).unwrap();
        tx.sign_with(&sender).unwrap();
        assert_eq!(tx.proofs.len(), 1);
    }

    #[test]
    fn second_signer_appends_but_keeps_sender() {
        let sender = account(1);
        let cosigner = account(2);
        let mut tx = unsigned();
        tx.sign_with(&sender).unwrap();
        tx.sign_with(&cosigner).unwrap();
        assert_eq!(tx.proofs.len(), 2);
        assert_eq!(tx.sender.as_deref(), Some(Signer::address(&sender)));
    }

    #[test]
    fn sponsor_requires_sender_proof() {
        let mut tx = unsigned();
        let before = tx.clone();
        assert!(matches!(
            tx.sponsor_with(&account(3)),
            Err(TransactionError::UnsignedTransaction)
        ));
        assert_eq!(tx, before);
    }

    #[test]
    fn sponsorship_replaces_never_stacks() {
        let mut tx = unsigned();
        tx.sign_with(&account(1)).unwrap();

        tx.sponsor_with(&account(3)).unwrap();
        assert_eq!(tx.proofs.len(), 2);
        let first_sponsor_proof = tx.proofs[1].clone();

        tx.sponsor_with(&account(4)).unwrap();
        assert_eq!(tx.proofs.len(), 2);
        assert_ne!(tx.proofs[1], first_sponsor_proof);
        assert_eq!(
            tx.sponsor.as_ref().map(|s| s.address.as_str()),
            Some(Signer::address(&account(4)))
        );
    }

    #[test]
    fn sponsor_fields_appear_in_json() {
        let mut tx = unsigned();
        tx.sign_with(&account(1)).unwrap();
        tx.sponsor_with(&account(3)).unwrap();
        let json = tx.to_json();
        assert_eq!(json["sponsor"], Signer::address(&account(3)));
        assert_eq!(json["sponsorKeyType"], "ed25519");
        assert_eq!(json["sponsorPublicKey"], Signer::public_key(&account(3)).to_base58());
    }

    #[test]
    fn not_signable_payload_leaves_tx_untouched() {
        let mut tx = TransactionBuilder::new(Association::new("", 1)).build().unwrap();
        let before = tx.clone();
        assert!(matches!(
            tx.sign_with(&account(1)),
            Err(TransactionError::NotSignable(_))
        ));
        assert_eq!(tx, before);

        let mut empty = TransactionBuilder::new(MassTransfer::new(Vec::<Transfer>::new()).unwrap())
            .build()
            .unwrap();
        assert!(matches!(
            empty.sign_with(&account(1)),
            Err(TransactionError::NotSignable(_))
        ));
    }

    #[test]
    fn failed_encoding_leaves_tx_untouched() {
        let mut tx = unsigned();
        tx.version = 9;
        let before = tx.clone();
        assert!(tx.sign_with(&account(1)).is_err());
        assert_eq!(tx, before);
        assert!(!tx.is_signed());
    }

    #[test]
    fn signs_through_a_trait_object() {
        let sender = account(1);
        let dyn_signer: &dyn Signer = &sender;
        let mut tx = unsigned();
        tx.sign_with(dyn_signer).unwrap();
        assert!(matches!(tx.payload, Payload::Association(_)));
        assert!(crate::transaction::verify_proofs(&tx).unwrap());
    }

    #[test]
    fn cosigning_a_sponsored_transaction_keeps_sponsor_last() {
        let mut tx = unsigned();
        tx.sign_with(&account(1)).unwrap();
        tx.sponsor_with(&account(3)).unwrap();
        let first_sponsor_proof = tx.proofs[1].clone();

        tx.sign_with(&account(2)).unwrap();
        assert_eq!(tx.proofs.len(), 3);
        assert_eq!(tx.proofs[2], first_sponsor_proof);
        assert!(crate::transaction::verify_proofs(&tx).unwrap());
        let cosigner_proof = tx.proofs[1].clone();

        tx.sponsor_with(&account(4)).unwrap();
        assert_eq!(tx.proofs.len(), 3);
        assert_eq!(tx.proofs[1], cosigner_proof);
        assert!(!tx.proofs.contains(&first_sponsor_proof));
        assert!(crate::transaction::verify_proofs(&tx).unwrap());
    }

    #[test]
    fn decoded_v1_mass_transfer_keeps_its_sender_key() {
        let alice = account(1);
        let transfer = Transfer::new(Signer::address(&account(9)), 10);
        let mut original = TransactionBuilder::new(MassTransfer::new(vec![transfer]).unwrap())
            .version(1)
            .timestamp(1_700_000_000_000)
            .build()
            .unwrap();
        original.sign_with(&alice).unwrap();
        let body = original.to_binary().unwrap();

        let mut decoded = Transaction::from_binary(&body).unwrap();
        assert_eq!(decoded.sender, None);
        let before = decoded.clone();
        assert!(matches!(
            decoded.sign_with(&account(2)),
            Err(TransactionError::SignerMismatch(_))
        ));
        assert_eq!(decoded, before);

        decoded.sign_with(&alice).unwrap();
        assert_eq!(decoded.sender.as_deref(), Some(Signer::address(&alice)));
        assert_eq!(decoded.sender_public_key, Some(Signer::public_key(&alice)));
        assert_eq!(decoded.to_binary().unwrap(), body);
        assert_eq!(decoded.proofs, original.proofs);
        assert!(crate::transaction::verify_proofs(&decoded).unwrap());
    }
}
