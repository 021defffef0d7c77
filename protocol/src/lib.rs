// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # LTO Protocol: Codec & Signing Core
//!
//! How LTO Network transactions and peer-to-peer messages become bytes,
//! get signed, and come back again.
//!
//! Every encoding here is consensus-relevant: a node recomputes the same
//! bytes from the JSON it receives and checks the proofs against them, so
//! the layouts are byte-exact and selected strictly by version.
//!
//! ## Architecture
//!
//! - **binary**: the [`binary::Binary`] byte buffer and the length-prefixed
//!   field codec every layout is built from.
//! - **config**: type tags, widths, default fees and versions, networks.
//! - **crypto**: hashes, ed25519 keys, the `Signer`/`Verifier` and
//!   `Encrypter`/`Decrypter` capabilities.
//! - **identity**: address derivation and the [`identity::Account`] that
//!   implements those capabilities.
//! - **transaction**: the association and mass-transfer transactions, their
//!   binary/JSON projections, signing and sponsorship.
//! - **message**: the signed, optionally encrypted message envelope.
//! - **broadcast**: the `Broadcaster` seam and an in-memory node.
//! - **logging**: `tracing` subscriber bootstrap for binaries and tests.
//!
//! ## Example
//!
//! ```rust
//! use lto_protocol::crypto::Signer;
//! use lto_protocol::identity::Account;
//! use lto_protocol::transaction::{verify_proofs, MassTransfer, TransactionBuilder, Transfer};
//!
//! let alice = Account::from_seed(&[1u8; 32], 'T').unwrap();
//! let bob = Account::from_seed(&[2u8; 32], 'T').unwrap();
//!
//! let transfers = vec![Transfer::new(Signer::address(&bob), 500)];
//! let mut tx = TransactionBuilder::new(MassTransfer::new(transfers).unwrap())
//!     .build()
//!     .unwrap();
//! tx.sign_with(&alice).unwrap();
//!
//! assert!(verify_proofs(&tx).unwrap());
//! ```

pub mod binary;
pub mod broadcast;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod logging;
pub mod message;
pub mod transaction;
