//! # Transaction Module
//!
//! Construction, binary and JSON projection, signing and proof
//! verification for ledger transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs         Type tags, transfer entries, sponsor record, TxData
//! builder.rs       Transaction, Payload, TransactionBuilder, JSON, dispatch
//! association.rs   Association payload and its v1/v3 layouts
//! mass_transfer.rs MassTransfer payload, its v1/v3 layouts, derived fee
//! signing.rs       sign_with / sponsor_with
//! verification.rs  TransactionError and proof verification
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: [`TransactionBuilder`] assembles an unsigned transaction.
//! 2. **Sign**: [`Transaction::sign_with`] fills in sender and timestamp and
//!    appends the sender's proof.
//! 3. **Sponsor** (optional): [`Transaction::sponsor_with`] adds the proof
//!    of the account paying the fee.
//! 4. **Broadcast**: hand it to a [`crate::broadcast::Broadcaster`], which
//!    returns the transaction rebuilt from the node's reply, with `id` and
//!    `height` filled in.
//!
//! ## Design Decisions
//!
//! - The binary layout is selected strictly by `version`. An unknown
//!   version is an error, never a fallback.
//! - Transaction ids are `base58(blake2b256(body))`, the same value the
//!   node reports.
//! - All amounts and fees are `u64` in the smallest unit.

pub mod association;
pub mod builder;
pub mod mass_transfer;
pub mod signing;
pub mod types;
pub mod verification;

pub use association::Association;
pub use builder::{Payload, Transaction, TransactionBuilder};
pub use mass_transfer::{mass_transfer_fee, MassTransfer};
pub use types::{Sponsor, TransactionType, Transfer, TxData};
pub use verification::{verify_proofs, TransactionError};
