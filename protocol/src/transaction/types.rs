//! Core type definitions for transactions.
//!
//! These types form the vocabulary shared by every transaction variant:
//! the numeric type tag, batch transfer entries, the sponsor record and
//! the loose [`TxData`] record that node replies and JSON documents are
//! parsed into before a typed [`super::Transaction`] is constructed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::binary::Binary;
use crate::config::{ASSOCIATION_TX_TYPE, MASS_TRANSFER_TX_TYPE};
use crate::crypto::keys::KeyType;

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Discriminant for the operation a transaction represents.
///
/// The numeric tag is the first byte of every binary layout and the
/// `type` field of every JSON projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// Batch of (recipient, amount) transfers from one sender.
    MassTransfer,
    /// Typed, optionally anchored and expiring link between two accounts.
    Association,
}

impl TransactionType {
    pub fn tag(self) -> u8 {
        match self {
            Self::MassTransfer => MASS_TRANSFER_TX_TYPE,
            Self::Association => ASSOCIATION_TX_TYPE,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            MASS_TRANSFER_TX_TYPE => Some(Self::MassTransfer),
            ASSOCIATION_TX_TYPE => Some(Self::Association),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MassTransfer => write!(f, "MassTransfer"),
            Self::Association => write!(f, "Association"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transfer
// ---------------------------------------------------------------------------

/// One entry of a mass transfer.
///
/// `amount` is always an integer in the smallest unit; no floating point
/// anywhere near money.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Base58 recipient address.
    pub recipient: String,
    pub amount: u64,
}

impl Transfer {
    pub fn new(recipient: impl Into<String>, amount: u64) -> Self {
        Self {
            recipient: recipient.into(),
            amount,
        }
    }
}

// ---------------------------------------------------------------------------
// Sponsor
// ---------------------------------------------------------------------------

/// The account paying for someone else's transaction. Its proof is always
/// the last entry of the proof list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sponsor {
    pub address: String,
    pub key_type: KeyType,
    pub public_key: Binary,
}

// ---------------------------------------------------------------------------
// TxData
// ---------------------------------------------------------------------------

/// A transaction as found in JSON: every field optional, wire names in
/// camelCase.
///
/// Defaults applied when building a [`super::Transaction`] from it:
///
/// | field           | default                          |
/// |-----------------|----------------------------------|
/// | `version`       | 3                                |
/// | `senderKeyType` | `ed25519`                        |
/// | `fee`           | `txFee`, then the type's default |
/// | `proofs`        | empty                            |
/// | `expires`       | none                             |
/// | `hash`          | `anchor`, then empty             |
/// | `attachment`    | empty                            |
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxData {
    #[serde(rename = "type")]
    pub tx_type: Option<u8>,
    pub version: Option<u8>,
    pub id: Option<String>,
    pub height: Option<u64>,

    pub fee: Option<u64>,
    /// Legacy alias of `fee`.
    pub tx_fee: Option<u64>,
    pub timestamp: Option<u64>,

    pub sender: Option<String>,
    pub sender_key_type: Option<KeyType>,
    pub sender_public_key: Option<String>,

    pub sponsor: Option<String>,
    pub sponsor_key_type: Option<KeyType>,
    pub sponsor_public_key: Option<String>,

    #[serde(default)]
    pub proofs: Vec<String>,

    // Association
    pub recipient: Option<String>,
    pub association_type: Option<u32>,
    pub expires: Option<u64>,
    /// Base58 anchor.
    pub hash: Option<String>,
    /// Alias of `hash`.
    pub anchor: Option<String>,

    // MassTransfer
    pub transfers: Option<Vec<Transfer>>,
    /// Base58 attachment.
    pub attachment: Option<String>,
}

impl TxData {
    /// `fee` if present, else the legacy `txFee`.
    pub fn effective_fee(&self) -> Option<u64> {
        self.fee.or(self.tx_fee)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
