//! # Broadcasting
//!
//! The codec never talks to the network itself. It hands signed
//! transactions to a [`Broadcaster`] and gets back the transaction as the
//! node sees it, with ledger-assigned `id` and `height` filled in.
//!
//! [`MemoryNode`] is an in-process broadcaster for tests and offline
//! tooling. It accepts a transaction only if its proofs verify, stores the
//! JSON projection, and answers with a transaction rebuilt from that JSON,
//! the same round trip a remote node client performs.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::transaction::{verify_proofs, Transaction, TransactionError, TxData};

/// Errors returned by a [`Broadcaster`].
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// The node refused the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error("malformed node response: {0}")]
    Response(#[from] serde_json::Error),
}

/// Something that can publish transactions to a ledger.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Publishes a transaction for inclusion in the chain.
    async fn broadcast(&self, tx: &Transaction) -> Result<Transaction, BroadcastError>;

    /// Hands a transaction to the node's pending pool without waiting for
    /// inclusion. The returned transaction has an `id` but no `height`.
    async fn submit(&self, tx: &Transaction) -> Result<Transaction, BroadcastError>;
}

// ---------------------------------------------------------------------------
// MemoryNode
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Ledger {
    height: u64,
    confirmed: HashMap<String, Value>,
    pending: HashMap<String, Value>,
}

/// In-memory node. Every broadcast is its own block.
#[derive(Debug, Default)]
pub struct MemoryNode {
    ledger: RwLock<Ledger>,
}

impl MemoryNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current chain height (number of confirmed transactions).
    pub fn height(&self) -> u64 {
        self.ledger.read().height
    }

    /// A confirmed or pending transaction by id.
    pub fn get(&self, id: &str) -> Result<Option<Transaction>, BroadcastError> {
        let ledger = self.ledger.read();
        match ledger.confirmed.get(id).or_else(|| ledger.pending.get(id)) {
            Some(json) => Ok(Some(rebuild(json)?)),
            None => Ok(None),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.ledger.read().pending.len()
    }

    fn accept(&self, tx: &Transaction) -> Result<(String, Value), BroadcastError> {
        if !tx.is_signed() {
            return Err(BroadcastError::Rejected("transaction has no proofs".into()));
        }
        if !verify_proofs(tx)? {
            warn!(tx_type = %tx.tx_type(), "rejecting transaction with invalid proofs");
            return Err(BroadcastError::Rejected("invalid proof".into()));
        }
        let id = tx.compute_id()?;
        let mut json = tx.to_json();
        json["id"] = Value::String(id.clone());
        Ok((id, json))
    }
}

fn rebuild(json: &Value) -> Result<Transaction, BroadcastError> {
    let data: TxData = serde_json::from_value(json.clone())?;
    Ok(Transaction::from_data(&data)?)
}

#[async_trait]
impl Broadcaster for MemoryNode {
    async fn broadcast(&self, tx: &Transaction) -> Result<Transaction, BroadcastError> {
        let (id, mut json) = self.accept(tx)?;

        let mut ledger = self.ledger.write();
        if let Some(existing) = ledger.confirmed.get(&id) {
            return rebuild(existing);
        }
        ledger.pending.remove(&id);
        ledger.height += 1;
        json["height"] = ledger.height.into();
        ledger.confirmed.insert(id.clone(), json.clone());

        debug!(id = %id, height = ledger.height, "transaction confirmed");
        rebuild(&json)
    }

    async fn submit(&self, tx: &Transaction) -> Result<Transaction, BroadcastError> {
        let (id, json) = self.accept(tx)?;

        let mut ledger = self.ledger.write();
        if let Some(existing) = ledger.confirmed.get(&id) {
            return rebuild(existing);
        }
        ledger.pending.insert(id.clone(), json.clone());

        debug!(id = %id, pending = ledger.pending.len(), "transaction submitted");
        rebuild(&json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
