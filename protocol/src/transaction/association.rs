//! Association transactions (type 16).
//!
//! Records a typed relationship from the sender to a recipient account,
//! optionally carrying an anchor hash and an expiration.
//!
//! # Binary layouts
//!
//! ```text
//! v1: type(1) version(1) chain_id(1) sender_public_key(32) recipient(26)
//!     association_type(4) anchor_flag(1) [anchor_len(2) anchor] timestamp(8) fee(8)
//!
//! v3: type(1) version(1) chain_id(1) timestamp(8) key_type(1) sender_public_key(32)
//!     fee(8) recipient(26) association_type(4) expires(8) anchor_len(2) anchor
//! ```
//!
//! Version 1 has no expiration and writes the anchor only when it is
//! non-empty, behind a presence flag. An expiration of zero in v3 means
//! "never".

use serde_json::{Map, Value};

use super::builder::Transaction;
use super::types::TxData;
use super::verification::TransactionError;
use crate::binary::codec::{long_to_bytes, put_length_prefixed};
use crate::binary::{Binary, CodecError, FieldReader};
use crate::config::{ADDRESS_LENGTH, ASSOCIATION_TX_TYPE};
use crate::crypto::keys::KeyType;
use crate::identity::address::{check_address_bytes, decode_address, derive_address};

/// Payload of an association transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    /// Base58 address of the associated account.
    pub recipient: String,
    /// Application-defined relationship code.
    pub association_type: u32,
    /// Optional anchor (typically a hash); empty when absent.
    pub anchor: Binary,
    /// Expiration in Unix milliseconds. Version 3 only.
    pub expires: Option<u64>,
}

impl Association {
    pub fn new(recipient: impl Into<String>, association_type: u32) -> Self {
        Self {
            recipient: recipient.into(),
            association_type,
            anchor: Binary::new(),
            expires: None,
        }
    }

    pub fn with_anchor(mut self, anchor: impl Into<Binary>) -> Self {
        self.anchor = anchor.into();
        self
    }

    pub fn with_expires(mut self, expires: u64) -> Self {
        self.expires = Some(expires).filter(|&e| e != 0);
        self
    }

    pub(super) fn check_expiration(&self, now: u64) -> Result<(), TransactionError> {
        match self.expires {
            Some(expires) if expires < now => {
                Err(TransactionError::InvalidExpiration { expires, now })
            }
            _ => Ok(()),
        }
    }

    pub(super) fn ensure_signable(&self) -> Result<(), TransactionError> {
        if self.recipient.is_empty() {
            return Err(TransactionError::NotSignable("association has no recipient".into()));
        }
        Ok(())
    }

    pub(super) fn write_json(&self, version: u8, map: &mut Map<String, Value>) {
        map.insert("recipient".into(), self.recipient.clone().into());
        map.insert("associationType".into(), self.association_type.into());
        // v1 has no expiry field; v3 writes "none" as 0, like the binary layout
        let expires = match version {
            1 => Value::Null,
            _ => self.expires.unwrap_or(0).into(),
        };
        map.insert("expires".into(), expires);
        map.insert("hash".into(), self.anchor.to_base58().into());
    }

    pub(super) fn from_data(data: &TxData) -> Result<Self, TransactionError> {
        let recipient = data
            .recipient
            .clone()
            .ok_or(TransactionError::MissingField("recipient"))?;
        let association_type = data
            .association_type
            .ok_or(TransactionError::MissingField("associationType"))?;
        let anchor = match data.hash.as_deref().or(data.anchor.as_deref()) {
            Some(encoded) => Binary::from_base58(encoded)?,
            None => Binary::new(),
        };

        let mut association = Self::new(recipient, association_type).with_anchor(anchor);
        if let Some(expires) = data.expires {
            association = association.with_expires(expires);
        }
        Ok(association)
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub(super) fn encode(tx: &Transaction, body: &Association) -> Result<Vec<u8>, TransactionError> {
    match tx.version {
        1 => encode_v1(tx, body),
        3 => encode_v3(tx, body),
        _ => Err(tx.unsupported_version()),
    }
}

fn encode_v1(tx: &Transaction, body: &Association) -> Result<Vec<u8>, TransactionError> {
    let mut buf = Vec::with_capacity(96 + body.anchor.len());
    buf.push(tx.tx_type().tag());
    buf.push(1);
    buf.push(tx.chain_byte()?);
    buf.extend_from_slice(tx.public_key_field()?);
    buf.extend_from_slice(&decode_address(&body.recipient)?);
    buf.extend_from_slice(&body.association_type.to_be_bytes());
    if body.anchor.is_empty() {
        buf.push(0);
    } else {
        buf.push(1);
        put_length_prefixed(&mut buf, &body.anchor)?;
    }
    buf.extend_from_slice(&long_to_bytes(tx.timestamp_field()?));
    buf.extend_from_slice(&long_to_bytes(tx.fee));
    Ok(buf)
}

fn encode_v3(tx: &Transaction, body: &Association) -> Result<Vec<u8>, TransactionError> {
    let mut buf = Vec::with_capacity(100 + body.anchor.len());
    buf.push(tx.tx_type().tag());
    buf.push(3);
    buf.push(tx.chain_byte()?);
    buf.extend_from_slice(&long_to_bytes(tx.timestamp_field()?));
    buf.push(tx.sender_key_type.id());
    buf.extend_from_slice(tx.public_key_field()?);
    buf.extend_from_slice(&long_to_bytes(tx.fee));
    buf.extend_from_slice(&decode_address(&body.recipient)?);
    buf.extend_from_slice(&body.association_type.to_be_bytes());
    buf.extend_from_slice(&long_to_bytes(body.expires.unwrap_or(0)));
    put_length_prefixed(&mut buf, &body.anchor)?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Parses the fields after `type` and `version`.
pub(super) fn decode(version: u8, reader: &mut FieldReader<'_>) -> Result<Transaction, TransactionError> {
    match version {
        1 => decode_v1(reader),
        3 => decode_v3(reader),
        _ => Err(TransactionError::UnsupportedVersion {
            tx_type: ASSOCIATION_TX_TYPE,
            version,
        }),
    }
}

fn decode_v1(reader: &mut FieldReader<'_>) -> Result<Transaction, TransactionError> {
    let chain_id = reader.read_u8()? as char;
    let public_key: [u8; 32] = reader.read_array()?;
    let recipient = read_recipient(reader)?;
    let association_type = reader.read_u32()?;
    let anchor = match reader.read_u8()? {
        0 => Binary::new(),
        1 => Binary::from(reader.read_length_prefixed()?),
        other => {
            return Err(CodecError::decode("association", format!("invalid anchor flag {other}")).into())
        }
    };
    let timestamp = reader.read_u64()?;
    let fee = reader.read_u64()?;

    let body = Association::new(recipient, association_type).with_anchor(anchor);
    assemble(1, body, chain_id, KeyType::Ed25519, public_key, timestamp, fee)
}

fn decode_v3(reader: &mut FieldReader<'_>) -> Result<Transaction, TransactionError> {
    let chain_id = reader.read_u8()? as char;
    let timestamp = reader.read_u64()?;
    let key_type = KeyType::from_id(reader.read_u8()?)?;
    let public_key: [u8; 32] = reader.read_array()?;
    let fee = reader.read_u64()?;
    let recipient = read_recipient(reader)?;
    let association_type = reader.read_u32()?;
    let expires = reader.read_u64()?;
    let anchor = Binary::from(reader.read_length_prefixed()?);

    let body = Association::new(recipient, association_type)
        .with_anchor(anchor)
        .with_expires(expires);
    assemble(3, body, chain_id, key_type, public_key, timestamp, fee)
}

pub(super) fn read_recipient(reader: &mut FieldReader<'_>) -> Result<String, TransactionError> {
    let raw = check_address_bytes(reader.read_bytes(ADDRESS_LENGTH)?)?;
    Ok(bs58::encode(raw).into_string())
}

fn assemble(
    version: u8,
    body: Association,
    chain_id: char,
    key_type: KeyType,
    public_key: [u8; 32],
    timestamp: u64,
    fee: u64,
) -> Result<Transaction, TransactionError> {
    let mut tx = Transaction::new(body)?;
    tx.version = version;
    tx.sender = Some(derive_address(&public_key, chain_id)?);
    tx.sender_key_type = key_type;
    tx.sender_public_key = Some(Binary::from(public_key));
    tx.timestamp = Some(timestamp);
    tx.fee = fee;
    Ok(tx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
