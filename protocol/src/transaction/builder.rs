//! Transaction construction and projection.
//!
//! A [`Transaction`] is one record of authorization fields (sender, fee,
//! timestamp, proofs, sponsor) shared by every type, plus a [`Payload`]
//! holding the variant-specific fields. Everything that depends on the
//! variant (`to_binary`, the JSON projection, parsing) dispatches on the
//! payload with a `match`, so adding a variant is a compile error until
//! every projection handles it.
//!
//! The [`TransactionBuilder`] sets defaults, checks construction-time
//! invariants and returns an unsigned transaction. It does not sign;
//! that happens in [`super::signing`].

use chrono::Utc;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::association::{self, Association};
use super::mass_transfer::{self, MassTransfer};
use super::types::{Sponsor, TransactionType, TxData};
use super::verification::TransactionError;
use crate::binary::{Binary, CodecError, FieldReader};
use crate::config::{DEFAULT_TX_FEE, DEFAULT_TX_VERSION, PUBLIC_KEY_LENGTH};
use crate::crypto::hash::blake2b256;
use crate::crypto::keys::KeyType;
use crate::identity::address::chain_id_of;

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// The variant-specific part of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Association(Association),
    MassTransfer(MassTransfer),
}

impl Payload {
    pub fn tx_type(&self) -> TransactionType {
        match self {
            Payload::Association(_) => TransactionType::Association,
            Payload::MassTransfer(_) => TransactionType::MassTransfer,
        }
    }

    /// Fee the variant charges on top of `base_fee`.
    pub fn fee_for(&self, base_fee: u64) -> Result<u64, TransactionError> {
        match self {
            Payload::Association(_) => Ok(base_fee),
            Payload::MassTransfer(m) => mass_transfer::mass_transfer_fee(base_fee, m.len()),
        }
    }

    /// Fails with `NotSignable` when a required payload field is missing.
    pub(super) fn ensure_signable(&self) -> Result<(), TransactionError> {
        match self {
            Payload::Association(a) => a.ensure_signable(),
            Payload::MassTransfer(m) => m.ensure_signable(),
        }
    }
}

impl From<Association> for Payload {
    fn from(a: Association) -> Self {
        Payload::Association(a)
    }
}

impl From<MassTransfer> for Payload {
    fn from(m: MassTransfer) -> Self {
        Payload::MassTransfer(m)
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A ledger transaction.
///
/// `id` and `height` are ledger-assigned: they are only present on
/// transactions reconstructed from node data. `proofs` holds base58
/// signatures in order: the sender's first, the sponsor's (if any) last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Selects the binary layout.
    pub version: u8,
    pub id: Option<String>,
    pub height: Option<u64>,

    /// Fee in the smallest currency unit.
    pub fee: u64,
    /// Milliseconds since the Unix epoch; set at signing time if absent.
    pub timestamp: Option<u64>,

    pub sender: Option<String>,
    pub sender_key_type: KeyType,
    pub sender_public_key: Option<Binary>,
    pub sponsor: Option<Sponsor>,
    pub proofs: Vec<String>,

    pub payload: Payload,
}

impl Transaction {
    /// An unsigned transaction with the default version and the variant's
    /// default fee.
    pub fn new(payload: impl Into<Payload>) -> Result<Self, TransactionError> {
        let payload = payload.into();
        Ok(Self {
            version: DEFAULT_TX_VERSION,
            id: None,
            height: None,
            fee: payload.fee_for(DEFAULT_TX_FEE)?,
            timestamp: None,
            sender: None,
            sender_key_type: KeyType::Ed25519,
            sender_public_key: None,
            sponsor: None,
            proofs: Vec::new(),
            payload,
        })
    }

    pub fn tx_type(&self) -> TransactionType {
        self.payload.tx_type()
    }

    /// `true` once at least one proof is attached.
    pub fn is_signed(&self) -> bool {
        !self.proofs.is_empty()
    }

    /// The network identifier, recovered from the sender address.
    pub fn chain_id(&self) -> Result<char, TransactionError> {
        let sender = self.sender.as_deref().ok_or(TransactionError::UnknownChain)?;
        Ok(chain_id_of(sender)?)
    }

    /// The unsigned binary body. Deterministic for a given version; proofs
    /// and sponsor fields are never part of it.
    pub fn to_binary(&self) -> Result<Vec<u8>, TransactionError> {
        match &self.payload {
            Payload::Association(a) => association::encode(self, a),
            Payload::MassTransfer(m) => mass_transfer::encode(self, m),
        }
    }

    /// The id a node assigns: `base58(blake2b256(to_binary()))`.
    pub fn compute_id(&self) -> Result<String, TransactionError> {
        Ok(bs58::encode(blake2b256(&self.to_binary()?)).into_string())
    }

    /// Parses an unsigned binary body.
    ///
    /// The sender address is derived from the public key and chain id when
    /// the layout carries a chain id. Trailing bytes are an error.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = FieldReader::new(bytes);
        let tag = reader.read_u8()?;
        let version = reader.read_u8()?;

        let tx = match TransactionType::from_tag(tag) {
            Some(TransactionType::Association) => association::decode(version, &mut reader)?,
            Some(TransactionType::MassTransfer) => mass_transfer::decode(version, &mut reader)?,
            None => return Err(TransactionError::UnknownType(tag)),
        };

        if !reader.is_empty() {
            return Err(TransactionError::TrailingBytes(reader.remaining()));
        }
        Ok(tx)
    }

    // -- JSON ---------------------------------------------------------------

    /// The JSON projection: wire names, fee and timestamp as integers,
    /// proofs as base58 strings, sponsor fields only when sponsored.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), self.tx_type().tag().into());
        map.insert("version".into(), self.version.into());
        if let Some(id) = &self.id {
            map.insert("id".into(), id.clone().into());
        }
        if let Some(sender) = &self.sender {
            map.insert("sender".into(), sender.clone().into());
        }
        map.insert("senderKeyType".into(), self.sender_key_type.to_string().into());
        if let Some(pk) = &self.sender_public_key {
            map.insert("senderPublicKey".into(), pk.to_base58().into());
        }
        map.insert("fee".into(), self.fee.into());
        if let Some(timestamp) = self.timestamp {
            map.insert("timestamp".into(), timestamp.into());
        }

        match &self.payload {
            Payload::Association(a) => a.write_json(self.version, &mut map),
            Payload::MassTransfer(m) => m.write_json(&mut map),
        }

        map.insert(
            "proofs".into(),
            Value::Array(self.proofs.iter().cloned().map(Value::from).collect()),
        );
        if let Some(sponsor) = &self.sponsor {
            map.insert("sponsor".into(), sponsor.address.clone().into());
            map.insert("sponsorKeyType".into(), sponsor.key_type.to_string().into());
            map.insert("sponsorPublicKey".into(), sponsor.public_key.to_base58().into());
        }
        if let Some(height) = self.height {
            map.insert("height".into(), height.into());
        }
        Value::Object(map)
    }

    /// Builds a transaction from a parsed record, dispatching on `type`.
    pub fn from_data(data: &TxData) -> Result<Self, TransactionError> {
        let tag = data.tx_type.ok_or(TransactionError::MissingField("type"))?;
        let payload: Payload = match TransactionType::from_tag(tag) {
            Some(TransactionType::Association) => Association::from_data(data)?.into(),
            Some(TransactionType::MassTransfer) => MassTransfer::from_data(data)?.into(),
            None => return Err(TransactionError::UnknownType(tag)),
        };

        let mut tx = Self::new(payload)?;
        tx.init_from(data)?;
        Ok(tx)
    }

    pub fn from_json(json: &str) -> Result<Self, TransactionError> {
        let data: TxData = serde_json::from_str(json)?;
        Self::from_data(&data)
    }

    /// Copies ledger-assigned and authorization fields from `data`.
    ///
    /// Missing optional fields take the documented defaults; a fee absent
    /// from `data` keeps the value already on `self`.
    pub fn init_from(&mut self, data: &TxData) -> Result<&mut Self, TransactionError> {
        let sender_public_key = data
            .sender_public_key
            .as_deref()
            .map(Binary::from_base58)
            .transpose()?;

        let sponsor = match &data.sponsor_public_key {
            Some(pk) => Some(Sponsor {
                address: data
                    .sponsor
                    .clone()
                    .ok_or(TransactionError::MissingField("sponsor"))?,
                key_type: data.sponsor_key_type.unwrap_or_default(),
                public_key: Binary::from_base58(pk)?,
            }),
            None => None,
        };

        self.version = data.version.unwrap_or(DEFAULT_TX_VERSION);
        self.id = data.id.clone();
        self.height = data.height;
        if let Some(fee) = data.effective_fee() {
            self.fee = fee;
        }
        self.timestamp = data.timestamp;
        self.sender = data.sender.clone();
        self.sender_key_type = data.sender_key_type.unwrap_or_default();
        self.sender_public_key = sender_public_key;
        self.sponsor = sponsor;
        self.proofs = data.proofs.clone();
        Ok(self)
    }

    // -- Encoding helpers shared by the variant layouts -----------------------

    pub(super) fn chain_byte(&self) -> Result<u8, TransactionError> {
        // Addresses only carry ASCII chain ids.
        Ok(self.chain_id()? as u8)
    }

    pub(super) fn public_key_field(&self) -> Result<&[u8], TransactionError> {
        let pk = self
            .sender_public_key
            .as_ref()
            .ok_or(TransactionError::MissingField("senderPublicKey"))?;
        if pk.len() != PUBLIC_KEY_LENGTH {
            return Err(CodecError::InvalidLength {
                field: "senderPublicKey",
                expected: PUBLIC_KEY_LENGTH,
                got: pk.len(),
            }
            .into());
        }
        Ok(pk.as_slice())
    }

    pub(super) fn timestamp_field(&self) -> Result<u64, TransactionError> {
        self.timestamp.ok_or(TransactionError::MissingField("timestamp"))
    }

    pub(super) fn unsupported_version(&self) -> TransactionError {
        TransactionError::UnsupportedVersion {
            tx_type: self.tx_type().tag(),
            version: self.version,
        }
    }
}

impl Serialize for Transaction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`Transaction`]s.
///
/// # Usage
///
/// ```rust
/// use lto_protocol::transaction::{Association, TransactionBuilder};
///
/// let tx = TransactionBuilder::new(Association::new("3MueedSU6V6k9KMg88YXmnSpdc3YxHd1y4J", 1))
///     .version(3)
///     .build()
///     .unwrap();
/// assert!(!tx.is_signed());
/// ```
///
/// Defaults: `version` 3, base fee 100_000_000 (a mass transfer adds a
/// tenth of it per entry), timestamp left for signing to fill in.
pub struct TransactionBuilder {
    payload: Payload,
    version: u8,
    base_fee: u64,
    timestamp: Option<u64>,
}

impl TransactionBuilder {
    pub fn new(payload: impl Into<Payload>) -> Self {
        Self {
            payload: payload.into(),
            version: DEFAULT_TX_VERSION,
            base_fee: DEFAULT_TX_FEE,
            timestamp: None,
        }
    }

    /// Selects the binary layout.
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Base fee the variant's fee is derived from.
    pub fn base_fee(mut self, base_fee: u64) -> Self {
        self.base_fee = base_fee;
        self
    }

    /// Sets the timestamp explicitly (Unix milliseconds).
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Consumes the builder and produces an unsigned [`Transaction`].
    ///
    /// Fails with `InvalidExpiration` for an association whose expiration
    /// is set and already in the past.
    pub fn build(self) -> Result<Transaction, TransactionError> {
        if let Payload::Association(a) = &self.payload {
            let now = Utc::now().timestamp_millis().max(0) as u64;
            a.check_expiration(now)?;
        }

        let mut tx = Transaction::new(self.payload)?;
        tx.version = self.version;
        tx.fee = tx.payload.fee_for(self.base_fee)?;
        tx.timestamp = self.timestamp;
        Ok(tx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
