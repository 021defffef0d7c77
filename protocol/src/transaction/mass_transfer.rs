//! Mass transfer transactions (type 11).
//!
//! One sender pays many recipients in a single transaction. The entries
//! are flattened into `recipient(26) || amount(8)` pairs once, at
//! construction, and the same blob is reused by every layout. Entries keep
//! their insertion order and are never deduplicated.
//!
//! # Binary layouts
//!
//! ```text
//! v1: type(1) version(1) sender_public_key(32) count(2) transfers
//!     timestamp(8) fee(8) attachment_len(2) attachment
//!
//! v3: type(1) version(1) chain_id(1) timestamp(8) key_type(1) sender_public_key(32)
//!     fee(8) count(2) transfers attachment_len(2) attachment
//! ```
//!
//! Version 1 carries no chain id, so a decoded v1 transaction has no
//! sender address.

use serde_json::{Map, Value};

use super::association::read_recipient;
use super::builder::Transaction;
use super::types::{Transfer, TxData};
use super::verification::TransactionError;
use crate::binary::codec::{long_to_bytes, put_length_prefixed};
use crate::binary::{Binary, CodecError, FieldReader};
use crate::config::{MASS_TRANSFER_FEE_DIVISOR, MASS_TRANSFER_TX_TYPE, TRANSFER_ENTRY_LENGTH};
use crate::crypto::keys::KeyType;
use crate::identity::address::{decode_address, derive_address};

/// `base_fee + round(count * base_fee / 10)`, rounding halves up.
pub fn mass_transfer_fee(base_fee: u64, count: usize) -> Result<u64, TransactionError> {
    let half = MASS_TRANSFER_FEE_DIVISOR / 2;
    (count as u64)
        .checked_mul(base_fee)
        .and_then(|scaled| scaled.checked_add(half))
        .map(|scaled| scaled / MASS_TRANSFER_FEE_DIVISOR)
        .and_then(|extra| extra.checked_add(base_fee))
        .ok_or(TransactionError::FeeOverflow)
}

/// Payload of a mass transfer transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MassTransfer {
    transfers: Vec<Transfer>,
    attachment: Binary,
    /// Flattened entries, kept in sync with `transfers`.
    transfer_data: Vec<u8>,
}

impl MassTransfer {
    /// Fails with `InvalidAddress` if any recipient does not parse.
    pub fn new(transfers: Vec<Transfer>) -> Result<Self, TransactionError> {
        let mut transfer_data = Vec::with_capacity(transfers.len() * TRANSFER_ENTRY_LENGTH);
        for transfer in &transfers {
            transfer_data.extend_from_slice(&decode_address(&transfer.recipient)?);
            transfer_data.extend_from_slice(&long_to_bytes(transfer.amount));
        }
        Ok(Self {
            transfers,
            attachment: Binary::new(),
            transfer_data,
        })
    }

    pub fn with_attachment(mut self, attachment: impl Into<Binary>) -> Self {
        self.attachment = attachment.into();
        self
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn attachment(&self) -> &Binary {
        &self.attachment
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Sum of all amounts.
    pub fn total_amount(&self) -> Option<u64> {
        self.transfers
            .iter()
            .try_fold(0u64, |acc, t| acc.checked_add(t.amount))
    }

    pub(super) fn ensure_signable(&self) -> Result<(), TransactionError> {
        if self.transfers.is_empty() {
            return Err(TransactionError::NotSignable("mass transfer has no transfers".into()));
        }
        Ok(())
    }

    pub(super) fn write_json(&self, map: &mut Map<String, Value>) {
        map.insert("attachment".into(), self.attachment.to_base58().into());
        let transfers = self
            .transfers
            .iter()
            .map(|t| serde_json::json!({ "recipient": t.recipient, "amount": t.amount }))
            .collect();
        map.insert("transfers".into(), Value::Array(transfers));
    }

    pub(super) fn from_data(data: &TxData) -> Result<Self, TransactionError> {
        let transfers = data
            .transfers
            .clone()
            .ok_or(TransactionError::MissingField("transfers"))?;
        let attachment = match data.attachment.as_deref() {
            Some(encoded) => Binary::from_base58(encoded)?,
            None => Binary::new(),
        };
        Ok(Self::new(transfers)?.with_attachment(attachment))
    }

    fn count_field(&self) -> Result<[u8; 2], TransactionError> {
        let count = u16::try_from(self.transfers.len()).map_err(|_| CodecError::Overflow {
            value: self.transfers.len() as u64,
            width: 2,
        })?;
        Ok(count.to_be_bytes())
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub(super) fn encode(tx: &Transaction, body: &MassTransfer) -> Result<Vec<u8>, TransactionError> {
    match tx.version {
        1 => encode_v1(tx, body),
        3 => encode_v3(tx, body),
        _ => Err(tx.unsupported_version()),
    }
}

fn encode_v1(tx: &Transaction, body: &MassTransfer) -> Result<Vec<u8>, TransactionError> {
    let mut buf = Vec::with_capacity(56 + body.transfer_data.len() + body.attachment.len());
    buf.push(tx.tx_type().tag());
    buf.push(1);
    buf.extend_from_slice(tx.public_key_field()?);
    buf.extend_from_slice(&body.count_field()?);
    buf.extend_from_slice(&body.transfer_data);
    buf.extend_from_slice(&long_to_bytes(tx.timestamp_field()?));
    buf.extend_from_slice(&long_to_bytes(tx.fee));
    put_length_prefixed(&mut buf, &body.attachment)?;
    Ok(buf)
}

fn encode_v3(tx: &Transaction, body: &MassTransfer) -> Result<Vec<u8>, TransactionError> {
    let mut buf = Vec::with_capacity(58 + body.transfer_data.len() + body.attachment.len());
    buf.push(tx.tx_type().tag());
    buf.push(3);
    buf.push(tx.chain_byte()?);
    buf.extend_from_slice(&long_to_bytes(tx.timestamp_field()?));
    buf.push(tx.sender_key_type.id());
    buf.extend_from_slice(tx.public_key_field()?);
    buf.extend_from_slice(&long_to_bytes(tx.fee));
    buf.extend_from_slice(&body.count_field()?);
    buf.extend_from_slice(&body.transfer_data);
    put_length_prefixed(&mut buf, &body.attachment)?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Parses the fields after `type` and `version`.
pub(super) fn decode(version: u8, reader: &mut FieldReader<'_>) -> Result<Transaction, TransactionError> {
    match version {
        1 => {
            let public_key: [u8; 32] = reader.read_array()?;
            let transfers = read_transfers(reader)?;
            let timestamp = reader.read_u64()?;
            let fee = reader.read_u64()?;
            let attachment = Binary::from(reader.read_length_prefixed()?);

            let mut tx = Transaction::new(MassTransfer::new(transfers)?.with_attachment(attachment))?;
            tx.version = 1;
            tx.sender_public_key = Some(Binary::from(public_key));
            tx.timestamp = Some(timestamp);
            tx.fee = fee;
            Ok(tx)
        }
        3 => {
            let chain_id = reader.read_u8()? as char;
            let timestamp = reader.read_u64()?;
            let key_type = KeyType::from_id(reader.read_u8()?)?;
            let public_key: [u8; 32] = reader.read_array()?;
            let fee = reader.read_u64()?;
            let transfers = read_transfers(reader)?;
            let attachment = Binary::from(reader.read_length_prefixed()?);

            let mut tx = Transaction::new(MassTransfer::new(transfers)?.with_attachment(attachment))?;
            tx.version = 3;
            tx.sender = Some(derive_address(&public_key, chain_id)?);
            tx.sender_key_type = key_type;
            tx.sender_public_key = Some(Binary::from(public_key));
            tx.timestamp = Some(timestamp);
            tx.fee = fee;
            Ok(tx)
        }
        _ => Err(TransactionError::UnsupportedVersion {
            tx_type: MASS_TRANSFER_TX_TYPE,
            version,
        }),
    }
}

fn read_transfers(reader: &mut FieldReader<'_>) -> Result<Vec<Transfer>, TransactionError> {
    let count = reader.read_u16()? as usize;
    // Bounds the allocation by what the buffer can actually hold.
    let needed = count * TRANSFER_ENTRY_LENGTH;
    if needed > reader.remaining() {
        return Err(CodecError::TruncatedInput {
            needed,
            available: reader.remaining(),
        }
        .into());
    }

    let mut transfers = Vec::with_capacity(count);
    for _ in 0..count {
        let recipient = read_recipient(reader)?;
        let amount = reader.read_u64()?;
        transfers.push(Transfer { recipient, amount });
    }
    Ok(transfers)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Payload, TransactionBuilder};

    const SENDER: &str = "3MrHemUYoekBBzYrdTENssq9Re62EGSGFM5";
    const R1: &str = "3MueedSU6V6k9KMg88YXmnSpdc3YxHd1y4J";
    const R2: &str = "3N2Zmxhwksz61t58pnwA4JGKYmx8xT8wzjX";

    const GOLDEN_V1: &str = "0b01000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f000201543ee58636933a8ebeb561345b0e8d8ae3ed8ae2e8884b761f000000000000006401548ac2720f82fcc477fdf2c4ea4fd0fa49238fc209dab4d50600000000000000fa0000018bcfe568000000000007270e0000026869";
    const GOLDEN_V3: &str = "0b03540000018bcfe5680001000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f0000000007270e00000201543ee58636933a8ebeb561345b0e8d8ae3ed8ae2e8884b761f000000000000006401548ac2720f82fcc477fdf2c4ea4fd0fa49238fc209dab4d50600000000000000fa00026869";

    fn sample(version: u8) -> Transaction {
        let body = MassTransfer::new(vec![Transfer::new(R1, 100), Transfer::new(R2, 250)])
            .unwrap()
            .with_attachment("hi");
        let mut tx = TransactionBuilder::new(body)
            .version(version)
            .timestamp(1_700_000_000_000)
            .build()
            .unwrap();
        tx.sender = Some(SENDER.into());
        tx.sender_public_key = Some(Binary::from_bytes((0u8..32).collect::<Vec<u8>>()));
        tx
    }

    #[test]
    fn two_entries_cost_120_million() {
        assert_eq!(mass_transfer_fee(100_000_000, 2).unwrap(), 120_000_000);
        assert_eq!(sample(3).fee, 120_000_000);
    }

    #[test]
    fn fee_rounds_half_up() {
        // 1 * 5 / 10 = 0.5 rounds to 1
        assert_eq!(mass_transfer_fee(5, 1).unwrap(), 6);
        // 1 * 4 / 10 = 0.4 rounds to 0
        assert_eq!(mass_transfer_fee(4, 1).unwrap(), 4);
        // 3 * 5 / 10 = 1.5 rounds to 2
        assert_eq!(mass_transfer_fee(5, 3).unwrap(), 7);
        assert_eq!(mass_transfer_fee(100, 0).unwrap(), 100);
    }

    #[test]
    fn fee_overflow_is_reported() {
        assert!(matches!(
            mass_transfer_fee(u64::MAX, 2),
            Err(TransactionError::FeeOverflow)
        ));
    }

    #[test]
    fn golden_v1() {
        assert_eq!(hex::encode(sample(1).to_binary().unwrap()), GOLDEN_V1);
    }

    #[test]
    fn golden_v3() {
        let tx = sample(3);
        assert_eq!(hex::encode(tx.to_binary().unwrap()), GOLDEN_V3);
        assert_eq!(
            tx.compute_id().unwrap(),
            "HM4BD7amRYkMHhL4ymWJwh2bd2MA1aarKjitkTDHeu8o"
        );
    }

    #[test]
    fn decode_v1_has_no_sender() {
        let tx = Transaction::from_binary(&hex::decode(GOLDEN_V1).unwrap()).unwrap();
        assert_eq!(tx.sender, None);
        assert_eq!(tx.fee, 120_000_000);
        let Payload::MassTransfer(m) = &tx.payload else {
            panic!("wrong payload");
        };
        assert_eq!(m.transfers(), &[Transfer::new(R1, 100), Transfer::new(R2, 250)]);
        assert_eq!(m.attachment().as_slice(), b"hi");
    }

    #[test]
    fn decode_v3_derives_sender() {
        let tx = Transaction::from_binary(&hex::decode(GOLDEN_V3).unwrap()).unwrap();
        assert_eq!(tx.sender.as_deref(), Some(SENDER));
        assert_eq!(tx.to_binary().unwrap(), hex::decode(GOLDEN_V3).unwrap());
    }

    #[test]
    fn order_is_preserved_and_duplicates_kept() {
        let body = MassTransfer::new(vec![
            Transfer::new(R2, 1),
            Transfer::new(R1, 2),
            Transfer::new(R2, 1),
        ])
        .unwrap();
        assert_eq!(body.len(), 3);
        assert_eq!(body.transfers()[0].recipient, R2);
        assert_eq!(body.transfers()[2], Transfer::new(R2, 1));
        assert_eq!(body.total_amount(), Some(4));
    }

    #[test]
    fn count_larger_than_buffer_is_truncated_input() {
        let mut bytes = hex::decode(GOLDEN_V3).unwrap();
        // count sits right after the 8-byte fee
        bytes[52] = 0x10;
        assert!(matches!(
            Transaction::from_binary(&bytes),
            Err(TransactionError::Codec(CodecError::TruncatedInput { .. }))
        ));
    }

    #[test]
    fn invalid_recipient_is_rejected_at_construction() {
        assert!(matches!(
            MassTransfer::new(vec![Transfer::new("nope!", 1)]),
            Err(TransactionError::InvalidAddress(_))
        ));
    }

    #[test]
    fn json_fields() {
        let json = sample(3).to_json();
        assert_eq!(json["type"], 11);
        assert_eq!(json["attachment"], "8wr");
        assert_eq!(
            json["transfers"],
            serde_json::json!([
                {"recipient": R1, "amount": 100},
                {"recipient": R2, "amount": 250}
            ])
        );
        assert_eq!(json["fee"], 120_000_000u64);
    }

    #[test]
    fn from_data_requires_transfers() {
        assert!(matches!(
            Transaction::from_json(r#"{"type": 11}"#),
            Err(TransactionError::MissingField("transfers"))
        ));
    }

    #[test]
    fn from_data_keeps_reported_fee() {
        let json = format!(
            r#"{{"type": 11, "transfers": [{{"recipient": "{R1}", "amount": 1}}], "fee": 77}}"#
        );
        assert_eq!(Transaction::from_json(&json).unwrap().fee, 77);
    }
}
