//! Binary and JSON projections of [`Message`].
//!
//! Binary layout:
//!
//! ```text
//! len(type) type | keyType(1) | senderPublicKey(32) | recipient(26)
//! | timestamp(8) | encrypted(1)
//! | encrypted=1: len(encryptedData) encryptedData
//! | encrypted=0: len(mediaType) mediaType len(data) data
//! | signature (rest of buffer, may be empty)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::{Message, MessageError, MessageSender};
use crate::binary::codec::{length_prefixed_string, put_length_prefixed};
use crate::binary::{Binary, CodecError, FieldReader};
use crate::config::{ADDRESS_LENGTH, DEFAULT_MESSAGE_TYPE, PUBLIC_KEY_LENGTH};
use crate::crypto::keys::KeyType;
use crate::identity::address::{check_address_bytes, decode_address};

const FLAG_PLAIN: u8 = 0;
const FLAG_ENCRYPTED: u8 = 1;

/// JSON shape of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageJson {
    #[serde(rename = "type", default = "default_message_type")]
    pub message_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<MessageSenderJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(flatten)]
    pub payload: MessagePayloadJson,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSenderJson {
    pub key_type: KeyType,
    /// base58
    pub public_key: String,
}

/// Ciphertext wins when both forms are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessagePayloadJson {
    Encrypted {
        /// base64
        #[serde(rename = "encryptedData")]
        encrypted_data: String,
    },
    Plain {
        #[serde(rename = "mediaType")]
        media_type: String,
        /// base64
        data: String,
    },
}

fn default_message_type() -> String {
    DEFAULT_MESSAGE_TYPE.to_string()
}

impl Message {
    // -----------------------------------------------------------------------
    // Binary
    // -----------------------------------------------------------------------

    /// Encodes the message. With `with_signature` the signature is appended
    /// and must be present.
    ///
    /// Fails with `MissingRecipient` before anything else, then with
    /// `NotSigned` if sender or timestamp are unset.
    pub fn to_binary(&self, with_signature: bool) -> Result<Vec<u8>, MessageError> {
        let recipient = self.recipient.as_deref().ok_or(MessageError::MissingRecipient)?;
        let (Some(sender), Some(timestamp)) = (&self.sender, self.timestamp) else {
            return Err(MessageError::NotSigned);
        };
        if sender.public_key.len() != PUBLIC_KEY_LENGTH {
            return Err(CodecError::InvalidLength {
                field: "public key",
                expected: PUBLIC_KEY_LENGTH,
                got: sender.public_key.len(),
            }
            .into());
        }

        let mut buf = length_prefixed_string(&self.message_type)?;
        buf.push(sender.key_type.id());
        buf.extend_from_slice(&sender.public_key);
        buf.extend_from_slice(&decode_address(recipient)?);
        buf.extend_from_slice(&timestamp.timestamp_millis().to_be_bytes());

        match (&self.encrypted_data, &self.media_type, &self.data) {
            (Some(encrypted), _, _) => {
                buf.push(FLAG_ENCRYPTED);
                put_length_prefixed(&mut buf, encrypted)?;
            }
            (None, Some(media_type), Some(data)) => {
                buf.push(FLAG_PLAIN);
                put_length_prefixed(&mut buf, media_type.as_bytes())?;
                put_length_prefixed(&mut buf, data)?;
            }
            _ => return Err(MessageError::MissingPayload),
        }

        if with_signature {
            let signature = self.signature.as_ref().ok_or(MessageError::NotSigned)?;
            buf.extend_from_slice(signature);
        }
        Ok(buf)
    }

    /// Decodes a message. Trailing bytes after the payload are the
    /// signature; none means unsigned. No hash is cached.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, MessageError> {
        let mut reader = FieldReader::new(bytes);
        let message_type = reader.read_length_prefixed_string()?;
        let key_type = KeyType::from_id(reader.read_u8()?)?;
        let public_key = Binary::from(reader.read_array::<PUBLIC_KEY_LENGTH>()?);
        let recipient = check_address_bytes(reader.read_bytes(ADDRESS_LENGTH)?)?;
        let millis = i64::from_be_bytes(reader.read_array()?);
        let timestamp =
            DateTime::from_timestamp_millis(millis).ok_or(MessageError::InvalidTimestamp(millis))?;

        let (media_type, data, encrypted_data) = match reader.read_u8()? {
            FLAG_ENCRYPTED => (None, None, Some(Binary::from(reader.read_length_prefixed()?))),
            FLAG_PLAIN => {
                let media_type = reader.read_length_prefixed_string()?;
                let data = Binary::from(reader.read_length_prefixed()?);
                (Some(media_type), Some(data), None)
            }
            other => {
                return Err(CodecError::decode(
                    "message",
                    format!("encrypted flag must be 0 or 1, got {other}"),
                )
                .into())
            }
        };

        let rest = reader.read_rest();
        Ok(Self {
            message_type,
            media_type,
            data,
            encrypted_data,
            timestamp: Some(timestamp),
            sender: Some(MessageSender { key_type, public_key }),
            signature: (!rest.is_empty()).then(|| Binary::from(rest)),
            recipient: Some(bs58::encode(recipient).into_string()),
            hash: None,
        })
    }

    // -----------------------------------------------------------------------
    // JSON
    // -----------------------------------------------------------------------

    /// The JSON projection. Unset sender, recipient, timestamp, signature
    /// and hash are omitted.
    pub fn to_json(&self) -> Result<MessageJson, MessageError> {
        let payload = match (&self.encrypted_data, &self.media_type, &self.data) {
            (Some(encrypted), _, _) => MessagePayloadJson::Encrypted {
                encrypted_data: encrypted.to_base64(),
            },
            (None, Some(media_type), Some(data)) => MessagePayloadJson::Plain {
                media_type: media_type.clone(),
                data: data.to_base64(),
            },
            _ => return Err(MessageError::MissingPayload),
        };

        Ok(MessageJson {
            message_type: self.message_type.clone(),
            sender: self.sender.as_ref().map(|s| MessageSenderJson {
                key_type: s.key_type,
                public_key: s.public_key.to_base58(),
            }),
            recipient: self.recipient.clone(),
            timestamp: self.timestamp,
            signature: self.signature.as_ref().map(Binary::to_base58),
            hash: self.hash().ok().map(|h| h.to_base58()),
            payload,
        })
    }

    /// Rebuilds a message from its JSON projection. A `hash` in the input
    /// becomes the cached hash, so [`Message::verify_hash`] checks against
    /// it.
    pub fn from_json(json: &str) -> Result<Self, MessageError> {
        Self::from_data(serde_json::from_str(json)?)
    }

    pub fn from_data(data: MessageJson) -> Result<Self, MessageError> {
        let sender = data
            .sender
            .map(|s| -> Result<_, MessageError> {
                let public_key = Binary::from_base58(&s.public_key)?;
                if public_key.len() != PUBLIC_KEY_LENGTH {
                    return Err(CodecError::InvalidLength {
                        field: "public key",
                        expected: PUBLIC_KEY_LENGTH,
                        got: public_key.len(),
                    }
                    .into());
                }
                Ok(MessageSender {
                    key_type: s.key_type,
                    public_key,
                })
            })
            .transpose()?;
        if let Some(recipient) = &data.recipient {
            decode_address(recipient)?;
        }

        let (media_type, payload, encrypted_data) = match data.payload {
            MessagePayloadJson::Encrypted { encrypted_data } => {
                (None, None, Some(Binary::from_base64(&encrypted_data)?))
            }
            MessagePayloadJson::Plain { media_type, data } => {
                (Some(media_type), Some(Binary::from_base64(&data)?), None)
            }
        };

        Ok(Self {
            message_type: data.message_type,
            media_type,
            data: payload,
            encrypted_data,
            timestamp: data.timestamp,
            sender,
            signature: data.signature.as_deref().map(Binary::from_base58).transpose()?,
            recipient: data.recipient,
            hash: data.hash.as_deref().map(Binary::from_base58).transpose()?,
        })
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signatures::Signer;
    use crate::identity::Account;

    const RECIPIENT: &str = "3N2Zmxhwksz61t58pnwA4JGKYmx8xT8wzjX";
    const GOLDEN: &str = "00076d657373616765011111111111111111111111111111111111111111111111111111111111111111\
                          01548ac2720f82fcc477fdf2c4ea4fd0fa49238fc209dab4d506\
                          0000018bcfe56800\
                          00\
                          000a746578742f706c61696e00026869";

    fn fixed() -> Message {
        let mut msg = Message::text("hi");
        msg.to(RECIPIENT).unwrap();
        msg.sender = Some(MessageSender {
            key_type: KeyType::Ed25519,
            public_key: Binary::from([0x11u8; 32]),
        });
        msg.timestamp = DateTime::from_timestamp_millis(1_700_000_000_000);
        msg
    }

    fn signed() -> Message {
        let alice = Account::from_seed(&[0xa1; 32], 'T').unwrap();
        let mut msg = Message::json(&serde_json::json!({"amount": 10})).unwrap();
        msg.to(RECIPIENT).unwrap();
        msg.sign_with(&alice).unwrap();
        msg
    }

    #[test]
    fn plaintext_layout_is_byte_exact() {
        let encoded = fixed().to_binary(false).unwrap();
        assert_eq!(hex::encode(&encoded), GOLDEN);
        assert_eq!(encoded.len(), 93);
        assert_eq!(
            hex::encode(fixed().hash().unwrap()),
            "5006cadf76d68dacc019791a70b7a3a2cd8029523d0c613f90d91b65a9b99c9e"
        );
    }

    #[test]
    fn unsigned_fixed_message_decodes() {
        let decoded = Message::from_binary(&hex::decode(GOLDEN).unwrap()).unwrap();
        assert_eq!(decoded, fixed());
        assert_eq!(decoded.signature(), None);
    }

    #[test]
    fn recipient_is_required_first() {
        let msg = Message::text("hi");
        assert!(matches!(msg.to_binary(false), Err(MessageError::MissingRecipient)));

        let mut msg = Message::text("hi");
        msg.to(RECIPIENT).unwrap();
        assert!(matches!(msg.to_binary(false), Err(MessageError::NotSigned)));
        assert!(matches!(fixed().to_binary(true), Err(MessageError::NotSigned)));
    }

    #[test]
    fn signed_binary_roundtrip_verifies() {
        let msg = signed();
        let decoded = Message::from_binary(&msg.to_binary(true).unwrap()).unwrap();

        assert_eq!(decoded.message_type(), "message");
        assert_eq!(decoded.media_type(), Some("application/json"));
        assert_eq!(decoded.timestamp(), msg.timestamp());
        assert_eq!(decoded.signature(), msg.signature());
        assert!(decoded.verify_signature().unwrap());
        assert!(decoded.verify_hash());
        assert_eq!(decoded.hash().unwrap(), msg.hash().unwrap());
    }

    #[test]
    fn encrypted_binary_roundtrip() {
        let alice = Account::from_seed(&[0xa1; 32], 'T').unwrap();
        let bob = Account::from_seed(&[0xb0; 32], 'T').unwrap();
        let mut msg = Message::text("for bob");
        msg.encrypt_for(&bob).unwrap();
        msg.sign_with(&alice).unwrap();

        let encoded = msg.to_binary(true).unwrap();
        // 2+7 type, 1 key type, 32 key, 26 recipient, 8 timestamp
        assert_eq!(encoded[76], FLAG_ENCRYPTED);

        let mut decoded = Message::from_binary(&encoded).unwrap();
        assert!(decoded.is_encrypted());
        assert!(decoded.verify_signature().unwrap());
        decoded.decrypt_with(&bob).unwrap();
        assert_eq!(decoded.data().unwrap().to_utf8_string(), "for bob");
        assert_eq!(decoded.recipient(), Some(Signer::address(&bob)));
    }

    #[test]
    fn invalid_flag_is_a_decode_error() {
        let mut bytes = hex::decode(GOLDEN).unwrap();
        bytes[76] = 2;
        assert!(matches!(
            Message::from_binary(&bytes),
            Err(MessageError::Codec(CodecError::Decode { encoding: "message", .. }))
        ));
    }

    #[test]
    fn truncated_input_fails() {
        let bytes = hex::decode(GOLDEN).unwrap();
        assert!(matches!(
            Message::from_binary(&bytes[..60]),
            Err(MessageError::Codec(CodecError::TruncatedInput { .. }))
        ));
        assert!(matches!(
            Message::from_binary(&bytes[..bytes.len() - 1]),
            Err(MessageError::Codec(CodecError::TruncatedInput { .. }))
        ));
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_value(fixed()).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["sender"]["keyType"], "ed25519");
        assert_eq!(json["sender"]["publicKey"], Binary::from([0x11u8; 32]).to_base58());
        assert_eq!(json["recipient"], RECIPIENT);
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20Z");
        assert_eq!(json["mediaType"], "text/plain");
        assert_eq!(json["data"], "aGk=");
        assert!(json.get("encryptedData").is_none());
        assert!(json.get("signature").is_none());
    }

    #[test]
    fn unaddressed_json_omits_optional_fields() {
        let json = serde_json::to_value(Message::text("hi")).unwrap();
        assert!(json.get("sender").is_none());
        assert!(json.get("recipient").is_none());
        assert!(json.get("hash").is_none());
    }

    #[test]
    fn json_roundtrip_caches_hash() {
        let msg = signed();
        let text = serde_json::to_string(&msg).unwrap();
        let parsed = Message::from_json(&text).unwrap();

        assert_eq!(parsed, msg);
        assert!(parsed.verify_signature().unwrap());
        assert!(parsed.verify_hash());
    }

    #[test]
    fn json_with_stale_hash_fails_verification() {
        let mut json = serde_json::to_value(signed()).unwrap();
        json["hash"] = Binary::from([0u8; 32]).to_base58().into();
        let parsed = Message::from_json(&json.to_string()).unwrap();
        assert!(!parsed.verify_hash());
    }

    #[test]
    fn encrypted_json_roundtrip() {
        let bob = Account::from_seed(&[0xb0; 32], 'T').unwrap();
        let mut msg = Message::binary(vec![9u8; 40]);
        msg.encrypt_for(&bob).unwrap();

        let json = msg.to_json().unwrap();
        assert!(matches!(json.payload, MessagePayloadJson::Encrypted { .. }));
        let mut parsed = Message::from_data(json).unwrap();
        parsed.decrypt_with(&bob).unwrap();
        assert_eq!(parsed.data().unwrap().as_slice(), &[9u8; 40]);
    }

    #[test]
    fn missing_type_defaults() {
        let parsed = Message::from_json(r#"{"mediaType":"text/plain","data":"aGk="}"#).unwrap();
        assert_eq!(parsed.message_type(), "message");
        assert_eq!(parsed.data().unwrap().to_utf8_string(), "hi");
    }

    #[test]
    fn bad_json_sender_key_is_rejected() {
        let bad = r#"{"sender":{"keyType":"ed25519","publicKey":"abc"},"mediaType":"text/plain","data":""}"#;
        assert!(matches!(
            Message::from_json(bad),
            Err(MessageError::Codec(CodecError::InvalidLength { .. }))
        ));
    }
}
