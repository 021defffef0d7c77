//! # Messages
//!
//! A signed, optionally encrypted envelope between two accounts.
//!
//! ```text
//! Created ──to / encrypt_for──▶ Targeted ──sign_with──▶ Signed
//!                                                       │
//!                                          decrypt_with ┘ (recipient only)
//! ```
//!
//! A message carries either plaintext (`media_type` + `data`) or
//! ciphertext (`encrypted_data`). Encrypting seals
//! `len(media_type) || media_type || data` for the recipient and clears the
//! plaintext. Once signed, the recipient and payload are frozen: `to` and
//! `encrypt_for` fail with [`MessageError::AlreadySigned`].
//!
//! Signing caches the SHA-256 of the unsigned encoding, so payload
//! tampering is detectable by [`Message::verify_hash`] even without
//! checking the signature.
//!
//! Decrypting restores `media_type` and `data` but keeps `encrypted_data`:
//! the signature and cached hash refer to the ciphertext, and they keep
//! verifying after decryption.

mod error;
mod wire;

pub use error::MessageError;
pub use wire::{MessageJson, MessagePayloadJson, MessageSenderJson};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::binary::codec::length_prefixed_string;
use crate::binary::{Binary, FieldReader};
use crate::config::{DEFAULT_MESSAGE_TYPE, MEDIA_TYPE_JSON, MEDIA_TYPE_OCTET_STREAM, MEDIA_TYPE_TEXT};
use crate::crypto::encryption::{Decrypter, Encrypter};
use crate::crypto::hash::sha256;
use crate::crypto::keys::KeyType;
use crate::crypto::signatures::{self, Signer};
use crate::identity::address::decode_address;

/// Key that signed a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSender {
    pub key_type: KeyType,
    pub public_key: Binary,
}

/// A peer-to-peer message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    message_type: String,
    media_type: Option<String>,
    data: Option<Binary>,
    encrypted_data: Option<Binary>,
    timestamp: Option<DateTime<Utc>>,
    sender: Option<MessageSender>,
    signature: Option<Binary>,
    recipient: Option<String>,
    hash: Option<Binary>,
}

impl Message {
    /// A message with an explicit media type.
    pub fn new(data: impl Into<Binary>, media_type: impl Into<String>) -> Self {
        Self {
            message_type: DEFAULT_MESSAGE_TYPE.to_string(),
            media_type: Some(media_type.into()),
            data: Some(data.into()),
            encrypted_data: None,
            timestamp: None,
            sender: None,
            signature: None,
            recipient: None,
            hash: None,
        }
    }

    /// UTF-8 text, `text/plain`.
    pub fn text(text: &str) -> Self {
        Self::new(Binary::from_string(text), MEDIA_TYPE_TEXT)
    }

    /// Opaque bytes, `application/octet-stream`.
    pub fn binary(data: impl Into<Binary>) -> Self {
        Self::new(data, MEDIA_TYPE_OCTET_STREAM)
    }

    /// Any serializable value as `application/json`.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, MessageError> {
        Self::json_as(value, MEDIA_TYPE_JSON)
    }

    /// A serializable value under `media_type`; only JSON media types are
    /// accepted.
    pub fn json_as<T: Serialize + ?Sized>(value: &T, media_type: &str) -> Result<Self, MessageError> {
        if media_type != MEDIA_TYPE_JSON {
            return Err(MessageError::UnsupportedMediaType(media_type.to_string()));
        }
        Ok(Self::new(serde_json::to_vec(value)?, media_type))
    }

    /// Replaces the default `"message"` type tag.
    pub fn with_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_type = message_type.into();
        self
    }

    // -- accessors ------------------------------------------------------------

    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    pub fn data(&self) -> Option<&Binary> {
        self.data.as_ref()
    }

    pub fn encrypted_data(&self) -> Option<&Binary> {
        self.encrypted_data.as_ref()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn sender(&self) -> Option<&MessageSender> {
        self.sender.as_ref()
    }

    pub fn signature(&self) -> Option<&Binary> {
        self.signature.as_ref()
    }

    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref()
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted_data.is_some()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    // -- state transitions ----------------------------------------------------

    /// Addresses the message to `recipient` without encrypting it.
    pub fn to(&mut self, recipient: &str) -> Result<&mut Self, MessageError> {
        self.ensure_unsigned()?;
        decode_address(recipient)?;
        self.recipient = Some(recipient.to_string());
        Ok(self)
    }

    /// Addresses the message to `recipient` and replaces the plaintext with
    /// ciphertext only `recipient` can open.
    pub fn encrypt_for<E: Encrypter + ?Sized>(&mut self, recipient: &E) -> Result<&mut Self, MessageError> {
        self.ensure_unsigned()?;
        let (Some(media_type), Some(data)) = (&self.media_type, &self.data) else {
            return Err(MessageError::MissingPayload);
        };

        let mut plaintext = length_prefixed_string(media_type)?;
        plaintext.extend_from_slice(data);
        let ciphertext = recipient.encrypt(&plaintext)?;

        debug!(
            recipient = recipient.address(),
            plaintext_len = plaintext.len(),
            ciphertext_len = ciphertext.len(),
            "message encrypted"
        );
        self.recipient = Some(recipient.address().to_string());
        self.encrypted_data = Some(Binary::from(ciphertext));
        self.media_type = None;
        self.data = None;
        Ok(self)
    }

    /// Restores `media_type` and `data` from the ciphertext. The ciphertext
    /// itself is kept.
    pub fn decrypt_with<D: Decrypter + ?Sized>(&mut self, account: &D) -> Result<&mut Self, MessageError> {
        let encrypted = self.encrypted_data.as_ref().ok_or(MessageError::NotEncrypted)?;
        let content = account.decrypt(encrypted)?;

        let mut reader = FieldReader::new(&content);
        let media_type = reader.read_length_prefixed_string()?;
        let data = Binary::from(reader.read_rest());

        debug!(media_type = %media_type, data_len = data.len(), "message decrypted");
        self.media_type = Some(media_type);
        self.data = Some(data);
        Ok(self)
    }

    /// Signs the unsigned encoding and caches its hash.
    ///
    /// The timestamp is set (at millisecond precision, which is what the
    /// wire carries) only if absent. Signing again replaces the signature.
    pub fn sign_with<S: Signer + ?Sized>(&mut self, signer: &S) -> Result<&mut Self, MessageError> {
        let mut staged = self.clone();
        if staged.timestamp.is_none() {
            staged.timestamp = Some(now_millis()?);
        }
        staged.sender = Some(MessageSender {
            key_type: signer.key_type(),
            public_key: signer.public_key(),
        });

        let body = staged.to_binary(false)?;
        staged.signature = Some(signer.sign(&body));
        staged.hash = Some(Binary::from(sha256(&body)));

        debug!(
            signer = signer.address(),
            message_type = %staged.message_type,
            encrypted = staged.is_encrypted(),
            "message signed"
        );
        *self = staged;
        Ok(self)
    }

    /// Checks the signature against the recorded sender key.
    pub fn verify_signature(&self) -> Result<bool, MessageError> {
        let (Some(signature), Some(sender)) = (&self.signature, &self.sender) else {
            return Err(MessageError::NotSigned);
        };
        let body = self.to_binary(false)?;
        Ok(signatures::verify(sender.key_type, &sender.public_key, &body, signature)?)
    }

    /// `true` if no hash is cached, or if the cached hash still matches the
    /// current unsigned encoding.
    pub fn verify_hash(&self) -> bool {
        match &self.hash {
            None => true,
            Some(cached) => self
                .to_binary(false)
                .map(|body| sha256(&body) == cached.as_slice())
                .unwrap_or(false),
        }
    }

    /// The cached content hash, or a fresh SHA-256 of the unsigned encoding.
    pub fn hash(&self) -> Result<Binary, MessageError> {
        match &self.hash {
            Some(cached) => Ok(cached.clone()),
            None => Ok(Binary::from(sha256(&self.to_binary(false)?))),
        }
    }

    fn ensure_unsigned(&self) -> Result<(), MessageError> {
        if self.signature.is_some() {
            return Err(MessageError::AlreadySigned);
        }
        Ok(())
    }
}

fn now_millis() -> Result<DateTime<Utc>, MessageError> {
    let millis = Utc::now().timestamp_millis();
    DateTime::from_timestamp_millis(millis).ok_or(MessageError::InvalidTimestamp(millis))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
