use thiserror::Error;

use crate::binary::CodecError;
use crate::crypto::encryption::EncryptionError;
use crate::crypto::keys::KeyError;
use crate::identity::AddressError;

/// Errors raised by message construction, state transitions and codecs.
#[derive(Debug, Error)]
pub enum MessageError {
    /// `to` / `encrypt_for` after the message was signed.
    #[error("message is already signed")]
    AlreadySigned,

    #[error("message is not signed")]
    NotSigned,

    #[error("message is not encrypted")]
    NotEncrypted,

    #[error("recipient not set")]
    MissingRecipient,

    #[error("message has no plaintext payload")]
    MissingPayload,

    #[error("unable to encode data as {0}")]
    UnsupportedMediaType(String),

    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("invalid recipient: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    #[error("invalid message JSON: {0}")]
    Json(#[from] serde_json::Error),
}
