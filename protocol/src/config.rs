//! # Protocol Configuration & Constants
//!
//! Every magic number of the wire formats lives here. The byte layouts are
//! shared with every other client on the network, so changing any of these
//! values is a consensus-breaking change, not a refactor.

// ---------------------------------------------------------------------------
// Networks
// ---------------------------------------------------------------------------

/// Chain id byte embedded in mainnet addresses.
pub const MAINNET_CHAIN_ID: char = 'L';

/// Chain id byte embedded in testnet addresses.
pub const TESTNET_CHAIN_ID: char = 'T';

/// The networks this client knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn chain_id(self) -> char {
        match self {
            Network::Mainnet => MAINNET_CHAIN_ID,
            Network::Testnet => TESTNET_CHAIN_ID,
        }
    }

    /// Looks a network up by its chain id. Unknown ids yield `None`;
    /// custom chains are still usable through their raw chain id.
    pub fn from_chain_id(chain_id: char) -> Option<Self> {
        match chain_id {
            MAINNET_CHAIN_ID => Some(Network::Mainnet),
            TESTNET_CHAIN_ID => Some(Network::Testnet),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Key and address widths
// ---------------------------------------------------------------------------

/// Raw ed25519 public key length.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Raw ed25519 signature length.
pub const SIGNATURE_LENGTH: usize = 64;

/// A base58-decoded address: version(1) + chain id(1) + key hash(20) + checksum(4).
pub const ADDRESS_LENGTH: usize = 26;

/// First byte of every address.
pub const ADDRESS_VERSION: u8 = 1;

/// Bytes of the public key hash kept in an address.
pub const ADDRESS_HASH_LENGTH: usize = 20;

/// Trailing checksum bytes of an address.
pub const ADDRESS_CHECKSUM_LENGTH: usize = 4;

/// Numeric wire tags for key types.
pub const KEY_TYPE_ID_ED25519: u8 = 1;
pub const KEY_TYPE_ID_SECP256K1: u8 = 2;
pub const KEY_TYPE_ID_SECP256R1: u8 = 3;

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Type tag of the batch transfer transaction.
pub const MASS_TRANSFER_TX_TYPE: u8 = 11;

/// Type tag of the association (anchor between two accounts) transaction.
pub const ASSOCIATION_TX_TYPE: u8 = 16;

/// Base fee of both transaction types, in the smallest currency unit.
pub const DEFAULT_TX_FEE: u64 = 100_000_000;

/// Version new transactions are built with.
pub const DEFAULT_TX_VERSION: u8 = 3;

/// Binary layout versions understood by the codec.
pub const SUPPORTED_TX_VERSIONS: [u8; 2] = [1, 3];

/// A mass transfer pays `base + round(count * base / MASS_TRANSFER_FEE_DIVISOR)`.
pub const MASS_TRANSFER_FEE_DIVISOR: u64 = 10;

/// Width of one encoded transfer entry: recipient address + 8-byte amount.
pub const TRANSFER_ENTRY_LENGTH: usize = ADDRESS_LENGTH + 8;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Message type when the caller does not choose one.
pub const DEFAULT_MESSAGE_TYPE: &str = "message";

pub const MEDIA_TYPE_TEXT: &str = "text/plain";
pub const MEDIA_TYPE_OCTET_STREAM: &str = "application/octet-stream";
pub const MEDIA_TYPE_JSON: &str = "application/json";

// ---------------------------------------------------------------------------
// Symmetric encryption
// ---------------------------------------------------------------------------

/// AES-256-GCM key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// AES-256-GCM nonce length in bytes.
pub const AES_NONCE_LENGTH: usize = 12;

/// AES-256-GCM authentication tag length in bytes.
pub const AES_TAG_LENGTH: usize = 16;

/// Domain-separation context for message encryption keys.
pub const MESSAGE_KDF_CONTEXT: &str = "lto-protocol 2024 message encryption v1";

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// A friendly name for a chain id, mainly for logging.
pub fn network_name(chain_id: char) -> String {
    match Network::from_chain_id(chain_id) {
        Some(Network::Mainnet) => "mainnet".to_string(),
        Some(Network::Testnet) => "testnet".to_string(),
        None => format!("custom({})", chain_id),
    }
}
