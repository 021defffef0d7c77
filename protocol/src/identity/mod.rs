//! # Identity Module
//!
//! Every participant is identified by an ed25519 keypair, from which a
//! chain-specific base58 address is derived.
//!
//! 1. **Address**: `version || chain_id || key hash || checksum`. This is
//!    what users see and paste into recipient fields.
//! 2. **Account**: keypair + chain id. The signing, encryption and
//!    decryption capability handed to transactions and messages.

pub mod account;
pub mod address;

pub use account::{Account, PublicAccount, PublicAccountError};
pub use address::{chain_id_of, decode_address, derive_address, is_valid_address, AddressError};
