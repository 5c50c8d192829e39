//! Cryptographic layer for keyshard.
//!
//! This module provides:
//! - Key material, subkey derivation, nonce rules, and lookup ids (`keys`)
//! - AES-256-GCM sealing under passphrase subkeys (`encryption`)
//! - age-based sealing to an X25519 keypair (`recipient`)
//! - The `Encryptor` handle that ties them together (`encryptor`)

pub mod encryption;
pub mod encryptor;
pub mod keys;
pub mod recipient;

pub use encryptor::Encryptor;
pub use keys::{derive_subkeys, key_id, name_nonce, value_nonce, KeyMaterial, NameKey, ValueKey};
