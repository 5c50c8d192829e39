//! Types shared by the crypto layer and the storage layer.
//!
//! - `KeyId`: the fixed-length lookup identifier an entry is stored under.
//! - `Scheme`: the one-byte tag every sealed blob starts with, so a reader
//!   can tell which key-material family produced it.

use std::fmt;

use crate::errors::{Result, VaultError};

/// Length of a lookup identifier in bytes (SHA-256 output).
pub const KEY_ID_LEN: usize = 32;

/// Non-secret lookup identifier derived from a plaintext entry name.
///
/// It is a one-way hash and does not depend on key material, so an
/// entry keeps its storage address across key rotation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyId([u8; KEY_ID_LEN]);

impl KeyId {
    pub fn from_bytes(bytes: [u8; KEY_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_ID_LEN] {
        &self.0
    }

    /// Lowercase hex encoding (64 chars).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Hex encoding of the identifier with its bytes in reverse order.
    pub fn to_reversed_hex(&self) -> String {
        let mut reversed = self.0;
        reversed.reverse();
        hex::encode(reversed)
    }

    /// Parse a 64-char hex string back into an identifier.
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut out = [0u8; KEY_ID_LEN];
        hex::decode_to_slice(s, &mut out)
            .map_err(|e| VaultError::CorruptData(format!("identifier '{s}': {e}")))?;
        Ok(Self(out))
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self.to_hex())
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Which key-material family sealed a blob.
///
/// Stored as the first byte of every sealed name and sealed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Passphrase-derived subkeys, AES-256-GCM with deterministic nonces.
    Passphrase,
    /// X25519 recipient keypair, fresh encapsulation per call (age).
    Recipient,
}

/// AES-GCM authentication tag length.
const GCM_TAG_LEN: usize = 16;

/// Smallest binary age file for one X25519 recipient:
/// 168-byte header, 16-byte payload nonce, 16-byte chunk tag.
const AGE_MIN_LEN: usize = 200;

impl Scheme {
    pub const fn tag(self) -> u8 {
        match self {
            Self::Passphrase => 0x01,
            Self::Recipient => 0x02,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::Passphrase),
            0x02 => Some(Self::Recipient),
            _ => None,
        }
    }

    /// Minimum length of a sealed blob of this scheme, tag byte included.
    pub const fn min_sealed_len(self) -> usize {
        match self {
            Self::Passphrase => 1 + GCM_TAG_LEN,
            Self::Recipient => 1 + AGE_MIN_LEN,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Passphrase => "passphrase",
            Self::Recipient => "recipient",
        }
    }
}
