//! Plaintext entry model.
//!
//! The value stored for an entry is a small JSON object with a primary
//! `"d"` field.  Other subsystems may add their own top-level fields
//! (one-time-password seeds, passkey credentials, ...); those are kept in
//! `extensions` and written back untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// The decrypted value of one entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// The primary secret (a password, token, ...).
    #[serde(rename = "d", default)]
    pub data: String,

    /// Fields owned by other subsystems.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl Payload {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            extensions: BTreeMap::new(),
        }
    }

    /// Serialize for sealing.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| VaultError::SerializationError(e.to_string()))
    }

    /// Parse a decrypted value.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| VaultError::SerializationError(e.to_string()))
    }
}

/// A named entry as handed out to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Slash-delimited plaintext name, e.g. `/services/github`.
    pub name: String,
    pub payload: Payload,
}
