//! Key material and the pure derivation rules built on it.
//!
//! From a passphrase we derive two subkeys:
//! - a **name key**, used only to seal entry names;
//! - a **value key**, used only to seal entry values.
//!
//! They live in distinct wrapper types so one can never be passed where
//! the other is expected.  Nonce derivation and the lookup identifier
//! are plain functions so they can be tested on their own.

use std::fmt;

use age::secrecy::ExposeSecret;
use age::x25519;
use rand::distr::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::types::{KeyId, Scheme};

/// Length of each symmetric subkey (256 bits, for AES-256).
pub const SUBKEY_LEN: usize = 32;

/// Length of the AES-GCM nonce.
pub const NONCE_LEN: usize = 12;

/// Length of generated passphrases.
const GENERATED_PASSPHRASE_LEN: usize = 32;

/// Subkey that seals entry names.  Zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct NameKey([u8; SUBKEY_LEN]);

impl NameKey {
    pub(crate) fn as_bytes(&self) -> &[u8; SUBKEY_LEN] {
        &self.0
    }
}

/// Subkey that seals entry values.  Zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ValueKey([u8; SUBKEY_LEN]);

impl ValueKey {
    pub(crate) fn as_bytes(&self) -> &[u8; SUBKEY_LEN] {
        &self.0
    }
}

/// Derive the name and value subkeys from a passphrase.
///
/// name key  = SHA-256(passphrase)
/// value key = SHA-256(passphrase || name key)
pub fn derive_subkeys(passphrase: &[u8]) -> (NameKey, ValueKey) {
    let name: [u8; SUBKEY_LEN] = Sha256::digest(passphrase).into();

    let mut hasher = Sha256::new();
    hasher.update(passphrase);
    hasher.update(name);
    let value: [u8; SUBKEY_LEN] = hasher.finalize().into();

    (NameKey(name), ValueKey(value))
}

/// Nonce used when sealing a name under the name key: all zeroes.
///
/// Name sealing is deterministic; the name key seals nothing else.
pub fn name_nonce() -> [u8; NONCE_LEN] {
    [0u8; NONCE_LEN]
}

/// Nonce used when sealing a value under the value key.
///
/// The first 12 bytes of SHA-256(name), so each entry name has exactly one
/// nonce and a value sealed for one name cannot be opened under another.
pub fn value_nonce(name: &str) -> [u8; NONCE_LEN] {
    let digest = Sha256::digest(name.as_bytes());
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&digest[..NONCE_LEN]);
    nonce
}

/// Lookup identifier for an entry name: SHA-256(name).
///
/// Independent of any key material.
pub fn key_id(name: &str) -> KeyId {
    KeyId::from_bytes(Sha256::digest(name.as_bytes()).into())
}

/// Key material an `Encryptor` is built from.
#[derive(Clone)]
pub enum KeyMaterial {
    /// A passphrase, hashed into name and value subkeys.
    Passphrase(Zeroizing<String>),
    /// An X25519 keypair in age encoding (`age1…` / `AGE-SECRET-KEY-1…`).
    Recipient {
        public: String,
        private: Zeroizing<String>,
    },
}

impl KeyMaterial {
    pub fn passphrase(passphrase: impl Into<String>) -> Self {
        Self::Passphrase(Zeroizing::new(passphrase.into()))
    }

    /// Generate a random 32-character alphanumeric passphrase.
    pub fn generate_passphrase() -> Self {
        let passphrase: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_PASSPHRASE_LEN)
            .map(char::from)
            .collect();
        Self::Passphrase(Zeroizing::new(passphrase))
    }

    /// Generate a fresh X25519 keypair.
    pub fn generate_recipient() -> Self {
        let identity = x25519::Identity::generate();
        Self::Recipient {
            public: identity.to_public().to_string(),
            private: Zeroizing::new(identity.to_string().expose_secret().to_string()),
        }
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            Self::Passphrase(_) => Scheme::Passphrase,
            Self::Recipient { .. } => Scheme::Recipient,
        }
    }

    /// Whether two materials would produce interchangeable ciphertexts.
    ///
    /// Keypairs are compared by public key only.
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Passphrase(a), Self::Passphrase(b)) => a.as_str() == b.as_str(),
            (Self::Recipient { public: a, .. }, Self::Recipient { public: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passphrase(_) => f.write_str("KeyMaterial::Passphrase(..)"),
            Self::Recipient { public, .. } => f
                .debug_struct("KeyMaterial::Recipient")
                .field("public", public)
                .finish_non_exhaustive(),
        }
    }
}
