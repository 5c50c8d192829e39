//! The `Encryptor`: every sealing, opening, and lookup-identifier
//! operation the vault needs, behind one handle built from key material.
//!
//! It holds key material for its whole lifetime and performs no I/O.

use age::x25519;
use subtle::ConstantTimeEq;

use super::encryption;
use super::keys::{self, derive_subkeys, KeyMaterial, NameKey, ValueKey};
use super::recipient;
use crate::errors::{Result, VaultError};
use crate::types::{KeyId, Scheme};

/// Pseudo entry name the test sentinel is sealed under.  Real entry
/// names always start with '/', so this can never collide with one.
const SENTINEL_NAME: &str = "#keyshard-sentinel";

/// Plaintext recorded in the test sentinel.
const SENTINEL_MARKER: &[u8] = b"keyshard sentinel v1";

/// Context bound into names sealed to a recipient.
const NAME_CONTEXT: &[u8] = b"name";

enum Sealer {
    Passphrase {
        name_key: NameKey,
        value_key: ValueKey,
    },
    Recipient {
        recipient: x25519::Recipient,
        identity: x25519::Identity,
    },
}

/// Seals and opens entry names and values under one set of key material.
pub struct Encryptor {
    sealer: Sealer,
}

impl Encryptor {
    /// Build an encryptor, failing with `InvalidKeyMaterial` if the
    /// material is empty or does not parse.
    pub fn new(material: &KeyMaterial) -> Result<Self> {
        let sealer = match material {
            KeyMaterial::Passphrase(passphrase) => {
                if passphrase.is_empty() {
                    return Err(VaultError::InvalidKeyMaterial(
                        "passphrase is empty".into(),
                    ));
                }
                let (name_key, value_key) = derive_subkeys(passphrase.as_bytes());
                Sealer::Passphrase {
                    name_key,
                    value_key,
                }
            }
            KeyMaterial::Recipient { public, private } => {
                if public.is_empty() || private.is_empty() {
                    return Err(VaultError::InvalidKeyMaterial(
                        "keypair is incomplete".into(),
                    ));
                }
                let (recipient, identity) = recipient::parse_keypair(public, private)?;
                Sealer::Recipient {
                    recipient,
                    identity,
                }
            }
        };

        Ok(Self { sealer })
    }

    /// Which scheme this encryptor seals with.
    pub fn scheme(&self) -> Scheme {
        match self.sealer {
            Sealer::Passphrase { .. } => Scheme::Passphrase,
            Sealer::Recipient { .. } => Scheme::Recipient,
        }
    }

    /// Lookup identifier for `name`.  Identical for every encryptor.
    pub fn key_id(&self, name: &str) -> KeyId {
        keys::key_id(name)
    }

    /// Seal an entry name.
    pub fn encrypt_key(&self, name: &str) -> Result<Vec<u8>> {
        if name.is_empty() {
            return Err(VaultError::EmptyInput("name"));
        }

        match &self.sealer {
            Sealer::Passphrase { name_key, .. } => encryption::seal_name(name_key, name.as_bytes()),
            Sealer::Recipient { recipient, .. } => {
                recipient::seal(recipient, NAME_CONTEXT, name.as_bytes())
            }
        }
    }

    /// Open a sealed entry name.
    pub fn decrypt_key(&self, sealed: &[u8]) -> Result<String> {
        if sealed.is_empty() {
            return Err(VaultError::EmptyInput("ciphertext"));
        }
        self.check_tag(sealed)?;

        let plaintext = match &self.sealer {
            Sealer::Passphrase { name_key, .. } => encryption::open_name(name_key, sealed)?,
            Sealer::Recipient { identity, .. } => {
                recipient::open(identity, NAME_CONTEXT, sealed)?
            }
        };

        String::from_utf8(plaintext).map_err(|_| VaultError::AuthenticationFailure)
    }

    /// Seal an entry value, bound to the entry `name`.
    pub fn encrypt_value(&self, name: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        if name.is_empty() {
            return Err(VaultError::EmptyInput("name"));
        }
        if plaintext.is_empty() {
            return Err(VaultError::EmptyInput("value"));
        }

        match &self.sealer {
            Sealer::Passphrase { value_key, .. } => {
                encryption::seal_value(value_key, name, plaintext)
            }
            Sealer::Recipient { recipient, .. } => {
                recipient::seal(recipient, &value_context(name), plaintext)
            }
        }
    }

    /// Open a sealed entry value.  Fails with `AuthenticationFailure` if
    /// it was sealed for a different name.
    pub fn decrypt_value(&self, name: &str, sealed: &[u8]) -> Result<Vec<u8>> {
        if name.is_empty() {
            return Err(VaultError::EmptyInput("name"));
        }
        if sealed.is_empty() {
            return Err(VaultError::EmptyInput("ciphertext"));
        }
        self.check_tag(sealed)?;

        match &self.sealer {
            Sealer::Passphrase { value_key, .. } => encryption::open_value(value_key, name, sealed),
            Sealer::Recipient { identity, .. } => {
                recipient::open(identity, &value_context(name), sealed)
            }
        }
    }

    /// Produce a fresh test sentinel blob for this key material.
    pub fn sentinel(&self) -> Result<Vec<u8>> {
        self.encrypt_value(SENTINEL_NAME, SENTINEL_MARKER)
    }

    /// Check that this key material opens a recorded sentinel.
    pub fn verify_sentinel(&self, blob: &[u8]) -> Result<()> {
        let marker = self.decrypt_value(SENTINEL_NAME, blob)?;
        let matches: bool =
            marker.len() == SENTINEL_MARKER.len() && bool::from(marker.ct_eq(SENTINEL_MARKER));
        if matches {
            Ok(())
        } else {
            Err(VaultError::AuthenticationFailure)
        }
    }

    fn check_tag(&self, sealed: &[u8]) -> Result<()> {
        let expected = self.scheme();
        match Scheme::from_tag(sealed[0]) {
            Some(found) if found == expected => Ok(()),
            Some(found) => Err(VaultError::SchemeMismatch {
                expected: expected.tag(),
                found: found.tag(),
            }),
            None => Err(VaultError::CorruptData(format!(
                "unknown scheme tag {:#04x}",
                sealed[0]
            ))),
        }
    }
}

fn value_context(name: &str) -> Vec<u8> {
    let mut context = Vec::with_capacity(6 + name.len());
    context.extend_from_slice(b"value:");
    context.extend_from_slice(name.as_bytes());
    context
}
