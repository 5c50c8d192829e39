//! AES-256-GCM sealing under the passphrase-derived subkeys.
//!
//! Nonces are never random here: names use `name_nonce()` under the name
//! key and values use `value_nonce(name)` under the value key.  The
//! functions take the typed subkeys, so a name key cannot seal a value.
//!
//! Layout of a sealed blob:
//!   [ 1-byte scheme tag | ciphertext + 16-byte auth tag ]
//!
//! The scheme tag is also the AEAD associated data.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};

use super::keys::{name_nonce, value_nonce, NameKey, ValueKey, NONCE_LEN, SUBKEY_LEN};
use crate::errors::{Result, VaultError};
use crate::types::Scheme;

const TAG: u8 = Scheme::Passphrase.tag();

/// Seal an entry name under the name key.
pub fn seal_name(key: &NameKey, name: &[u8]) -> Result<Vec<u8>> {
    seal(key.as_bytes(), &name_nonce(), name)
}

/// Open a sealed entry name.
pub fn open_name(key: &NameKey, sealed: &[u8]) -> Result<Vec<u8>> {
    open(key.as_bytes(), &name_nonce(), sealed)
}

/// Seal an entry value under the value key, with the nonce bound to `name`.
pub fn seal_value(key: &ValueKey, name: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
    seal(key.as_bytes(), &value_nonce(name), plaintext)
}

/// Open a sealed entry value; fails unless `name` is the one it was sealed for.
pub fn open_value(key: &ValueKey, name: &str, sealed: &[u8]) -> Result<Vec<u8>> {
    open(key.as_bytes(), &value_nonce(name), sealed)
}

fn seal(key: &[u8; SUBKEY_LEN], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad: &[TAG],
            },
        )
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(1 + ciphertext.len());
    output.push(TAG);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

fn open(key: &[u8; SUBKEY_LEN], nonce: &[u8; NONCE_LEN], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < Scheme::Passphrase.min_sealed_len() || sealed[0] != TAG {
        return Err(VaultError::AuthenticationFailure);
    }

    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::AuthenticationFailure)?;

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: &sealed[1..],
                aad: &[TAG],
            },
        )
        .map_err(|_| VaultError::AuthenticationFailure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::derive_subkeys;

    #[test]
    fn name_sealing_is_deterministic() {
        let (name_key, _) = derive_subkeys(b"passphrase-1");
        let a = seal_name(&name_key, b"/mail/work").unwrap();
        let b = seal_name(&name_key, b"/mail/work").unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0], TAG);
    }

    #[test]
    fn value_sealed_for_one_name_does_not_open_under_another() {
        let (_, value_key) = derive_subkeys(b"passphrase-1");
        let sealed = seal_value(&value_key, "/a", b"secret").unwrap();
        assert_eq!(open_value(&value_key, "/a", &sealed).unwrap(), b"secret");
        assert!(matches!(
            open_value(&value_key, "/b", &sealed),
            Err(VaultError::AuthenticationFailure)
        ));
    }

    #[test]
    fn name_key_cannot_open_value() {
        let (name_key, value_key) = derive_subkeys(b"passphrase-1");
        let sealed = seal_value(&value_key, "/a", b"secret").unwrap();
        assert!(open_name(&name_key, &sealed).is_err());
    }

    #[test]
    fn truncated_blob_fails() {
        let (name_key, _) = derive_subkeys(b"passphrase-1");
        assert!(open_name(&name_key, &[TAG; 5]).is_err());
    }

    #[test]
    fn flipped_byte_fails() {
        let (name_key, _) = derive_subkeys(b"passphrase-1");
        let mut sealed = seal_name(&name_key, b"/x/y/z").unwrap();
        sealed[3] ^= 0xFF;
        assert!(matches!(
            open_name(&name_key, &sealed),
            Err(VaultError::AuthenticationFailure)
        ));
    }
}
