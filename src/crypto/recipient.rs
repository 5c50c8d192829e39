//! Keypair sealing through age (X25519 encapsulation + ChaCha20-Poly1305).
//!
//! Every call encapsulates a fresh file key to the recipient, so sealing
//! is probabilistic.  age has no associated-data input, so the context
//! that distinguishes name sealing from value sealing travels inside the
//! encrypted payload and is checked in constant time on open:
//!
//! ```text
//! sealed  = [ 1-byte scheme tag | binary age file ]
//! payload = [ u16 BE context length | context | plaintext ]
//! ```

use std::io::{Read, Write};

use age::x25519;
use subtle::ConstantTimeEq;
use tracing::trace;

use crate::errors::{Result, VaultError};
use crate::types::Scheme;

const TAG: u8 = Scheme::Recipient.tag();

/// Parse an age keypair and check that the halves belong together.
pub fn parse_keypair(public: &str, private: &str) -> Result<(x25519::Recipient, x25519::Identity)> {
    let recipient: x25519::Recipient = public
        .trim()
        .parse()
        .map_err(|e| VaultError::InvalidKeyMaterial(format!("public key: {e}")))?;
    let identity: x25519::Identity = private
        .trim()
        .parse()
        .map_err(|e| VaultError::InvalidKeyMaterial(format!("private key: {e}")))?;

    if identity.to_public().to_string() != recipient.to_string() {
        return Err(VaultError::InvalidKeyMaterial(
            "public key does not match private key".into(),
        ));
    }

    Ok((recipient, identity))
}

/// Seal `plaintext` to `recipient`, binding it to `context`.
pub fn seal(recipient: &x25519::Recipient, context: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let context_len = u16::try_from(context.len()).map_err(|_| {
        VaultError::EncryptionFailed(format!("context length {} exceeds u16", context.len()))
    })?;

    let mut payload = Vec::with_capacity(2 + context.len() + plaintext.len());
    payload.extend_from_slice(&context_len.to_be_bytes());
    payload.extend_from_slice(context);
    payload.extend_from_slice(plaintext);

    let encryptor =
        age::Encryptor::with_recipients(std::iter::once(recipient as &dyn age::Recipient))
            .map_err(|e| VaultError::EncryptionFailed(e.to_string()))?;

    let mut output = vec![TAG];
    let mut writer = encryptor
        .wrap_output(&mut output)
        .map_err(|e| VaultError::EncryptionFailed(e.to_string()))?;
    writer.write_all(&payload)?;
    writer.finish()?;

    trace!(sealed_len = output.len(), "sealed to recipient");
    Ok(output)
}

/// Open a blob produced by `seal`; fails unless `context` matches.
pub fn open(identity: &x25519::Identity, context: &[u8], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < Scheme::Recipient.min_sealed_len() || sealed[0] != TAG {
        return Err(VaultError::AuthenticationFailure);
    }

    let decryptor =
        age::Decryptor::new(&sealed[1..]).map_err(|_| VaultError::AuthenticationFailure)?;
    let mut reader = decryptor
        .decrypt(std::iter::once(identity as &dyn age::Identity))
        .map_err(|_| VaultError::AuthenticationFailure)?;

    let mut payload = Vec::new();
    reader
        .read_to_end(&mut payload)
        .map_err(|_| VaultError::AuthenticationFailure)?;

    if payload.len() < 2 {
        return Err(VaultError::AuthenticationFailure);
    }
    let context_len = usize::from(u16::from_be_bytes([payload[0], payload[1]]));
    let body = &payload[2..];
    if body.len() < context_len {
        return Err(VaultError::AuthenticationFailure);
    }

    let (stored_context, plaintext) = body.split_at(context_len);
    let matches: bool = (stored_context.len() == context.len())
        && bool::from(stored_context.ct_eq(context));
    if !matches {
        return Err(VaultError::AuthenticationFailure);
    }

    Ok(plaintext.to_vec())
}
