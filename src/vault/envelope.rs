//! On-disk envelope framing.
//!
//! One entry file holds a URL-safe, unpadded base64 encoding of:
//!
//! ```text
//! [sealed-name length: 4 bytes BE][sealed name][sealed value]
//! ```
//!
//! - The declared length must be non-zero and fit inside the remaining
//!   bytes; anything else is corruption, never a different split.
//! - Sealed components start with a scheme tag.  A component with a
//!   known tag must meet that scheme's minimum size, and a value must
//!   carry the same tag as its name.

use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64;
use base64::Engine;

use crate::errors::{Result, VaultError};
use crate::types::Scheme;

/// Size of the length prefix.
const PREFIX_LEN: usize = 4;

/// The two sealed halves of one stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedEntry {
    pub sealed_name: Vec<u8>,
    pub sealed_value: Vec<u8>,
}

/// Frame and base64-encode an entry.
pub fn encode(sealed_name: &[u8], sealed_value: &[u8]) -> Result<String> {
    let name_len = u32::try_from(sealed_name.len()).map_err(|_| {
        VaultError::ResourceLimit(format!(
            "sealed name length {} exceeds u32::MAX",
            sealed_name.len()
        ))
    })?;

    let mut buf = Vec::with_capacity(PREFIX_LEN + sealed_name.len() + sealed_value.len());
    buf.extend_from_slice(&name_len.to_be_bytes()); // 4 bytes BE
    buf.extend_from_slice(sealed_name);
    buf.extend_from_slice(sealed_value);

    Ok(BASE64.encode(&buf))
}

/// Decode and unframe the contents of an entry file.
pub fn decode(encoded: &[u8]) -> Result<SealedEntry> {
    let data = decode_blob(encoded)?;

    if data.len() < PREFIX_LEN {
        return Err(VaultError::CorruptData("envelope too short".into()));
    }

    let name_len_u32 = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let name_len = usize::try_from(name_len_u32).map_err(|_| {
        VaultError::CorruptData(format!(
            "declared length {name_len_u32} exceeds platform address space"
        ))
    })?;

    // A sealed name always carries at least its scheme tag.
    if name_len == 0 {
        return Err(VaultError::CorruptData("declared name length is zero".into()));
    }

    let remaining = data.len() - PREFIX_LEN;
    if name_len > remaining {
        return Err(VaultError::CorruptData(format!(
            "declared name length {name_len} exceeds the {remaining} bytes that follow"
        )));
    }

    let name_end = PREFIX_LEN + name_len;
    let entry = SealedEntry {
        sealed_name: data[PREFIX_LEN..name_end].to_vec(),
        sealed_value: data[name_end..].to_vec(),
    };
    check_components(&entry)?;

    Ok(entry)
}

/// Base64-encode an unframed blob (the test sentinel).
pub fn encode_blob(blob: &[u8]) -> String {
    BASE64.encode(blob)
}

/// Decode an unframed blob, tolerating trailing whitespace.
pub fn decode_blob(encoded: &[u8]) -> Result<Vec<u8>> {
    BASE64
        .decode(encoded.trim_ascii_end())
        .map_err(|e| VaultError::CorruptData(format!("invalid base64: {e}")))
}

fn check_components(entry: &SealedEntry) -> Result<()> {
    let name_scheme = check_floor("name", &entry.sealed_name)?;
    let value_scheme = check_floor("value", &entry.sealed_value)?;

    if let Some(name_scheme) = name_scheme {
        if !entry.sealed_value.is_empty() && value_scheme != Some(name_scheme) {
            return Err(VaultError::CorruptData(format!(
                "sealed value does not carry the {} scheme tag of its name",
                name_scheme.name()
            )));
        }
    }
    Ok(())
}

fn check_floor(what: &str, component: &[u8]) -> Result<Option<Scheme>> {
    let Some(scheme) = component.first().copied().and_then(Scheme::from_tag) else {
        return Ok(None);
    };
    let min = scheme.min_sealed_len();
    if component.len() < min {
        return Err(VaultError::CorruptData(format!(
            "sealed {what} is {} bytes, {} scheme needs at least {min}",
            component.len(),
            scheme.name()
        )));
    }
    Ok(Some(scheme))
}
