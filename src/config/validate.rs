//! Vault-name and entry-name validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{Result, VaultError};

/// Shortest allowed entry name, including the leading slash.
pub const MIN_KEY_NAME_LEN: usize = 3;

/// Longest allowed entry name.
pub const MAX_KEY_NAME_LEN: usize = 128;

static VAULT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-zA-Z._-]{3,32}$").expect("vault name pattern"));

static KEY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/[0-9a-zA-Z._-]+(/[0-9a-zA-Z._-]+)*$").expect("key name pattern"));

/// Validate a vault name: 3-32 characters from `[0-9a-zA-Z._-]`.
pub fn validate_vault_name(name: &str) -> Result<()> {
    if !VAULT_NAME.is_match(name) {
        return Err(VaultError::InvalidName(format!(
            "'{name}' must be 3-32 characters of letters, digits, '.', '_' or '-'"
        )));
    }
    Ok(())
}

/// Validate an entry name such as `/services/github`.
pub fn validate_key_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if !(MIN_KEY_NAME_LEN..=MAX_KEY_NAME_LEN).contains(&len) {
        return Err(VaultError::InvalidKeyName(format!(
            "'{name}' is {len} characters, expected {MIN_KEY_NAME_LEN}-{MAX_KEY_NAME_LEN}"
        )));
    }
    if !KEY_NAME.is_match(name) {
        return Err(VaultError::InvalidKeyName(name.to_string()));
    }
    // No `.` or `..` path segments.
    if name.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(VaultError::InvalidKeyName(name.to_string()));
    }
    Ok(())
}
