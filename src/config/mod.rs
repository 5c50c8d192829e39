//! Vault configuration records and name validation.

pub mod validate;
pub mod vault_config;

pub use validate::{validate_key_name, validate_vault_name};
pub use vault_config::{StoredKeys, VaultConfig};
