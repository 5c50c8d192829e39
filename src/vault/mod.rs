//! Vault module: sharded, file-per-entry secret storage.
//!
//! This module provides:
//! - The `Vault` capability every storage backend implements
//! - On-disk envelope framing (`envelope`) and shard layout (`layout`)
//! - The filesystem backend `FileVault` (`file_vault`)
//! - The plaintext `Payload`/`Entry` model (`entry`)

pub mod atomic;
pub mod entry;
pub mod envelope;
pub mod file_vault;
pub mod layout;

// Re-export the most commonly used items.
pub use entry::{Entry, Payload};
pub use envelope::SealedEntry;
pub use file_vault::FileVault;

use crate::errors::Result;
use crate::types::KeyId;

/// Storage capability consumed by the context and the rotation workflow.
///
/// A vault only ever sees sealed bytes and lookup identifiers; it never
/// holds key material and never learns a plaintext name.
pub trait Vault {
    /// Identifiers of every stored entry, sorted.
    fn list_keys(&self) -> Result<Vec<KeyId>>;

    /// The sealed name and sealed value stored under `id`.
    fn get_key(&self, id: &KeyId) -> Result<SealedEntry>;

    /// Create or wholesale replace the entry stored under `id`.
    fn set_key(&self, id: &KeyId, sealed_name: &[u8], sealed_value: &[u8]) -> Result<()>;

    /// Remove the entry stored under `id`.
    fn delete_key(&self, id: &KeyId) -> Result<()>;

    fn set_test_key(&self, blob: &[u8]) -> Result<()>;

    fn get_test_key(&self) -> Result<Vec<u8>>;

    fn close(&mut self) -> Result<()>;
}
