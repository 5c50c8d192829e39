//! Mapping from lookup identifiers to sharded file paths.
//!
//! ```text
//! <root>/<rev[0..2]>/<rev[2..4]>/<hex(id)>.txt
//! ```
//!
//! `rev` is the hex encoding of the identifier with its bytes reversed.
//! Identifiers are uniform hashes, so two hex characters per level keep
//! every shard directory roughly the same size.

use std::path::{Path, PathBuf};

use crate::errors::{Result, VaultError};
use crate::types::KeyId;

/// Extension of entry files.
pub const FILE_EXTENSION: &str = "txt";

/// Name of the test sentinel file at the storage root.
pub const TEST_KEY_NAME: &str = ".test_key";

/// Longest entry path we are willing to create.
pub const MAX_PATH_LEN: usize = 4096;

/// Longest file name most filesystems accept.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Relative location of one entry under the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    /// `<shard1>/<shard2>`
    pub dir: PathBuf,
    /// `<hex(id)>.txt`
    pub file_name: String,
}

impl KeyPath {
    /// Relative path of the entry file.
    pub fn file(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// Compute the shard directories and file name for `id`.
pub fn key_path(id: &KeyId) -> KeyPath {
    let reversed = id.to_reversed_hex();
    let dir = Path::new(&reversed[0..2]).join(&reversed[2..4]);
    KeyPath {
        dir,
        file_name: format!("{}.{FILE_EXTENSION}", id.to_hex()),
    }
}

/// Recover the identifier from an entry file name, or `None` if the file
/// is not an entry file at all (temp files, dot-files, other extensions).
pub fn parse_file_name(file_name: &str) -> Option<Result<KeyId>> {
    if file_name.starts_with('.') {
        return None;
    }
    let stem = file_name.strip_suffix(&format!(".{FILE_EXTENSION}"))?;
    Some(KeyId::from_hex(stem))
}

/// Reject paths that would exceed OS limits.
pub fn check_limits(full_dir: &Path, file_name: &str) -> Result<()> {
    let dir_len = full_dir.as_os_str().len();
    if dir_len > MAX_PATH_LEN {
        return Err(VaultError::ResourceLimit(format!(
            "directory path is {dir_len} bytes, limit is {MAX_PATH_LEN}"
        )));
    }
    if file_name.len() > MAX_FILE_NAME_LEN {
        return Err(VaultError::ResourceLimit(format!(
            "file name is {} bytes, limit is {MAX_FILE_NAME_LEN}",
            file_name.len()
        )));
    }
    let path_len = full_dir.join(file_name).as_os_str().len();
    if path_len > MAX_PATH_LEN {
        return Err(VaultError::ResourceLimit(format!(
            "entry path is {path_len} bytes, limit is {MAX_PATH_LEN}"
        )));
    }
    Ok(())
}
