//! Filesystem-backed vault.
//!
//! `FileVault` stores one envelope file per entry inside a two-level
//! shard tree (see `layout`) plus a `.test_key` sentinel at the root.
//! Every write is a single atomic file replace, so an entry's sealed
//! name and sealed value can never go out of sync.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::atomic::{create_dir_private, write_atomic};
use super::envelope::{self, SealedEntry};
use super::layout::{self, TEST_KEY_NAME};
use super::Vault;
use crate::errors::{Result, VaultError};
use crate::types::KeyId;

/// A vault rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileVault {
    root: PathBuf,
}

impl FileVault {
    /// Open a vault rooted at `root`.  No I/O happens until the first call.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the storage root (owner-only) and return the vault.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        create_dir_private(&root)?;
        Ok(Self { root })
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy an entry file byte-for-byte into another vault.
    ///
    /// Used to carry entries that cannot be opened across a rotation
    /// without ever parsing or rewriting them.
    pub fn copy_entry_to(&self, id: &KeyId, dest: &FileVault) -> Result<()> {
        let path = layout::key_path(id);
        let bytes = read_entry_file(&self.root.join(path.file()), id)?;

        let dest_dir = dest.root.join(&path.dir);
        create_dir_private(&dest_dir)?;
        write_atomic(&dest_dir.join(&path.file_name), &bytes)?;
        Ok(())
    }

    /// Remove every empty directory below the root in one post-order walk.
    ///
    /// The root itself is never removed.  Returns how many directories
    /// were deleted.
    pub fn prune_empty_dirs(&self) -> Result<usize> {
        let (_, removed) = prune_below(&self.root)?;
        if removed > 0 {
            debug!(removed, root = %self.root.display(), "pruned empty shard directories");
        }
        Ok(removed)
    }

    /// Remove now-empty shard directories above a deleted entry, stopping
    /// at the first non-empty one or at the root.
    fn prune_ancestors(&self, shard_dir: &Path) -> Result<()> {
        let mut dir = self.root.join(shard_dir);

        while dir != self.root && dir.starts_with(&self.root) {
            match fs::read_dir(&dir) {
                Ok(mut entries) => {
                    if entries.next().is_some() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            match fs::remove_dir(&dir) {
                Ok(()) => trace!(dir = %dir.display(), "removed empty shard directory"),
                // Another writer got there first or refilled it.
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(_) if has_entries(&dir) => break,
                Err(e) => return Err(e.into()),
            }

            if !dir.pop() {
                break;
            }
        }
        Ok(())
    }

    fn test_key_path(&self) -> PathBuf {
        self.root.join(TEST_KEY_NAME)
    }
}

impl Vault for FileVault {
    fn list_keys(&self) -> Result<Vec<KeyId>> {
        let mut ids = Vec::new();

        for shard1 in subdirectories(&self.root)? {
            for shard2 in subdirectories(&shard1)? {
                for entry in fs::read_dir(&shard2)? {
                    let entry = entry?;
                    if !entry.file_type()?.is_file() {
                        continue;
                    }
                    let file_name = entry.file_name();
                    let file_name = file_name.to_string_lossy();
                    if let Some(id) = layout::parse_file_name(&file_name) {
                        ids.push(id?);
                    }
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn get_key(&self, id: &KeyId) -> Result<SealedEntry> {
        let path = self.root.join(layout::key_path(id).file());
        let encoded = read_entry_file(&path, id)?;
        envelope::decode(&encoded)
    }

    fn set_key(&self, id: &KeyId, sealed_name: &[u8], sealed_value: &[u8]) -> Result<()> {
        let path = layout::key_path(id);
        let full_dir = self.root.join(&path.dir);
        layout::check_limits(&full_dir, &path.file_name)?;

        let encoded = envelope::encode(sealed_name, sealed_value)?;

        create_dir_private(&full_dir)?;
        write_atomic(&full_dir.join(&path.file_name), encoded.as_bytes())?;

        debug!(id = %id, bytes = encoded.len(), "stored entry");
        Ok(())
    }

    fn delete_key(&self, id: &KeyId) -> Result<()> {
        let path = layout::key_path(id);

        match fs::remove_file(self.root.join(path.file())) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(VaultError::NotFound(id.to_hex()))
            }
            Err(e) => return Err(e.into()),
        }

        self.prune_ancestors(&path.dir)?;
        debug!(id = %id, "deleted entry");
        Ok(())
    }

    fn set_test_key(&self, blob: &[u8]) -> Result<()> {
        create_dir_private(&self.root)?;
        write_atomic(&self.test_key_path(), envelope::encode_blob(blob).as_bytes())?;
        Ok(())
    }

    fn get_test_key(&self) -> Result<Vec<u8>> {
        let encoded = match fs::read(self.test_key_path()) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(VaultError::NotFound(TEST_KEY_NAME.into()))
            }
            Err(e) => return Err(e.into()),
        };
        envelope::decode_blob(&encoded)
    }

    fn close(&mut self) -> Result<()> {
        trace!(root = %self.root.display(), "closed file vault");
        Ok(())
    }
}

fn read_entry_file(path: &Path, id: &KeyId) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(VaultError::NotFound(id.to_hex())),
        Err(e) => Err(e.into()),
    }
}

fn has_entries(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Non-hidden subdirectories of `dir`.
fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

/// Post-order walk; returns whether `dir` ended up empty and how many
/// directories below it were removed.
fn prune_below(dir: &Path) -> Result<(bool, usize)> {
    let mut empty = true;
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            let child = entry.path();
            let (child_empty, child_removed) = prune_below(&child)?;
            removed += child_removed;
            if child_empty {
                fs::remove_dir(&child)?;
                removed += 1;
            } else {
                empty = false;
            }
        } else {
            empty = false;
        }
    }

    Ok((empty, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn id(seed: u8) -> KeyId {
        let mut bytes = [seed; 32];
        bytes[0] = seed.wrapping_mul(31);
        KeyId::from_bytes(bytes)
    }

    #[test]
    fn get_on_missing_entry_is_not_found() {
        let dir = TempDir::new().unwrap();
        let vault = FileVault::new(dir.path());
        assert!(matches!(vault.get_key(&id(1)), Err(VaultError::NotFound(_))));
    }

    #[test]
    fn list_on_missing_root_is_io_error() {
        let dir = TempDir::new().unwrap();
        let vault = FileVault::new(dir.path().join("missing"));
        assert!(matches!(vault.list_keys(), Err(VaultError::Io(_))));
    }

    #[test]
    fn list_ignores_sentinel_and_temp_files() {
        let dir = TempDir::new().unwrap();
        let vault = FileVault::new(dir.path());
        vault.set_key(&id(1), b"n", b"v").unwrap();
        vault.set_test_key(b"sentinel").unwrap();

        let shard = dir.path().join(layout::key_path(&id(1)).dir);
        fs::write(shard.join(".leftover.txt.tmp"), b"junk").unwrap();

        assert_eq!(vault.list_keys().unwrap(), vec![id(1)]);
    }

    #[test]
    fn list_reports_undecodable_file_names() {
        let dir = TempDir::new().unwrap();
        let vault = FileVault::new(dir.path());
        let shard = dir.path().join("ab").join("cd");
        fs::create_dir_all(&shard).unwrap();
        fs::write(shard.join("not-hex.txt"), b"x").unwrap();
        assert!(matches!(vault.list_keys(), Err(VaultError::CorruptData(_))));
    }

    #[test]
    fn prune_empty_dirs_walks_deep_trees() {
        let dir = TempDir::new().unwrap();
        let vault = FileVault::new(dir.path());
        fs::create_dir_all(dir.path().join("a/b/c/d/e")).unwrap();
        fs::create_dir_all(dir.path().join("x/y")).unwrap();
        fs::write(dir.path().join("x/keep.txt"), b"k").unwrap();

        let removed = vault.prune_empty_dirs().unwrap();

        assert_eq!(removed, 6);
        assert!(!dir.path().join("a").exists());
        assert!(dir.path().join("x").exists());
        assert!(!dir.path().join("x/y").exists());
        assert!(dir.path().exists());
    }

    #[test]
    fn copy_entry_to_preserves_bytes() {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();
        let src = FileVault::new(src_dir.path());
        let dst = FileVault::new(dst_dir.path());

        src.set_key(&id(9), b"name", b"value").unwrap();
        src.copy_entry_to(&id(9), &dst).unwrap();

        assert_eq!(dst.get_key(&id(9)).unwrap(), src.get_key(&id(9)).unwrap());
    }

    #[test]
    fn test_key_missing_is_not_found_and_bad_base64_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let vault = FileVault::new(dir.path());
        assert!(matches!(vault.get_test_key(), Err(VaultError::NotFound(_))));

        fs::write(dir.path().join(TEST_KEY_NAME), "invalid base64 encoded payload").unwrap();
        assert!(matches!(
            vault.get_test_key(),
            Err(VaultError::CorruptData(_))
        ));
    }

    #[test]
    fn close_is_ok() {
        let mut vault = FileVault::new("");
        assert!(vault.close().is_ok());
    }
}
