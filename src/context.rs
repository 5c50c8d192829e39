//! Per-invocation vault context.
//!
//! `VaultContext` bundles the loaded config, the encryptor built from its
//! key material, and the storage backend.  Commands build one and pass
//! it by reference; there is no process-wide state.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{validate_key_name, VaultConfig};
use crate::crypto::{Encryptor, KeyMaterial};
use crate::errors::{Result, VaultError};
use crate::types::KeyId;
use crate::vault::{Entry, FileVault, Payload, Vault};

/// Everything an entry operation needs.
pub struct VaultContext {
    config: VaultConfig,
    config_dir: PathBuf,
    encryptor: Encryptor,
    store: FileVault,
}

impl VaultContext {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a new vault: storage root, test sentinel and config record.
    ///
    /// Fails with `VaultAlreadyExists` if either the config record or the
    /// storage root is already present.
    pub fn init(
        config_dir: &Path,
        name: &str,
        address: &str,
        material: &KeyMaterial,
    ) -> Result<Self> {
        let config = VaultConfig::new(name, address, material)?;

        let config_path = VaultConfig::path(config_dir, name);
        if config_path.exists() {
            return Err(VaultError::VaultAlreadyExists(config_path));
        }
        let root = config.storage_root()?;
        if root.exists() {
            return Err(VaultError::VaultAlreadyExists(root));
        }

        // 1. Build the encryptor first so bad material never touches disk.
        let encryptor = Encryptor::new(material)?;

        // 2. Create the storage root and record the sentinel.
        let store = FileVault::create(&root)?;
        let sentinel = encryptor.sentinel()?;
        store.set_test_key(&sentinel)?;

        // 3. Read it back before committing the config.
        encryptor.verify_sentinel(&store.get_test_key()?)?;

        // 4. Persist the config record.
        config.save(config_dir)?;

        info!(vault = name, root = %root.display(), scheme = encryptor.scheme().name(), "initialized vault");

        Ok(Self {
            config,
            config_dir: config_dir.to_path_buf(),
            encryptor,
            store,
        })
    }

    /// Open an existing vault, failing fast if its key material does not
    /// open the recorded sentinel.
    pub fn open(config_dir: &Path, name: &str) -> Result<Self> {
        let config = VaultConfig::load(config_dir, name)?;
        let encryptor = Encryptor::new(&config.key_material()?)?;
        let store = FileVault::new(config.storage_root()?);

        encryptor.verify_sentinel(&store.get_test_key()?)?;
        debug!(vault = name, root = %store.root().display(), "opened vault");

        Ok(Self {
            config,
            config_dir: config_dir.to_path_buf(),
            encryptor,
            store,
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn encryptor(&self) -> &Encryptor {
        &self.encryptor
    }

    pub fn store(&self) -> &FileVault {
        &self.store
    }

    // ------------------------------------------------------------------
    // Entry operations
    // ------------------------------------------------------------------

    /// Whether an entry named `name` exists.
    pub fn contains(&self, name: &str) -> Result<bool> {
        validate_key_name(name)?;
        self.exists(&self.encryptor.key_id(name))
    }

    /// Store `payload` under `name`.  Returns whether an entry was replaced.
    pub fn insert(&self, name: &str, payload: &Payload, overwrite: bool) -> Result<bool> {
        validate_key_name(name)?;
        let id = self.encryptor.key_id(name);

        let existed = self.exists(&id)?;
        if existed && !overwrite {
            return Err(VaultError::AlreadyExists(name.to_string()));
        }

        self.write_entry(&id, name, &payload.to_bytes()?)?;
        Ok(existed)
    }

    /// Decrypt the value stored under `name`.
    pub fn get(&self, name: &str) -> Result<Payload> {
        validate_key_name(name)?;
        let plaintext = self.read_entry(name)?;
        Payload::from_bytes(&plaintext)
    }

    /// Decrypt an entry together with its name.
    pub fn entry(&self, name: &str) -> Result<Entry> {
        Ok(Entry {
            name: name.to_string(),
            payload: self.get(name)?,
        })
    }

    /// Sorted plaintext names, optionally restricted to a prefix.
    pub fn list(&self, prefix: Option<&str>) -> Result<Vec<String>> {
        let mut names = self.names()?;
        if let Some(prefix) = prefix {
            names.retain(|name| name.starts_with(prefix));
        }
        Ok(names)
    }

    /// Sorted plaintext names containing `pattern`, case-insensitively.
    pub fn find(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = pattern.to_lowercase();
        let mut names = self.names()?;
        names.retain(|name| name.to_lowercase().contains(&pattern));
        Ok(names)
    }

    /// Replace the payload of an existing entry.  Fails with `NotFound`
    /// if there is nothing stored under `name`.
    pub fn update(&self, name: &str, payload: &Payload) -> Result<()> {
        validate_key_name(name)?;
        let id = self.encryptor.key_id(name);
        if !self.exists(&id)? {
            return Err(VaultError::NotFound(name.to_string()));
        }
        self.write_entry(&id, name, &payload.to_bytes()?)
    }

    /// `(name, value)` pairs whose value contains `pattern`,
    /// case-insensitively, sorted by name.
    ///
    /// Entries whose value cannot be opened are skipped with a warning.
    pub fn grep(&self, pattern: &str) -> Result<Vec<(String, String)>> {
        let pattern = pattern.to_lowercase();
        let mut matches = Vec::new();

        for name in self.names()? {
            let payload = match self.read_entry(&name).and_then(|v| Payload::from_bytes(&v)) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(name = %name, error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if payload.data.to_lowercase().contains(&pattern) {
                matches.push((name, payload.data));
            }
        }

        Ok(matches)
    }

    /// Remove the entry stored under `name`.
    pub fn delete(&self, name: &str) -> Result<()> {
        validate_key_name(name)?;
        let id = self.encryptor.key_id(name);
        match self.store.delete_key(&id) {
            Err(VaultError::NotFound(_)) => Err(VaultError::NotFound(name.to_string())),
            other => other,
        }
    }

    /// Move an entry to a new name.
    pub fn rename(&self, from: &str, to: &str, overwrite: bool) -> Result<()> {
        self.copy(from, to, overwrite)?;
        self.delete(from)
    }

    /// Copy an entry to a new name, re-sealing the value for that name.
    pub fn copy(&self, from: &str, to: &str, overwrite: bool) -> Result<()> {
        validate_key_name(from)?;
        validate_key_name(to)?;
        if from == to {
            return Err(VaultError::InvalidKeyName(format!(
                "'{to}' is both source and destination"
            )));
        }

        let plaintext = self.read_entry(from)?;

        let to_id = self.encryptor.key_id(to);
        if self.exists(&to_id)? && !overwrite {
            return Err(VaultError::AlreadyExists(to.to_string()));
        }

        self.write_entry(&to_id, to, &plaintext)
    }

    /// Release the storage backend.
    pub fn close(mut self) -> Result<()> {
        self.store.close()
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    fn exists(&self, id: &KeyId) -> Result<bool> {
        match self.store.get_key(id) {
            Ok(_) => Ok(true),
            Err(VaultError::NotFound(_)) => Ok(false),
            // The file is there even if it does not parse.
            Err(VaultError::CorruptData(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    fn write_entry(&self, id: &KeyId, name: &str, plaintext: &[u8]) -> Result<()> {
        let sealed_name = self.encryptor.encrypt_key(name)?;
        let sealed_value = self.encryptor.encrypt_value(name, plaintext)?;
        self.store.set_key(id, &sealed_name, &sealed_value)
    }

    fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        let id = self.encryptor.key_id(name);
        let sealed = match self.store.get_key(&id) {
            Err(VaultError::NotFound(_)) => return Err(VaultError::NotFound(name.to_string())),
            other => other?,
        };

        let stored_name = self.encryptor.decrypt_key(&sealed.sealed_name)?;
        if stored_name != name {
            return Err(VaultError::CorruptData(format!(
                "entry stored under the identifier of '{name}' is named '{stored_name}'"
            )));
        }
        self.encryptor.decrypt_value(name, &sealed.sealed_value)
    }

    fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for id in self.store.list_keys()? {
            let sealed = self.store.get_key(&id)?;
            names.push(self.encryptor.decrypt_key(&sealed.sealed_name)?);
        }
        names.sort();
        Ok(names)
    }
}
