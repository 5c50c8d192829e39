//! The per-vault configuration record.
//!
//! Stored as JSON at `<config dir>/<vault name>.json`:
//!
//! ```json
//! { "name": "default", "address": "file:///home/me/.keyshard/default",
//!   "encryption_key": "..." }
//! ```
//!
//! Keypair vaults carry `"keys": { "pub": "age1...", "priv": "AGE-SECRET-KEY-1..." }`
//! instead of `encryption_key`.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use zeroize::Zeroizing;

use super::validate::validate_vault_name;
use crate::crypto::KeyMaterial;
use crate::errors::{Result, VaultError};
use crate::vault::atomic::{create_dir_private, unused_path, write_atomic};

/// Only local storage is supported.
pub const FILE_SCHEME: &str = "file://";

/// Placeholder in an address that is replaced by the vault name.
pub const VAULT_PLACEHOLDER: &str = "{{vault}}";

/// Directory name under `$HOME` used when no config dir is given.
pub const DEFAULT_CONFIG_DIR_NAME: &str = ".keyshard";

/// An asymmetric keypair as stored in the config record.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredKeys {
    #[serde(rename = "pub")]
    pub public: String,
    #[serde(rename = "priv")]
    pub private: String,
}

/// Which key material to use and where the entries live.
#[derive(Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    pub name: String,

    /// `file://` URL of the storage root.
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<StoredKeys>,
}

impl VaultConfig {
    /// Build a record for a new vault, expanding `{{vault}}` in `address`.
    pub fn new(name: &str, address: &str, material: &KeyMaterial) -> Result<Self> {
        validate_vault_name(name)?;

        let address = address.replace(VAULT_PLACEHOLDER, name);
        parse_file_address(&address)?;

        let (encryption_key, keys) = match material {
            KeyMaterial::Passphrase(passphrase) => (Some(passphrase.to_string()), None),
            KeyMaterial::Recipient { public, private } => (
                None,
                Some(StoredKeys {
                    public: public.clone(),
                    private: private.to_string(),
                }),
            ),
        };

        Ok(Self {
            name: name.to_string(),
            address,
            encryption_key,
            keys,
        })
    }

    /// Default config directory: `$HOME/.keyshard`.
    pub fn default_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_CONFIG_DIR_NAME))
            .ok_or_else(|| VaultError::ConfigError("cannot determine home directory".into()))
    }

    /// Default storage address: a directory named after the vault next to
    /// its config record.
    pub fn default_address(config_dir: &Path) -> String {
        format!(
            "{FILE_SCHEME}{}",
            config_dir.join(VAULT_PLACEHOLDER).display()
        )
    }

    /// Path of the record for vault `name`.
    pub fn path(config_dir: &Path, name: &str) -> PathBuf {
        config_dir.join(format!("{name}.json"))
    }

    /// Load and validate the record for vault `name`.
    pub fn load(config_dir: &Path, name: &str) -> Result<Self> {
        validate_vault_name(name)?;
        let path = Self::path(config_dir, name);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(VaultError::ConfigNotFound(path))
            }
            Err(e) => return Err(e.into()),
        };

        let config: VaultConfig = serde_json::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", path.display()))
        })?;

        if config.name != name {
            return Err(VaultError::ConfigError(format!(
                "{} describes vault '{}', expected '{name}'",
                path.display(),
                config.name
            )));
        }
        // Fail early on a record with no usable material or address.
        config.key_material()?;
        config.storage_root()?;

        Ok(config)
    }

    /// Write the record atomically with owner-only permissions.
    pub fn save(&self, config_dir: &Path) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::SerializationError(e.to_string()))?;

        create_dir_private(config_dir)?;
        let path = Self::path(config_dir, &self.name);
        write_atomic(&path, json.as_bytes())?;
        Ok(path)
    }

    /// Copy the record on disk to `<name>.json.backup.<unix ts>`, with a
    /// `.<n>` counter if that name is taken.
    ///
    /// If no record exists yet, the in-memory one is written instead.
    pub fn backup(&self, config_dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
        let source = Self::path(config_dir, &self.name);
        let backup = unused_path(
            config_dir.join(format!("{}.json.backup.{}", self.name, now.timestamp())),
        );

        let bytes = match fs::read(&source) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Zeroizing::new(
                serde_json::to_vec_pretty(self)
                    .map_err(|e| VaultError::SerializationError(e.to_string()))?,
            ),
            Err(e) => return Err(e.into()),
        };

        create_dir_private(config_dir)?;
        write_atomic(&backup, &bytes)?;
        info!(backup = %backup.display(), "backed up vault config");
        Ok(backup)
    }

    /// Filesystem path of the storage root.
    pub fn storage_root(&self) -> Result<PathBuf> {
        parse_file_address(&self.address)
    }

    /// The key material this record describes.  Exactly one of
    /// `encryption_key` and `keys` must be set.
    pub fn key_material(&self) -> Result<KeyMaterial> {
        match (&self.encryption_key, &self.keys) {
            (Some(key), None) => Ok(KeyMaterial::passphrase(key.as_str())),
            (None, Some(keys)) => Ok(KeyMaterial::Recipient {
                public: keys.public.clone(),
                private: Zeroizing::new(keys.private.clone()),
            }),
            (Some(_), Some(_)) => Err(VaultError::InvalidKeyMaterial(
                "config sets both encryption_key and keys".into(),
            )),
            (None, None) => Err(VaultError::InvalidKeyMaterial(
                "config has neither encryption_key nor keys".into(),
            )),
        }
    }

    /// Replace the key material, keeping name and address.
    pub fn with_material(&self, material: &KeyMaterial) -> Self {
        let mut next = self.clone();
        match material {
            KeyMaterial::Passphrase(passphrase) => {
                next.encryption_key = Some(passphrase.to_string());
                next.keys = None;
            }
            KeyMaterial::Recipient { public, private } => {
                next.encryption_key = None;
                next.keys = Some(StoredKeys {
                    public: public.clone(),
                    private: private.to_string(),
                });
            }
        }
        next
    }
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("name", &self.name)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

fn parse_file_address(address: &str) -> Result<PathBuf> {
    let Some(path) = address.strip_prefix(FILE_SCHEME) else {
        return Err(VaultError::ConfigError(format!(
            "unsupported address '{address}': only {FILE_SCHEME} is supported"
        )));
    };
    if path.is_empty() {
        return Err(VaultError::ConfigError(format!(
            "address '{address}' has no path"
        )));
    }
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn passphrase_config(dir: &Path) -> VaultConfig {
        VaultConfig::new(
            "default",
            &VaultConfig::default_address(dir),
            &KeyMaterial::passphrase("correct horse battery"),
        )
        .unwrap()
    }

    #[test]
    fn new_expands_the_vault_placeholder() {
        let tmp = TempDir::new().unwrap();
        let config = passphrase_config(tmp.path());
        assert_eq!(config.storage_root().unwrap(), tmp.path().join("default"));
        assert!(!config.address.contains(VAULT_PLACEHOLDER));
    }

    #[test]
    fn new_rejects_non_file_addresses() {
        let result = VaultConfig::new(
            "default",
            "s3://bucket/{{vault}}",
            &KeyMaterial::passphrase("x"),
        );
        assert!(matches!(result, Err(VaultError::ConfigError(_))));
    }

    #[test]
    fn save_then_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let config = passphrase_config(tmp.path());
        let path = config.save(tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join("default.json"));

        let loaded = VaultConfig::load(tmp.path(), "default").unwrap();
        assert_eq!(loaded.address, config.address);
        assert_eq!(loaded.encryption_key.as_deref(), Some("correct horse battery"));
        assert!(loaded.keys.is_none());
    }

    #[test]
    fn keypair_is_stored_as_pub_and_priv() {
        let tmp = TempDir::new().unwrap();
        let material = KeyMaterial::generate_recipient();
        let config =
            VaultConfig::new("work", &VaultConfig::default_address(tmp.path()), &material).unwrap();
        config.save(tmp.path()).unwrap();

        let raw = fs::read_to_string(tmp.path().join("work.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json["keys"]["pub"].as_str().unwrap().starts_with("age1"));
        assert!(json["keys"]["priv"]
            .as_str()
            .unwrap()
            .starts_with("AGE-SECRET-KEY-1"));
        assert!(json.get("encryption_key").is_none());

        let loaded = VaultConfig::load(tmp.path(), "work").unwrap();
        assert!(loaded.key_material().unwrap().same_as(&material));
    }

    #[test]
    fn load_missing_is_config_not_found() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            VaultConfig::load(tmp.path(), "nothere"),
            Err(VaultError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn load_rejects_records_without_material() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("bare.json"),
            r#"{"name":"bare","address":"file:///tmp/bare"}"#,
        )
        .unwrap();
        assert!(matches!(
            VaultConfig::load(tmp.path(), "bare"),
            Err(VaultError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn load_rejects_invalid_json() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.json"), "not json {{").unwrap();
        assert!(matches!(
            VaultConfig::load(tmp.path(), "broken"),
            Err(VaultError::ConfigError(_))
        ));
    }

    #[test]
    fn backup_copies_the_file_on_disk() {
        let tmp = TempDir::new().unwrap();
        let config = passphrase_config(tmp.path());
        config.save(tmp.path()).unwrap();

        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let backup = config.backup(tmp.path(), now).unwrap();

        assert_eq!(
            backup,
            tmp.path().join("default.json.backup.1700000000")
        );
        assert_eq!(
            fs::read(&backup).unwrap(),
            fs::read(tmp.path().join("default.json")).unwrap()
        );
    }

    #[test]
    fn with_material_switches_scheme() {
        let tmp = TempDir::new().unwrap();
        let config = passphrase_config(tmp.path());
        let next = config.with_material(&KeyMaterial::generate_recipient());
        assert!(next.encryption_key.is_none());
        assert!(next.keys.is_some());
        assert_eq!(next.address, config.address);
    }

    #[test]
    fn debug_does_not_print_secrets() {
        let tmp = TempDir::new().unwrap();
        let rendered = format!("{:?}", passphrase_config(tmp.path()));
        assert!(!rendered.contains("correct horse"));
    }
}
