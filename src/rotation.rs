//! Key rotation.
//!
//! Rotation is a typestate pipeline, so steps can only run in order:
//!
//! ```text
//! Rotation::prepare -> validate -> backup_config -> reseal -> commit
//! ```
//!
//! `reseal` never touches the live storage root.  It writes every entry,
//! sealed under the new material, into a shadow root next to it
//! (`<root>.rotating`).  `commit` then swaps the roots with two renames
//! and saves the new config record, swapping back if that save fails.
//! Until `commit` runs the live vault stays fully readable under the
//! old material.
//!
//! There is no cross-process locking: entries written by another process
//! while `reseal` runs may be missing from the rotated vault.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::context::VaultContext;
use crate::crypto::{Encryptor, KeyMaterial};
use crate::errors::{Result, VaultError};
use crate::types::KeyId;
use crate::vault::atomic::unused_path;
use crate::vault::{FileVault, Vault};

/// Suffix of the shadow root written during `reseal`.
pub const SHADOW_SUFFIX: &str = "rotating";

/// Suffix (before the timestamp) of the retired storage root.  A `.<n>`
/// counter follows the timestamp when that name is already taken.
pub const BACKUP_SUFFIX: &str = "backup";

/// Outcome of a committed rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationReport {
    /// Entries re-sealed under the new material.
    pub rotated: usize,
    /// Entries that could not be opened and were carried over unchanged.
    pub failed: usize,
    /// Copy of the config record taken before rotation.
    pub config_backup: PathBuf,
    /// The storage root as it was before rotation.
    pub root_backup: PathBuf,
}

impl RotationReport {
    /// Whether some entries are still sealed under the old material.
    pub fn is_degraded(&self) -> bool {
        self.failed > 0
    }
}

/// Freshly collected new material.
pub struct Prepared;

/// New material checked against the current vault.
pub struct Validated;

/// Config record backed up.
pub struct ConfigBackedUp {
    config_backup: PathBuf,
    root_backup: PathBuf,
}

/// Every entry written into the shadow root.
pub struct Resealed {
    config_backup: PathBuf,
    root_backup: PathBuf,
    shadow: FileVault,
    rotated: usize,
    failed: usize,
}

/// A rotation in progress.  `S` is the last completed step.
pub struct Rotation<S> {
    ctx: VaultContext,
    material: KeyMaterial,
    next: Encryptor,
    state: S,
}

impl Rotation<Prepared> {
    /// Collect the new key material.  Fails with `InvalidKeyMaterial` if
    /// it cannot build an encryptor.
    pub fn prepare(ctx: VaultContext, material: KeyMaterial) -> Result<Self> {
        let next = Encryptor::new(&material)?;
        Ok(Self {
            ctx,
            material,
            next,
            state: Prepared,
        })
    }

    /// Check that the new material differs from the current one and that
    /// the current one still opens the vault's sentinel.
    pub fn validate(self) -> Result<Rotation<Validated>> {
        let current = self.ctx.config().key_material()?;
        if current.same_as(&self.material) {
            return Err(VaultError::InvalidKeyMaterial(
                "new key material is the same as the current one".into(),
            ));
        }

        let sentinel = self.ctx.store().get_test_key()?;
        self.ctx.encryptor().verify_sentinel(&sentinel)?;

        Ok(self.advance(Validated))
    }
}

impl Rotation<Validated> {
    /// Write a timestamped copy of the current config record and pick
    /// the name the live root will be retired under.
    pub fn backup_config(self, now: DateTime<Utc>) -> Result<Rotation<ConfigBackedUp>> {
        let config_backup = self.ctx.config().backup(self.ctx.config_dir(), now)?;
        let root_backup = unused_path(sibling(
            self.ctx.store().root(),
            &format!("{BACKUP_SUFFIX}.{}", now.timestamp()),
        ));
        Ok(self.advance(ConfigBackedUp {
            config_backup,
            root_backup,
        }))
    }
}

impl Rotation<ConfigBackedUp> {
    /// Re-seal every entry into the shadow root.
    ///
    /// An entry that cannot be opened under the old material is copied
    /// byte-for-byte and counted as failed; it is never dropped.  Any
    /// other error aborts the rotation and removes the shadow root.
    pub fn reseal(self) -> Result<Rotation<Resealed>> {
        let root = self.ctx.store().root().to_path_buf();
        let shadow_root = sibling(&root, SHADOW_SUFFIX);

        if shadow_root.exists() {
            warn!(shadow = %shadow_root.display(), "removing leftover shadow root from an earlier rotation");
            fs::remove_dir_all(&shadow_root)?;
        }
        let shadow = FileVault::create(&shadow_root)?;

        match self.fill_shadow(&shadow) {
            Ok((rotated, failed)) => {
                info!(rotated, failed, "re-sealed entries into shadow root");
                let ConfigBackedUp {
                    config_backup,
                    root_backup,
                } = self.state;
                Ok(Rotation {
                    ctx: self.ctx,
                    material: self.material,
                    next: self.next,
                    state: Resealed {
                        config_backup,
                        root_backup,
                        shadow,
                        rotated,
                        failed,
                    },
                })
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&shadow_root) {
                    warn!(error = %cleanup, "could not remove shadow root");
                }
                Err(e)
            }
        }
    }

    fn fill_shadow(&self, shadow: &FileVault) -> Result<(usize, usize)> {
        let mut rotated = 0;
        let mut failed = 0;

        for id in self.ctx.store().list_keys()? {
            match self.reseal_entry(&id, shadow) {
                Ok(()) => rotated += 1,
                Err(e) => {
                    warn!(id = %id, error = %e, "could not re-seal entry, carrying it over unchanged");
                    self.ctx.store().copy_entry_to(&id, shadow)?;
                    failed += 1;
                }
            }
        }

        shadow.set_test_key(&self.next.sentinel()?)?;
        Ok((rotated, failed))
    }

    fn reseal_entry(&self, id: &KeyId, shadow: &FileVault) -> Result<()> {
        let old = self.ctx.encryptor();
        let sealed = self.ctx.store().get_key(id)?;

        let name = old.decrypt_key(&sealed.sealed_name)?;
        if self.next.key_id(&name) != *id {
            return Err(VaultError::CorruptData(format!(
                "entry {id} does not hash to its own identifier"
            )));
        }
        let value = Zeroizing::new(old.decrypt_value(&name, &sealed.sealed_value)?);

        let sealed_name = self.next.encrypt_key(&name)?;
        let sealed_value = self.next.encrypt_value(&name, &value)?;
        shadow.set_key(id, &sealed_name, &sealed_value)?;

        debug!(id = %id, "re-sealed entry");
        Ok(())
    }
}

impl Rotation<Resealed> {
    /// Swap the shadow root into place and save the new config record.
    pub fn commit(self) -> Result<RotationReport> {
        let Resealed {
            config_backup,
            root_backup,
            shadow,
            rotated,
            failed,
        } = self.state;

        let root = self.ctx.store().root().to_path_buf();

        // 1. Retire the live root.
        fs::rename(&root, &root_backup)?;

        // 2. Move the shadow root into place.
        if let Err(e) = fs::rename(shadow.root(), &root) {
            restore(&root_backup, &root);
            return Err(e.into());
        }

        // 3. Point the config record at the new material.
        let config = self.ctx.config().with_material(&self.material);
        if let Err(e) = config.save(self.ctx.config_dir()) {
            if let Err(undo) = fs::rename(&root, shadow.root()) {
                warn!(error = %undo, "could not move rotated root aside");
            }
            restore(&root_backup, &root);
            return Err(e);
        }

        info!(
            rotated,
            failed,
            root_backup = %root_backup.display(),
            "rotation committed"
        );

        Ok(RotationReport {
            rotated,
            failed,
            config_backup,
            root_backup,
        })
    }
}

impl<S> Rotation<S> {
    fn advance<T>(self, state: T) -> Rotation<T> {
        Rotation {
            ctx: self.ctx,
            material: self.material,
            next: self.next,
            state,
        }
    }
}

/// Run every rotation step in order.
pub fn rotate(ctx: VaultContext, material: KeyMaterial, now: DateTime<Utc>) -> Result<RotationReport> {
    Rotation::prepare(ctx, material)?
        .validate()?
        .backup_config(now)?
        .reseal()?
        .commit()
}

/// `<parent>/<root name>.<suffix>`
fn sibling(root: &Path, suffix: &str) -> PathBuf {
    let mut name = root.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    root.with_file_name(name)
}

fn restore(root_backup: &Path, root: &Path) {
    if let Err(e) = fs::rename(root_backup, root) {
        warn!(
            error = %e,
            backup = %root_backup.display(),
            "could not restore storage root, move the backup back by hand"
        );
    }
}
