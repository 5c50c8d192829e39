//! `keyshard rotate`: re-seal every entry under new key material.
//!
//! Entries are re-sealed into a shadow root which replaces the live one
//! only after every entry was written.  The old root and config record
//! are kept as timestamped backups.

use chrono::Utc;

use crate::cli::output;
use crate::cli::{confirm, key_material, open_context, Cli};
use crate::errors::{Result, VaultError};
use crate::rotation::Rotation;

/// Execute the `rotate` command.
pub fn execute(
    cli: &Cli,
    force: bool,
    encryption_key: Option<&str>,
    asymmetric: bool,
) -> Result<()> {
    // 1. Open the vault with the current material.
    let ctx = open_context(cli)?;

    // 2. Collect and check the new material.
    let material = key_material(encryption_key, asymmetric)?;
    let rotation = Rotation::prepare(ctx, material)?.validate()?;

    if !force && !confirm(&format!("Re-seal every entry in '{}'?", cli.vault))? {
        output::info("Cancelled.");
        return Ok(());
    }

    // 3. Back up, re-seal into the shadow root, swap.
    let report = rotation
        .backup_config(Utc::now())?
        .reseal()?
        .commit()?;

    output::info(&format!(
        "Previous config saved to {}",
        report.config_backup.display()
    ));
    output::info(&format!(
        "Previous entries saved to {}",
        report.root_backup.display()
    ));

    if report.is_degraded() {
        output::warning(&format!(
            "{} entries could not be opened and are still sealed under the old key material",
            report.failed
        ));
        return Err(VaultError::PartialFailure {
            rotated: report.rotated,
            failed: report.failed,
            backup: report.config_backup,
        });
    }

    output::success(&format!(
        "Rotated '{}' ({} entries re-sealed)",
        cli.vault, report.rotated
    ));
    Ok(())
}
