//! `keyshard init`: create a new vault and its config record.

use crate::cli::output;
use crate::cli::{config_dir, key_material, Cli};
use crate::config::VaultConfig;
use crate::context::VaultContext;
use crate::errors::Result;

/// Execute the `init` command.
pub fn execute(
    cli: &Cli,
    address: Option<&str>,
    encryption_key: Option<&str>,
    asymmetric: bool,
) -> Result<()> {
    let config_dir = config_dir(cli)?;

    // 1. Resolve the storage address and key material.
    let address = match address {
        Some(address) => address.to_string(),
        None => VaultConfig::default_address(&config_dir),
    };
    let material = key_material(encryption_key, asymmetric)?;

    // 2. Create storage root, sentinel and config record.
    let ctx = VaultContext::init(&config_dir, &cli.vault, &address, &material)?;

    output::success(&format!(
        "Vault '{}' created at {}",
        cli.vault,
        ctx.store().root().display()
    ));
    if encryption_key.is_none() {
        output::info(&format!(
            "Generated key material is stored in {}",
            VaultConfig::path(&config_dir, &cli.vault).display()
        ));
    }
    output::tip("Store your first secret: keyshard insert /services/example");

    ctx.close()
}
