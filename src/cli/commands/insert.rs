//! `keyshard insert`: store a secret under a name.

use crate::cli::output;
use crate::cli::{open_context, read_secret, Cli};
use crate::config::validate_key_name;
use crate::errors::{Result, VaultError};
use crate::vault::Payload;

/// Execute the `insert` command.
pub fn execute(cli: &Cli, name: &str, force: bool, multiline: bool) -> Result<()> {
    validate_key_name(name)?;
    let ctx = open_context(cli)?;

    // Refuse before prompting, not after.
    if !force && ctx.contains(name)? {
        return Err(VaultError::AlreadyExists(name.to_string()));
    }

    let secret = read_secret(name, multiline)?;
    let replaced = ctx.insert(name, &Payload::new(secret.as_str()), force)?;

    if replaced {
        output::success(&format!("Updated {name}"));
    } else {
        output::success(&format!("Stored {name}"));
    }

    ctx.close()
}
