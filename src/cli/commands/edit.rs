//! `keyshard edit`: replace the value of an existing entry.

use crate::cli::output;
use crate::cli::{open_context, read_secret, Cli};
use crate::config::validate_key_name;
use crate::errors::{Result, VaultError};
use crate::vault::Payload;

/// Execute the `edit` command.
pub fn execute(cli: &Cli, name: &str, multiline: bool) -> Result<()> {
    validate_key_name(name)?;
    let ctx = open_context(cli)?;

    // Nothing to edit: fail before prompting.
    if !ctx.contains(name)? {
        return Err(VaultError::NotFound(name.to_string()));
    }

    let secret = read_secret(name, multiline)?;
    ctx.update(name, &Payload::new(secret.as_str()))?;
    output::success(&format!("Updated {name}"));

    ctx.close()
}
