//! `keyshard generate`: store a freshly generated password.

use crate::cli::output;
use crate::cli::{open_context, Cli};
use crate::config::validate_key_name;
use crate::errors::{Result, VaultError};
use crate::password::{self, PasswordPolicy};
use crate::vault::Payload;

/// Execute the `generate` command.
pub fn execute(cli: &Cli, name: &str, force: bool, policy: &PasswordPolicy) -> Result<()> {
    validate_key_name(name)?;
    let ctx = open_context(cli)?;

    if !force && ctx.contains(name)? {
        return Err(VaultError::AlreadyExists(name.to_string()));
    }

    let secret = password::generate(policy)?;
    ctx.insert(name, &Payload::new(secret.as_str()), force)?;
    output::success(&format!("Generated a {}-character password for {name}", policy.length));

    ctx.close()
}
