//! `keyshard get`: print a single secret.

use crate::cli::{open_context, Cli};
use crate::errors::Result;

/// Execute the `get` command.
pub fn execute(cli: &Cli, name: &str) -> Result<()> {
    let ctx = open_context(cli)?;

    // Decrypt and print the secret to stdout.
    let payload = ctx.get(name)?;
    println!("{}", payload.data);

    ctx.close()
}
