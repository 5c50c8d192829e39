//! `keyshard move`: rename an entry.

use crate::cli::output;
use crate::cli::{open_context, Cli};
use crate::errors::Result;

/// Execute the `move` command.
pub fn execute(cli: &Cli, from: &str, to: &str, force: bool) -> Result<()> {
    let ctx = open_context(cli)?;

    ctx.rename(from, to, force)?;
    output::success(&format!("Moved {from} to {to}"));

    ctx.close()
}
