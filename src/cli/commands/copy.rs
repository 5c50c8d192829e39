//! `keyshard copy`: duplicate an entry under a new name.

use crate::cli::output;
use crate::cli::{open_context, Cli};
use crate::errors::Result;

/// Execute the `copy` command.
pub fn execute(cli: &Cli, from: &str, to: &str, force: bool) -> Result<()> {
    let ctx = open_context(cli)?;

    ctx.copy(from, to, force)?;
    output::success(&format!("Copied {from} to {to}"));

    ctx.close()
}
