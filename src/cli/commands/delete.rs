//! `keyshard delete`: remove an entry.

use crate::cli::output;
use crate::cli::{confirm, open_context, Cli};
use crate::errors::Result;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, name: &str, force: bool) -> Result<()> {
    let ctx = open_context(cli)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force && !confirm(&format!("Delete {name}?"))? {
        output::info("Cancelled.");
        return ctx.close();
    }

    ctx.delete(name)?;
    output::success(&format!("Deleted {name}"));

    ctx.close()
}
