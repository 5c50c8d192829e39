//! `keyshard find`: case-insensitive search over entry names.

use crate::cli::output;
use crate::cli::{open_context, Cli};
use crate::errors::Result;

/// Execute the `find` command.
pub fn execute(cli: &Cli, pattern: &str) -> Result<()> {
    let ctx = open_context(cli)?;

    let names = ctx.find(pattern)?;
    output::names(&names, &format!("No entries match {pattern}"));

    ctx.close()
}
