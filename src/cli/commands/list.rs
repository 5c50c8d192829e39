//! `keyshard list`: print entry names.

use crate::cli::output;
use crate::cli::{open_context, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, prefix: Option<&str>) -> Result<()> {
    let ctx = open_context(cli)?;

    let names = ctx.list(prefix)?;
    let hint = match prefix {
        Some(prefix) => format!("No entries start with {prefix}"),
        None => "No entries in this vault yet.".to_string(),
    };
    output::names(&names, &hint);

    ctx.close()
}
