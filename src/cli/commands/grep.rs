//! `keyshard grep`: case-insensitive search over decrypted values.

use crate::cli::output;
use crate::cli::{open_context, Cli};
use crate::errors::Result;

/// Execute the `grep` command.
pub fn execute(cli: &Cli, pattern: &str) -> Result<()> {
    let ctx = open_context(cli)?;

    let matches = ctx.grep(pattern)?;
    if matches.is_empty() {
        output::info(&format!("No values match {pattern}"));
    }
    for (name, value) in &matches {
        println!("{name}: {value}");
    }

    ctx.close()
}
