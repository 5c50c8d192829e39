//! `keyshard pwgen`: print random passwords.  Needs no vault.

use crate::errors::Result;
use crate::password::{self, PasswordPolicy};

/// Execute the `pwgen` command.
pub fn execute(count: usize, policy: &PasswordPolicy) -> Result<()> {
    for _ in 0..count {
        println!("{}", password::generate(policy)?.as_str());
    }
    Ok(())
}
