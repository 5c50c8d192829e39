//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::VaultConfig;
use crate::context::VaultContext;
use crate::crypto::KeyMaterial;
use crate::errors::{Result, VaultError};
use crate::password::PasswordPolicy;

/// Passphrases this short or shorter are refused.
const MAX_WEAK_PASSPHRASE_LEN: usize = 8;

/// keyshard: a local secret store with individually sealed entries.
#[derive(Parser)]
#[command(
    name = "keyshard",
    about = "Local secret store with individually sealed, sharded entries",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault to operate on
    #[arg(long, default_value = "default", env = "KEYSHARD_VAULT", global = true)]
    pub vault: String,

    /// Directory holding vault config records (default: ~/.keyshard)
    #[arg(long, env = "KEYSHARD_CONFIG_DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault
    Init {
        /// Storage address; `{{vault}}` is replaced by the vault name
        /// (default: file://<config dir>/{{vault}})
        #[arg(long)]
        address: Option<String>,

        /// Passphrase to seal entries with (generated if omitted)
        #[arg(long, env = "KEYSHARD_ENCRYPTION_KEY", hide_env_values = true)]
        encryption_key: Option<String>,

        /// Use a generated X25519 keypair instead of a passphrase
        #[arg(long, conflicts_with = "encryption_key")]
        asymmetric: bool,
    },

    /// Store a secret
    #[command(visible_aliases = ["set", "add"])]
    Insert {
        /// Entry name (e.g. /services/github)
        name: String,
        /// Overwrite an existing entry
        #[arg(short, long)]
        force: bool,
        /// Read everything from stdin until EOF
        #[arg(short, long)]
        multiline: bool,
    },

    /// Replace the value of an existing entry
    Edit {
        /// Entry name
        name: String,
        /// Read everything from stdin until EOF
        #[arg(short, long)]
        multiline: bool,
    },

    /// Generate a random password and store it
    #[command(visible_alias = "gen")]
    Generate {
        /// Entry name
        name: String,
        /// Overwrite an existing entry
        #[arg(short, long)]
        force: bool,
        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Print random passwords without storing them
    Pwgen {
        /// How many passwords to print
        #[arg(short = 'n', long, default_value_t = 5)]
        count: usize,
        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Print a secret
    Get {
        /// Entry name
        name: String,
    },

    /// List entry names
    #[command(visible_alias = "ls")]
    List {
        /// Only show names starting with this prefix
        #[arg(short, long)]
        prefix: Option<String>,
    },

    /// Find entry names containing a pattern (case-insensitive)
    #[command(visible_alias = "search")]
    Find {
        pattern: String,
    },

    /// Find entries whose value contains a pattern (case-insensitive)
    Grep {
        pattern: String,
    },

    /// Delete an entry
    #[command(visible_alias = "rm")]
    Delete {
        /// Entry name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Rename an entry
    #[command(visible_alias = "mv")]
    Move {
        from: String,
        to: String,
        /// Overwrite an existing destination
        #[arg(short, long)]
        force: bool,
    },

    /// Copy an entry to a new name
    #[command(visible_alias = "cp")]
    Copy {
        from: String,
        to: String,
        /// Overwrite an existing destination
        #[arg(short, long)]
        force: bool,
    },

    /// Re-seal every entry under new key material
    Rotate {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,

        /// New passphrase (generated if omitted)
        #[arg(long, env = "KEYSHARD_NEW_ENCRYPTION_KEY", hide_env_values = true)]
        encryption_key: Option<String>,

        /// Rotate to a generated X25519 keypair
        #[arg(long, conflicts_with = "encryption_key")]
        asymmetric: bool,
    },
}

/// Password shape shared by `generate` and `pwgen`.
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct PolicyArgs {
    /// Password length
    #[arg(short, long, default_value_t = PasswordPolicy::default().length)]
    pub length: usize,

    /// Number of symbols
    #[arg(long, default_value_t = PasswordPolicy::default().symbols)]
    pub symbols: usize,

    /// Number of digits
    #[arg(long, default_value_t = PasswordPolicy::default().digits)]
    pub digits: usize,

    /// Letters only (ignores --symbols and --digits)
    #[arg(short = 's', long)]
    pub letters_only: bool,
}

impl PolicyArgs {
    pub fn policy(&self) -> PasswordPolicy {
        if self.letters_only {
            PasswordPolicy::letters_only(self.length)
        } else {
            PasswordPolicy {
                length: self.length,
                symbols: self.symbols,
                digits: self.digits,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Config directory from `--config-dir`, falling back to `~/.keyshard`.
pub fn config_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.config_dir {
        Some(dir) => Ok(dir.clone()),
        None => VaultConfig::default_dir(),
    }
}

/// Load the selected vault and verify its key material.
pub fn open_context(cli: &Cli) -> Result<VaultContext> {
    VaultContext::open(&config_dir(cli)?, &cli.vault)
}

/// Key material for `init` and `rotate`.
///
/// An explicit passphrase must be longer than 8 characters; without one
/// a random passphrase (or keypair with `asymmetric`) is generated.
pub fn key_material(passphrase: Option<&str>, asymmetric: bool) -> Result<KeyMaterial> {
    if asymmetric {
        return Ok(KeyMaterial::generate_recipient());
    }
    match passphrase {
        Some(p) if p.chars().count() <= MAX_WEAK_PASSPHRASE_LEN => {
            Err(VaultError::InvalidKeyMaterial(format!(
                "passphrase must be longer than {MAX_WEAK_PASSPHRASE_LEN} characters"
            )))
        }
        Some(p) => Ok(KeyMaterial::passphrase(p)),
        None => Ok(KeyMaterial::generate_passphrase()),
    }
}

/// Ask a yes/no question, defaulting to no.
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))
}

/// Read a secret value, trying in order:
/// 1. All of stdin when `multiline` is set
/// 2. One line of piped stdin
/// 3. Interactive hidden prompt with confirmation
pub fn read_secret(name: &str, multiline: bool) -> Result<Zeroizing<String>> {
    let value = if multiline {
        if io::stdin().is_terminal() {
            output::info(&format!("Enter contents for {name} (Ctrl+D to finish):"));
        }
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        Zeroizing::new(buf.strip_suffix('\n').unwrap_or(buf.as_str()).to_string())
    } else if !io::stdin().is_terminal() {
        let mut line = Zeroizing::new(String::new());
        io::stdin().read_line(&mut line)?;
        Zeroizing::new(line.trim_end_matches(['\n', '\r']).to_string())
    } else {
        let pw = dialoguer::Password::new()
            .with_prompt(format!("Enter secret for {name}"))
            .with_confirmation("Confirm secret", "Secrets do not match, try again")
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("secret prompt: {e}")))?;
        Zeroizing::new(pw)
    };

    if value.is_empty() {
        return Err(VaultError::EmptyInput("value"));
    }
    Ok(value)
}
