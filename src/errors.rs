use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in keyshard.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Validation errors ---
    #[error("Empty input: {0} must not be empty")]
    EmptyInput(&'static str),

    #[error("Invalid vault name: {0}")]
    InvalidName(String),

    #[error("Invalid key name: {0} (must start with '/' and look like a file path)")]
    InvalidKeyName(String),

    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    #[error("Invalid password policy: {0}")]
    InvalidPolicy(String),

    #[error("Resource limit exceeded: {0}")]
    ResourceLimit(String),

    // --- Crypto errors ---
    #[error("Authentication failed: wrong key material, wrong name, or tampered data")]
    AuthenticationFailure,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Sealed data uses scheme {found:#04x}, but this vault uses {expected:#04x}")]
    SchemeMismatch { expected: u8, found: u8 },

    // --- Storage errors ---
    #[error("Key {0} not found")]
    NotFound(String),

    #[error("Key {0} already exists (use --force to overwrite)")]
    AlreadyExists(String),

    #[error("Corrupt data: {0}")]
    CorruptData(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Config errors ---
    #[error("Vault config not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- Rotation errors ---
    #[error("Rotation degraded: {rotated} entries rotated, {failed} failed (config backup at {})", backup.display())]
    PartialFailure {
        rotated: usize,
        failed: usize,
        backup: PathBuf,
    },

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Password mismatch: passwords do not match")]
    PasswordMismatch,
}

impl VaultError {
    /// Whether a concurrent writer could have caused this error.
    ///
    /// A reader that overlaps an in-progress write may observe a truncated
    /// file; such reads are worth repeating, everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::CorruptData(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}

/// Convenience type alias for keyshard results.
pub type Result<T> = std::result::Result<T, VaultError>;
