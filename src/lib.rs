pub mod cli;
pub mod config;
pub mod context;
pub mod crypto;
pub mod errors;
pub mod password;
pub mod rotation;
pub mod types;
pub mod vault;
