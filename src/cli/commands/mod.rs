//! One module per subcommand.  Each exposes an `execute` function.

pub mod copy;
pub mod delete;
pub mod edit;
pub mod find;
pub mod generate;
pub mod get;
pub mod grep;
pub mod init;
pub mod insert;
pub mod list;
pub mod move_cmd;
pub mod pwgen;
pub mod rotate;
