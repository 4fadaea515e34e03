//! Subcommand implementations.

pub mod check;
pub mod init;
pub mod list_checks;
pub mod output;
pub mod suggest;
