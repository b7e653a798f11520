//! Subcommand handlers.

pub mod init;
pub mod scan;
