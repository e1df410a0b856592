//! Subcommand implementations

pub mod check;
pub mod filter;
