//! Subcommand implementations.
//!
//! Each command prints its result to stdout. Errors are returned to `main`,
//! which reports them and prints a user-facing message.

pub mod account;
pub mod catalog;
pub mod order;
