//! Command-line interface
//!
//! Argument definitions and command handlers for the `era5cfg` binary.

pub mod args;
pub mod commands;

pub use args::Cli;
pub use commands::dispatch;
