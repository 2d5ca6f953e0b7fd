//! Observability module
//!
//! Structured logging for `era5cfg` runs.

pub mod logging;

pub use logging::{LogFormat, LogSettings, init_logging};
