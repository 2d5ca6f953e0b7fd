//! Logging initialization for `era5cfg`.
//!
//! Events go to stderr so that stdout stays clean for reports, summaries and
//! completion scripts. `ERA5CFG_LOG_LEVEL` takes any `EnvFilter` directive
//! (e.g. `era5cfg::config=debug`) and wins over `-v`.

use std::io::IsTerminal;

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Cli, ColorChoice};

/// Environment variable that overrides the verbosity flags.
pub const LOG_LEVEL_ENV: &str = "ERA5CFG_LOG_LEVEL";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Compact lines, colored when the terminal allows it.
    #[default]
    Human,
    /// One JSON object per event, fields flattened to the top level.
    Json,
}

/// Logging choices taken from the global command-line flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    /// Output format
    pub format: LogFormat,
    /// Number of `-v` flags
    pub verbosity: u8,
    /// `--color` choice
    pub color: ColorChoice,
}

impl From<&Cli> for LogSettings {
    fn from(cli: &Cli) -> Self {
        Self {
            format: cli.log_format,
            verbosity: cli.verbose,
            color: cli.color,
        }
    }
}

impl LogSettings {
    /// Default filter directive for the verbosity level.
    ///
    /// No flag shows only warnings, which is where validation warnings from
    /// `show` end up; `-v` adds per-file progress.
    #[must_use]
    pub const fn directive(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Whether to emit ANSI escapes.
    ///
    /// `always` and `never` are unconditional; `auto` needs a terminal on
    /// stderr and no `NO_COLOR`. JSON output is never colored.
    #[must_use]
    pub const fn use_ansi(&self, stderr_is_terminal: bool, no_color: bool) -> bool {
        if matches!(self.format, LogFormat::Json) {
            return false;
        }
        match self.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => stderr_is_terminal && !no_color,
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new(self.directive()))
    }
}

/// Installs the global tracing subscriber.
///
/// Module targets are shown from `-vv` up. Uses `try_init()`, so a second
/// call (e.g. from tests) is a no-op.
pub fn init_logging(settings: &LogSettings) {
    let ansi = settings.use_ansi(
        std::io::stderr().is_terminal(),
        std::env::var_os("NO_COLOR").is_some(),
    );
    let show_target = settings.verbosity >= 2;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(settings.filter())
        .with_target(show_target)
        .with_writer(std::io::stderr);

    let _ = match settings.format {
        LogFormat::Human => builder.with_ansi(ansi).compact().try_init(),
        LogFormat::Json => builder
            .with_ansi(false)
            .json()
            .flatten_event(true)
            .try_init(),
    };
}
