//! CLI argument definitions
//!
//! All Clap derive structs for `era5cfg` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Load and validate ERA5 retrieval and postprocessing configurations.
#[derive(Parser, Debug)]
#[command(name = "era5cfg", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "ERA5CFG_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true, env = "ERA5CFG_LOG_FORMAT")]
    pub log_format: LogFormat,
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration files and report every problem found.
    Validate(ValidateArgs),

    /// Load one configuration, apply overrides, and print it.
    Show(ShowArgs),

    /// Print the accepted keys, their types and defaults.
    Schema(SchemaArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,

    /// Also check that tmpdir and storedir exist and are writable.
    #[arg(long)]
    pub check_paths: bool,

    /// Create missing directories before checking them.
    #[arg(long, requires = "check_paths")]
    pub create_dirs: bool,
}

/// Arguments for `show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Path to YAML configuration file.
    #[arg(short, long, env = "ERA5CFG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of parallel processes (overrides the file).
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub nprocs: Option<u32>,

    /// Update the existing dataset instead of using year.begin/year.end.
    #[arg(short, long)]
    pub update: bool,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: ShowFormat,
}

/// Arguments for `schema`.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Output format for `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ShowFormat {
    /// Summary of the run.
    #[default]
    Human,
    /// Resolved configuration as YAML (reloadable; `$` written as `$$`).
    Yaml,
    /// Resolved configuration as JSON, escaped like the YAML form.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_files() {
        let result = Cli::try_parse_from(["era5cfg", "validate"]);
        assert!(result.is_err(), "Expected error for missing files");
    }

    #[test]
    fn test_validate_flags() {
        let cli = Cli::try_parse_from([
            "era5cfg",
            "validate",
            "a.yaml",
            "b.yaml",
            "--strict",
            "--check-paths",
            "--create-dirs",
            "--format",
            "json",
        ])
        .unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("Expected ValidateArgs");
        };
        assert_eq!(args.files.len(), 2);
        assert!(args.strict && args.check_paths && args.create_dirs);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_create_dirs_requires_check_paths() {
        let result = Cli::try_parse_from(["era5cfg", "validate", "a.yaml", "--create-dirs"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_show_overrides() {
        let cli =
            Cli::try_parse_from(["era5cfg", "show", "-c", "c.yaml", "-n", "8", "-u"]).unwrap();
        let Commands::Show(args) = cli.command else {
            panic!("Expected ShowArgs");
        };
        assert_eq!(args.nprocs, Some(8));
        assert!(args.update);
        assert_eq!(args.format, ShowFormat::Human);
    }

    #[test]
    fn test_show_rejects_zero_nprocs() {
        let result = Cli::try_parse_from(["era5cfg", "show", "-c", "c.yaml", "-n", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_help_output() {
        let err = Cli::try_parse_from(["era5cfg", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_output() {
        let err = Cli::try_parse_from(["era5cfg", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "era5cfg",
            "-vv",
            "--color",
            "never",
            "--log-format",
            "json",
            "schema",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_completions_shells_parse() {
        for shell in ["bash", "zsh", "fish", "powershell", "elvish"] {
            let cli = Cli::try_parse_from(["era5cfg", "completions", shell]);
            assert!(cli.is_ok(), "Failed to parse shell={shell}");
        }
    }
}
