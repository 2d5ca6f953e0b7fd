//! Error types for `era5cfg`
//!
//! Load-time failures are aggregated into a single [`ConfigError::SchemaError`]
//! so users see every problem in one pass. Directory problems are reported
//! later, as [`ConfigError::PathError`], by the collaborator that needs them.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `era5cfg` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, schema violation)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Declared directory missing or unwritable
    pub const PATH_ERROR: i32 = 4;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `era5cfg` operations.
#[derive(Debug, Error)]
pub enum Era5CfgError {
    /// Configuration loading, validation or directory error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Era5CfgError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(ConfigError::PathError { .. }) => ExitCode::PATH_ERROR,
            Self::Config(ConfigError::MissingFile { .. } | ConfigError::Unreadable { .. })
            | Self::Io(_) => ExitCode::IO_ERROR,
            Self::Config(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
            Self::Json(_) => ExitCode::ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be parsed
    #[error("parse error in {path}{}: {message}", line.map_or_else(String::new, |l| format!(" (line {l})")))]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// The document parsed but violates the schema
    #[error("{} schema violation(s) in {path}", issues.len())]
    SchemaError {
        /// Path to the configuration file
        path: String,
        /// Every error-severity issue found
        issues: Vec<ValidationIssue>,
    },

    /// Configuration file not found or unreadable
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Configuration file exists but could not be read
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        /// Path to the configuration file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A loader-level value is out of bounds (e.g. the file is too large)
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced with `${VAR:?msg}` is not set
    #[error("environment variable '{var}' not set ({message})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Message supplied after `:?`
        message: String,
    },

    /// A declared directory is missing or unwritable
    #[error("{key}: directory {} is unusable: {reason}", path.display())]
    PathError {
        /// Configuration key that declared the directory
        key: String,
        /// The offending directory
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// One or more files or directories failed validation
    #[error("{count} check(s) failed")]
    ValidationFailed {
        /// Number of failed files or directories
        count: usize,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// Category of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A required key is absent
    MissingKey,
    /// The value has the wrong YAML type
    WrongType,
    /// The value is not one of the allowed choices
    NotAllowed,
    /// A numeric value lies outside its range
    OutOfRange,
    /// A constraint spanning several fields is violated
    Invariant,
    /// The key is not part of the schema
    UnknownKey,
    /// Advisory check (never fatal by itself)
    Advisory,
}

/// A single validation issue found while walking the schema.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    /// Key path of the problematic value (e.g. `year.begin`, `area[2]`)
    pub path: String,
    /// Category of the issue
    pub kind: IssueKind,
    /// Description of the validation issue
    pub message: String,
    /// The constraint that was expected, when one applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// The offending value as it appeared in the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{prefix}: {} at {}", self.message, self.path)?;
        if let Some(expected) = &self.expected {
            write!(f, " (expected {expected}")?;
            if let Some(actual) = &self.actual {
                write!(f, ", got {actual}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Prevents the configuration from being built
    Error,
    /// Reported to the user, configuration still loads
    Warning,
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `era5cfg` operations.
pub type Result<T> = std::result::Result<T, Era5CfgError>;

// ============================================================================
// Tests
// ============================================================================
