//! Configuration loader
//!
//! This module implements the loading pipeline:
//! 1. Size check and read (UTF-8, BOM stripped)
//! 2. Environment variable expansion (pre-parse, on raw text)
//! 3. YAML parsing into a generic tree
//! 4. Schema validation and coercion
//! 5. Freeze with `Arc`

use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use serde::Serialize;
use serde_yaml::Value;

use crate::config::schema::Configuration;
use crate::config::validation::Validator;
use crate::error::ConfigError;

// ============================================================================
// Public API
// ============================================================================

/// Options for the configuration loader.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,

    /// Expand `${VAR}` references before parsing.
    pub expand_env: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_config_size: env_or("ERA5CFG_MAX_CONFIG_SIZE", 1024 * 1024),
            expand_env: true,
        }
    }
}

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: Arc<Configuration>,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone, Serialize)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

/// Configuration loader.
///
/// Stateless apart from its options; one loader can read any number of files.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a new configuration loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a new configuration loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads a configuration file and returns the frozen configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read or exceeds the size limit
    /// - A required environment variable is unset
    /// - YAML parsing fails or the document is empty
    /// - Schema validation reports any error
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|e| read_error(path, e))?;

        let limit = self.options.max_config_size;
        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > limit {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {limit} bytes"),
            });
        }

        let bytes = std::fs::read(path).map_err(|e| read_error(path, e))?;
        let raw = String::from_utf8(bytes).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            line: None,
            message: format!("configuration is not valid UTF-8: {e}"),
        })?;

        tracing::debug!(path = %path.display(), bytes = file_size, "read configuration");
        self.load_source(&raw, path)
    }

    /// Loads a configuration from an in-memory document.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLoader::load`], minus file access errors.
    pub fn load_from_str(&self, raw: &str) -> Result<LoadResult, ConfigError> {
        self.load_source(raw, Path::new("<memory>"))
    }

    fn load_source(&self, raw: &str, origin: &Path) -> Result<LoadResult, ConfigError> {
        let mut warnings = Vec::new();
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let text = if self.options.expand_env {
            let expanded = expand_env(raw, origin)?;
            warnings.extend(expanded.warnings);
            expanded.text
        } else {
            raw.to_string()
        };

        let root: Value = serde_yaml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: origin.to_path_buf(),
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })?;

        if root.is_null() {
            return Err(ConfigError::ParseError {
                path: origin.to_path_buf(),
                line: None,
                message: "Configuration file is empty".to_string(),
            });
        }

        let result = Validator::new().validate(&root);
        tracing::debug!(
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "schema validation finished"
        );

        warnings.extend(result.warnings.iter().map(|issue| LoadWarning {
            message: issue.message.clone(),
            location: Some(issue.path.clone()),
        }));

        match result.config {
            Some(config) if result.errors.is_empty() => Ok(LoadResult {
                config: Arc::new(config),
                warnings,
            }),
            _ => Err(ConfigError::SchemaError {
                path: origin.display().to_string(),
                issues: result.errors,
            }),
        }
    }
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// `$$`, `${VAR}`, `${VAR:-default}` and `${VAR:?message}`; a trailing bare
/// `${` catches references that match none of those forms.
static ENV_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$|\$\{([A-Za-z_][A-Za-z0-9_]*)(?::([-?])([^}]*))?\}|\$\{")
        .expect("valid regex")
});

struct Expanded {
    text: String,
    warnings: Vec<LoadWarning>,
}

/// Expands environment references in raw YAML text.
///
/// Runs before parsing so substituted numbers and booleans keep their YAML
/// type. An unset `${VAR}` expands to the empty string with a warning.
fn expand_env(raw: &str, origin: &Path) -> Result<Expanded, ConfigError> {
    expand_with(raw, origin, |name| std::env::var(name).ok())
}

fn expand_with(
    raw: &str,
    origin: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Expanded, ConfigError> {
    let mut text = String::with_capacity(raw.len());
    let mut warnings = Vec::new();
    let mut last = 0;

    for caps in ENV_REF_RE.captures_iter(raw) {
        let Some(whole) = caps.get(0) else { continue };
        text.push_str(&raw[last..whole.start()]);
        last = whole.end();

        if whole.as_str() == "${" {
            return Err(ConfigError::ParseError {
                path: origin.to_path_buf(),
                line: Some(raw[..whole.end()].lines().count()),
                message: "malformed environment variable reference".to_string(),
            });
        }
        text.push_str(&resolve_ref(&caps, origin, &lookup, &mut warnings)?);
    }
    text.push_str(&raw[last..]);

    Ok(Expanded { text, warnings })
}

fn resolve_ref(
    caps: &Captures<'_>,
    origin: &Path,
    lookup: &impl Fn(&str) -> Option<String>,
    warnings: &mut Vec<LoadWarning>,
) -> Result<String, ConfigError> {
    let Some(name) = caps.get(1).map(|m| m.as_str()) else {
        return Ok("$".to_string());
    };
    if let Some(value) = lookup(name) {
        return Ok(value);
    }

    let operand = caps.get(3).map_or("", |m| m.as_str());
    match caps.get(2).map(|m| m.as_str()) {
        Some("-") => Ok(operand.to_string()),
        Some("?") => Err(ConfigError::EnvVarNotSet {
            var: name.to_string(),
            message: operand.to_string(),
        }),
        _ => {
            warnings.push(LoadWarning {
                message: format!("Environment variable '{name}' is not set, using empty string"),
                location: Some(origin.display().to_string()),
            });
            Ok(String::new())
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// `MissingFile` for an absent path, `Unreadable` with the cause otherwise.
fn read_error(path: &Path, source: std::io::Error) -> ConfigError {
    if source.kind() == std::io::ErrorKind::NotFound {
        ConfigError::MissingFile {
            path: path.to_path_buf(),
        }
    } else {
        ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reads a numeric limit from the environment, falling back to `default`.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================
