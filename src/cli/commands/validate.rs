//! `validate` command
//!
//! Loads every file given on the command line and reports each problem
//! found instead of stopping at the first bad file.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::{ConfigLoader, LoadWarning, check_directories};
use crate::error::{ConfigError, Era5CfgError, ValidationIssue};

/// Outcome of validating a single file.
#[derive(Debug, Serialize)]
struct FileReport {
    file: PathBuf,
    valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ReportEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<LoadWarning>,
}

/// A fatal problem: either a schema issue or a loader/path error.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ReportEntry {
    Issue(ValidationIssue),
    Message { message: String },
}

impl std::fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Issue(issue) => write!(f, "{issue}"),
            Self::Message { message } => write!(f, "error: {message}"),
        }
    }
}

/// Validates configuration files.
///
/// With a single file the underlying error is returned as-is so its exit
/// code survives; with several files a failure count is returned.
///
/// # Errors
///
/// Returns the load or directory error of a lone failing file, otherwise
/// [`ConfigError::ValidationFailed`] when any file fails. JSON encoding
/// and stdout write errors are propagated.
pub fn run(args: &ValidateArgs) -> Result<(), Era5CfgError> {
    let loader = ConfigLoader::with_defaults();
    let mut stdout = std::io::stdout().lock();
    let mut reports = Vec::with_capacity(args.files.len());
    let mut first_error: Option<ConfigError> = None;
    let mut failed = 0usize;

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let (report, error) = validate_file(&loader, path, args);
        if !report.valid {
            failed += 1;
            if first_error.is_none() {
                first_error = error;
            }
        }
        if args.format == OutputFormat::Human {
            print_human(&report, &mut stdout)?;
        }
        reports.push(report);
    }

    if args.format == OutputFormat::Json {
        writeln!(stdout, "{}", serde_json::to_string_pretty(&reports)?)?;
    }

    match (failed, first_error) {
        (0, _) => Ok(()),
        (1, Some(error)) if args.files.len() == 1 => Err(error.into()),
        (count, _) => Err(ConfigError::ValidationFailed { count }.into()),
    }
}

fn validate_file(
    loader: &ConfigLoader,
    path: &Path,
    args: &ValidateArgs,
) -> (FileReport, Option<ConfigError>) {
    let mut report = FileReport {
        file: path.to_path_buf(),
        valid: true,
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    let loaded = match loader.load(path) {
        Ok(loaded) => loaded,
        Err(ConfigError::SchemaError { path: origin, issues }) => {
            report.valid = false;
            report
                .errors
                .extend(issues.iter().cloned().map(ReportEntry::Issue));
            return (report, Some(ConfigError::SchemaError { path: origin, issues }));
        }
        Err(e) => {
            report.valid = false;
            report.errors.push(ReportEntry::Message {
                message: e.to_string(),
            });
            return (report, Some(e));
        }
    };

    report.warnings = loaded.warnings;
    let mut error = None;

    if args.check_paths {
        for e in check_directories(&loaded.config, args.create_dirs) {
            report.valid = false;
            report.errors.push(ReportEntry::Message {
                message: e.to_string(),
            });
            error.get_or_insert(e);
        }
    }

    if args.strict && !report.warnings.is_empty() && report.valid {
        report.valid = false;
        error = Some(ConfigError::ValidationFailed {
            count: report.warnings.len(),
        });
        tracing::debug!(
            file = %path.display(),
            warnings = report.warnings.len(),
            "strict mode: warnings treated as errors"
        );
    }

    (report, error)
}

/// Diagnostics go to stderr, the per-file verdict to `out`.
fn print_human(report: &FileReport, out: &mut impl Write) -> std::io::Result<()> {
    let file = report.file.display();
    for entry in &report.errors {
        eprintln!("{file}: {entry}");
    }
    for warning in &report.warnings {
        match &warning.location {
            Some(location) => eprintln!("{file}: warning: {} at {location}", warning.message),
            None => eprintln!("{file}: warning: {}", warning.message),
        }
    }
    if report.valid {
        writeln!(out, "{file}: ok")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const VALID: &str = "\
tmpdir: /tmp/era5
storedir: /data/era5
dataset: ERA5
varlist: [2m_temperature]
year: {begin: 1990, end: 1991}
freq: 1hr
levelout: sfc
grid: full
";

    fn write_config(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    fn args(files: Vec<PathBuf>) -> ValidateArgs {
        ValidateArgs {
            files,
            format: OutputFormat::Json,
            strict: false,
            check_paths: false,
            create_dirs: false,
        }
    }

    #[test]
    fn test_human_verdict_written_to_output() {
        let report = FileReport {
            file: PathBuf::from("run.yaml"),
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        };
        let mut buf = Vec::new();
        print_human(&report, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "run.yaml: ok\n");
    }

    #[test]
    fn test_valid_file_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "ok.yaml", VALID);
        assert!(run(&args(vec![path])).is_ok());
    }

    #[test]
    fn test_single_failure_keeps_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "bad.yaml", &VALID.replace("1hr", "2hr"));
        let err = run(&args(vec![path])).unwrap_err();
        assert!(matches!(
            err,
            Era5CfgError::Config(ConfigError::SchemaError { .. })
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = run(&args(vec![PathBuf::from("/nonexistent/era5.yaml")])).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_several_failures_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_config(&dir, "ok.yaml", VALID);
        let bad = write_config(&dir, "bad.yaml", &VALID.replace("grid: full", "grid: 1x1"));
        let err = run(&args(vec![good, bad, PathBuf::from("/nonexistent.yaml")])).unwrap_err();
        assert!(matches!(
            err,
            Era5CfgError::Config(ConfigError::ValidationFailed { count: 2 })
        ));
    }

    #[test]
    fn test_strict_fails_on_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!("{VALID}colour: blue\n");
        let path = write_config(&dir, "warn.yaml", &body);

        assert!(run(&args(vec![path.clone()])).is_ok());

        let mut strict = args(vec![path]);
        strict.strict = true;
        assert!(run(&strict).is_err());
    }

    #[test]
    fn test_check_paths_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("tmp");
        let store = dir.path().join("store");
        let body = VALID
            .replace("/tmp/era5", &tmp.display().to_string())
            .replace("/data/era5", &store.display().to_string());
        let path = write_config(&dir, "paths.yaml", &body);

        let mut checked = args(vec![path.clone()]);
        checked.check_paths = true;
        let err = run(&checked).unwrap_err();
        assert_eq!(err.exit_code(), 4);

        checked.create_dirs = true;
        assert!(run(&checked).is_ok());
        assert!(tmp.is_dir() && store.is_dir());
    }
}
