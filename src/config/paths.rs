//! Directory checks
//!
//! `tmpdir` and `storedir` are not touched at load time. Whoever is about to
//! write into them calls [`check_directories`] first.

use std::fs::OpenOptions;
use std::path::Path;

use crate::config::schema::Configuration;
use crate::error::ConfigError;

/// Checks that both declared directories exist and are writable.
///
/// With `create_missing`, absent directories (and their parents) are created
/// before checking. Returns one [`ConfigError::PathError`] per unusable
/// directory; an empty vector means both are usable.
#[must_use]
pub fn check_directories(config: &Configuration, create_missing: bool) -> Vec<ConfigError> {
    [("tmpdir", &config.tmpdir), ("storedir", &config.storedir)]
        .into_iter()
        .filter_map(|(key, dir)| check_directory(key, dir, create_missing).err())
        .collect()
}

fn check_directory(key: &str, dir: &Path, create_missing: bool) -> Result<(), ConfigError> {
    let fail = |reason: String| ConfigError::PathError {
        key: key.to_string(),
        path: dir.to_path_buf(),
        reason,
    };

    if create_missing && !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| fail(format!("cannot create: {e}")))?;
        tracing::info!(key, dir = %dir.display(), "created directory");
    }

    let metadata = std::fs::metadata(dir).map_err(|e| fail(format!("cannot access: {e}")))?;
    if !metadata.is_dir() {
        return Err(fail("not a directory".to_string()));
    }

    let marker = dir.join(format!(".era5cfg-write-check-{}", std::process::id()));
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&marker)
        .map_err(|e| fail(format!("not writable: {e}")))?;
    if let Err(e) = std::fs::remove_file(&marker) {
        tracing::warn!(marker = %marker.display(), error = %e, "could not remove write marker");
    }

    tracing::debug!(key, dir = %dir.display(), "directory is writable");
    Ok(())
}
