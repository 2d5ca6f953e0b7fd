//! Shared integration-test harness for running the `era5cfg` binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Helpers for invoking the compiled binary.
pub struct Era5CfgProcess;

impl Era5CfgProcess {
    /// Runs the binary with `args` and waits for it to finish.
    ///
    /// Logging environment variables are cleared so output is deterministic.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_command(args: &[&str]) -> Output {
        Self::command()
            .args(args)
            .output()
            .expect("failed to run era5cfg")
    }

    /// Runs the binary with extra environment variables.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn_with_env(args: &[&str], env: &[(&str, &str)]) -> Output {
        let mut cmd = Self::command();
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.args(args).output().expect("failed to run era5cfg")
    }

    /// Absolute path of a file under `tests/fixtures`.
    pub fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    /// Writes `body` to `name` inside `dir` and returns the path.
    #[allow(clippy::missing_panics_doc)]
    pub fn write_config(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).expect("failed to write config");
        path
    }

    fn command() -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_era5cfg"));
        cmd.env_remove("ERA5CFG_LOG_LEVEL")
            .env_remove("ERA5CFG_CONFIG")
            .env_remove("ERA5CFG_COLOR")
            .env_remove("ERA5CFG_LOG_FORMAT")
            .env_remove("ERA5CFG_MAX_CONFIG_SIZE")
            .env("NO_COLOR", "1");
        cmd
    }
}

/// Lossy stdout of a finished process.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Lossy stderr of a finished process.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
