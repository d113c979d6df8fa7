//! Shared testing harness for `newrelic-lambda` CLI tests.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Testing harness providing an isolated environment for CLI exercises.
///
/// Commands run in a scratch working directory with a scrubbed AWS
/// environment, so no test accidentally picks up the developer's profile or
/// region configuration.
pub(crate) struct TestContext {
    root: TempDir,
    work_dir: PathBuf,
}

impl TestContext {
    /// Create a new isolated environment.
    pub(crate) fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory for tests");
        let work_dir = root.path().join("work");
        fs::create_dir_all(&work_dir).expect("Failed to create test work directory");
        Self { root, work_dir }
    }

    /// Absolute path to the emulated `$HOME` directory.
    pub(crate) fn home(&self) -> &Path {
        self.root.path()
    }

    /// Path to the working directory used for CLI invocations.
    pub(crate) fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Build a command for invoking the compiled `newrelic-lambda` binary.
    pub(crate) fn cli(&self) -> Command {
        let mut cmd =
            Command::cargo_bin("newrelic-lambda").expect("Failed to locate newrelic-lambda binary");
        cmd.current_dir(&self.work_dir)
            .env("HOME", self.home())
            .env_remove("AWS_PROFILE")
            .env_remove("AWS_DEFAULT_REGION")
            .env_remove("AWS_REGION");
        cmd
    }
}
