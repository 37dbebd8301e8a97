//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the spec, artifacts
/// for link entries, and the output location.
pub struct TestEnv {
  pub temp: TempDir,
  pub spec_path: PathBuf,
}

impl TestEnv {
  /// Create an environment with `spec` written to `spec.json`.
  pub fn with_spec(spec: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let spec_path = temp.path().join("spec.json");
    std::fs::write(&spec_path, spec).unwrap();
    Self { temp, spec_path }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Output location (not created).
  pub fn out_path(&self) -> PathBuf {
    self.temp.path().join("out")
  }

  /// A Command for the stagetree binary running inside the temp directory,
  /// with stagetree env overrides cleared.
  pub fn stagetree_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("stagetree");
    cmd.current_dir(self.temp.path());
    cmd.env_remove("STAGETREE_JOBS");
    cmd.env_remove("STAGETREE_SHELL");
    cmd.env_remove("STAGETREE_CHECK_PATH");
    cmd
  }

  /// `stagetree build spec.json --out out`
  pub fn build_cmd(&self) -> Command {
    let mut cmd = self.stagetree_cmd();
    cmd.arg("build").arg(&self.spec_path).arg("--out").arg(self.out_path());
    cmd
  }
}
