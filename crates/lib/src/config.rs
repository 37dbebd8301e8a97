//! Composer configuration.

use tracing::warn;

/// Configuration for a single compose run.
#[derive(Debug, Clone)]
pub struct ComposeConfig {
  /// Maximum number of entries staged and checked concurrently.
  ///
  /// With the default of 1, steps run strictly in spec order and the
  /// reported validator failure is always the first failing entry.
  pub parallelism: usize,

  /// Shell used to run `check` commands.
  pub shell: String,

  /// `PATH` given to `check` commands. `None` leaves `PATH` unset.
  pub check_path: Option<String>,

  /// Replace an existing output root instead of failing.
  pub overwrite: bool,
}

impl Default for ComposeConfig {
  fn default() -> Self {
    Self {
      parallelism: 1,
      shell: default_shell().to_string(),
      check_path: std::env::var("PATH").ok(),
      overwrite: false,
    }
  }
}

impl ComposeConfig {
  /// Defaults with `STAGETREE_JOBS`, `STAGETREE_SHELL` and
  /// `STAGETREE_CHECK_PATH` applied on top.
  pub fn from_env() -> Self {
    let mut config = Self::default();

    if let Ok(jobs) = std::env::var("STAGETREE_JOBS") {
      match jobs.parse::<usize>() {
        Ok(n) if n > 0 => config.parallelism = n,
        _ => warn!(value = %jobs, "ignoring invalid STAGETREE_JOBS"),
      }
    }

    if let Some(shell) = std::env::var("STAGETREE_SHELL").ok().filter(|s| !s.is_empty()) {
      config.shell = shell;
    }

    if let Ok(path) = std::env::var("STAGETREE_CHECK_PATH") {
      config.check_path = Some(path);
    }

    config
  }

  pub fn with_parallelism(mut self, parallelism: usize) -> Self {
    self.parallelism = parallelism.max(1);
    self
  }

  pub fn with_overwrite(mut self, overwrite: bool) -> Self {
    self.overwrite = overwrite;
    self
  }

  pub fn with_shell(mut self, shell: &str) -> Self {
    self.shell = shell.to_string();
    self
  }
}

#[cfg(unix)]
fn default_shell() -> &'static str {
  "/bin/sh"
}

#[cfg(windows)]
fn default_shell() -> &'static str {
  "sh.exe"
}
