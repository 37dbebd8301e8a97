//! Test utilities for stagetree-lib.
//!
//! Cross-platform helpers for tests that create links or need validator
//! commands with a known outcome.

use std::path::Path;

/// Cross-platform symlink creation helper.
pub fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
  #[cfg(unix)]
  {
    std::os::unix::fs::symlink(target, link)
  }
  #[cfg(windows)]
  {
    if target.is_dir() {
      std::os::windows::fs::symlink_dir(target, link)
    } else {
      std::os::windows::fs::symlink_file(target, link)
    }
  }
}

/// A check command that accepts everything.
pub fn check_pass() -> &'static str {
  "true"
}

/// A check command that rejects everything and says why on stderr.
pub fn check_fail(message: &str) -> String {
  format!("sh -c 'echo {} >&2; exit 1'", message)
}

/// A check command that accepts only files containing `needle`.
pub fn check_contains(needle: &str) -> String {
  format!("grep -q {}", needle)
}
