//! Validator invocation.
//!
//! A `check` command is run as `<check> <staged-file>` with an isolated
//! environment:
//! - Clears all environment variables
//! - Sets PATH from the compose config (unset when the config has none)
//! - Sets HOME to /homeless-shelter
//! - Sets TMPDIR/TMP/TEMP/TEMPDIR to the validator's own scratch directory
//! - Runs with the scratch directory as its working directory
//!
//! The scratch directory is private to one validator, so concurrent checks
//! share no mutable working state.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::ComposeConfig;
use crate::consts::CHECK_ARG0;
use crate::error::ComposeError;

/// Run `check` against `staged`.
///
/// # Arguments
///
/// * `dest` - Destination path of the entry, used for error reporting
/// * `check` - The validator command line
/// * `staged` - The staged file, passed as the sole argument
/// * `scratch` - Existing working and temp directory for this validator
/// * `config` - Shell and PATH settings
///
/// # Returns
///
/// `Ok(())` when the validator exits with status 0, otherwise
/// `ValidationFailed` carrying the validator's stderr and stdout.
pub async fn run_check(
  dest: &str,
  check: &str,
  staged: &Path,
  scratch: &Path,
  config: &ComposeConfig,
) -> Result<(), ComposeError> {
  info!(path = %dest, check = %check, "running check");

  // The staged path travels as $1 so it is never re-parsed by the shell.
  let script = format!("{} \"$1\"", check);

  let mut command = Command::new(&config.shell);
  command
    .arg("-c")
    .arg(&script)
    .arg(CHECK_ARG0)
    .arg(staged)
    .current_dir(scratch)
    .env_clear()
    .env("HOME", "/homeless-shelter")
    .env("TMPDIR", scratch)
    .env("TMP", scratch)
    .env("TEMP", scratch)
    .env("TEMPDIR", scratch)
    .env("LANG", "C")
    .env("LC_ALL", "C")
    .kill_on_drop(true);

  if let Some(path) = &config.check_path {
    command.env("PATH", path);
  }

  debug!(shell = %config.shell, staged = ?staged, "spawning check");

  let output = command.output().await.map_err(|e| ComposeError::ValidationFailed {
    path: dest.to_string(),
    output: format!("failed to run check `{}`: {}", check, e),
  })?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);

  if !stdout.is_empty() {
    debug!(stdout = %stdout, "check stdout");
  }
  if !stderr.is_empty() {
    debug!(stderr = %stderr, "check stderr");
  }

  if !output.status.success() {
    let mut message = match output.status.code() {
      Some(code) => format!("`{}` exited with code {}", check, code),
      None => format!("`{}` was terminated by a signal", check),
    };
    for stream in [stderr.trim(), stdout.trim()] {
      if !stream.is_empty() {
        message.push('\n');
        message.push_str(stream);
      }
    }

    return Err(ComposeError::ValidationFailed {
      path: dest.to_string(),
      output: message,
    });
  }

  Ok(())
}
