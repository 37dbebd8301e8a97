//! Errors raised while composing an output tree.
//!
//! Every variant is fatal to the current build. Variants produced by the
//! validator are returned before the filesystem is touched; the rest abort an
//! in-flight build.

use std::path::PathBuf;

use thiserror::Error;

use crate::resolve::ResolveError;
use crate::util::hash::DirHashError;

#[derive(Debug, Error)]
pub enum ComposeError {
  /// Destination path is neither empty nor an absolute portable pathname.
  #[error("invalid destination path {path:?}: {reason}")]
  InvalidPath { path: String, reason: &'static str },

  /// Entry does not carry exactly one production mode.
  #[error("entry {path:?} must set exactly one of `link` or `text` (found: {})", display_fields(.found))]
  AmbiguousEntrySpec { path: String, found: Vec<&'static str> },

  /// Mode is not four octal digits.
  #[error("entry {path:?} has invalid mode {mode:?}: expected four octal digits")]
  InvalidMode { path: String, mode: String },

  /// `executable` was present but not a boolean.
  #[error("entry {path:?}: `executable` must be a boolean")]
  InvalidExecutable { path: String },

  /// Link target could not be resolved to an existing, readable artifact.
  #[error("entry {path:?}: unresolved link target {target:?}: {source}")]
  UnresolvedLink {
    path: String,
    target: String,
    #[source]
    source: ResolveError,
  },

  /// The root entry was combined with other entries.
  #[error("the root entry \"\" cannot be combined with other entries (found {path:?})")]
  RootConflict { path: String },

  /// A destination lies below another destination that is itself a file or link.
  #[error("entry {path:?} lies below entry {ancestor:?}")]
  PathConflict { path: String, ancestor: String },

  /// The validator rejected the staged content.
  #[error("check failed for {path:?}: {output}")]
  ValidationFailed { path: String, output: String },

  /// Writing, linking or moving an entry into place failed.
  #[error("failed to install {path:?}: {cause}")]
  InstallFailed { path: String, cause: String },

  /// The output root already exists and overwriting was not requested.
  #[error("output path already exists: {0}")]
  OutputExists(PathBuf),

  /// The spec document could not be parsed.
  #[error("failed to parse spec: {0}")]
  Parse(#[from] serde_json::Error),

  /// Hashing the finished tree failed.
  #[error("failed to hash output: {0}")]
  Hash(#[from] DirHashError),

  /// A staging task panicked or was cancelled.
  #[error("staging task failed: {0}")]
  Task(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl ComposeError {
  /// Destination path the error is about, when it concerns a single entry.
  pub fn path(&self) -> Option<&str> {
    match self {
      ComposeError::InvalidPath { path, .. }
      | ComposeError::AmbiguousEntrySpec { path, .. }
      | ComposeError::InvalidMode { path, .. }
      | ComposeError::InvalidExecutable { path }
      | ComposeError::UnresolvedLink { path, .. }
      | ComposeError::RootConflict { path }
      | ComposeError::PathConflict { path, .. }
      | ComposeError::ValidationFailed { path, .. }
      | ComposeError::InstallFailed { path, .. } => Some(path),
      _ => None,
    }
  }

  pub(crate) fn install(path: &str, cause: impl std::fmt::Display) -> Self {
    ComposeError::InstallFailed {
      path: path.to_string(),
      cause: cause.to_string(),
    }
  }
}

fn display_fields(found: &[&'static str]) -> String {
  if found.is_empty() {
    "none".to_string()
  } else {
    found.join(", ")
  }
}
