//! Entry classification and path/mode grammar checks.
//!
//! Validation is pure: it never touches the filesystem except through the
//! injected [`ArtifactResolver`], and it stops at the first offending entry
//! in spec order.

use std::collections::HashSet;

use tracing::debug;

use crate::error::ComposeError;
use crate::resolve::ArtifactResolver;
use crate::spec::{ArtifactSpec, DestPath, EntrySpec, FileMode, LinkEntry, RawEntry, TextEntry, ValidEntry};

/// Validate a whole spec against the path grammar, the entry rules and the
/// resolver, returning normalized entries in spec order.
pub fn validate(spec: &ArtifactSpec, resolver: &dyn ArtifactResolver) -> Result<Vec<ValidEntry>, ComposeError> {
  let mut entries = Vec::with_capacity(spec.len());

  for (path, raw) in spec.iter() {
    let path = validate_path(path)?;
    let entry_spec = validate_entry(&path, raw, resolver)?;
    entries.push(ValidEntry { path, spec: entry_spec });
  }

  check_layout(&entries)?;

  debug!(entries = entries.len(), "spec validated");
  Ok(entries)
}

/// Check a destination path: empty, or `/`-rooted portable filename segments.
pub fn validate_path(path: &str) -> Result<DestPath, ComposeError> {
  let invalid = |reason: &'static str| ComposeError::InvalidPath {
    path: path.to_string(),
    reason,
  };

  if path.is_empty() {
    return Ok(DestPath(String::new()));
  }

  let Some(rest) = path.strip_prefix('/') else {
    return Err(invalid("must be empty or start with '/'"));
  };

  for segment in rest.split('/') {
    if segment.is_empty() {
      return Err(invalid("contains an empty path segment"));
    }
    if segment == "." || segment == ".." {
      return Err(invalid("contains a '.' or '..' segment"));
    }
    if !segment.bytes().all(is_portable_filename_byte) {
      return Err(invalid("contains characters outside [A-Za-z0-9._-]"));
    }
  }

  Ok(DestPath(path.to_string()))
}

fn is_portable_filename_byte(b: u8) -> bool {
  b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-')
}

/// Check a mode string against `[0-7]{4}`.
pub fn validate_mode(path: &DestPath, mode: &str) -> Result<FileMode, ComposeError> {
  mode.parse().map_err(|_| ComposeError::InvalidMode {
    path: path.as_str().to_string(),
    mode: mode.to_string(),
  })
}

/// Classify one wire entry into its production mode.
pub fn validate_entry(
  path: &DestPath,
  raw: &RawEntry,
  resolver: &dyn ArtifactResolver,
) -> Result<EntrySpec, ComposeError> {
  let modes = raw.production_modes();

  match (&raw.link, &raw.text) {
    (Some(target), None) => {
      let options = raw.text_options();
      if !options.is_empty() {
        let mut found = modes;
        found.extend(options);
        return Err(ComposeError::AmbiguousEntrySpec {
          path: path.as_str().to_string(),
          found,
        });
      }

      let resolved = resolver
        .resolve(target)
        .map_err(|source| ComposeError::UnresolvedLink {
          path: path.as_str().to_string(),
          target: target.clone(),
          source,
        })?;

      Ok(EntrySpec::Link(LinkEntry {
        target: resolved.to_string_lossy().into_owned(),
      }))
    }

    (None, Some(content)) => {
      let mode = raw.mode.as_deref().map(|m| validate_mode(path, m)).transpose()?;

      let executable = match &raw.executable {
        None => false,
        Some(serde_json::Value::Bool(b)) => *b,
        Some(_) => {
          return Err(ComposeError::InvalidExecutable {
            path: path.as_str().to_string(),
          });
        }
      };

      Ok(EntrySpec::Text(TextEntry {
        content: content.clone(),
        executable,
        mode,
        check: raw.check.clone(),
      }))
    }

    _ => Err(ComposeError::AmbiguousEntrySpec {
      path: path.as_str().to_string(),
      found: modes,
    }),
  }
}

/// Structural checks across entries: the root stands alone, and no entry
/// lies below another entry.
fn check_layout(entries: &[ValidEntry]) -> Result<(), ComposeError> {
  if entries.len() > 1 && entries.iter().any(|e| e.path.is_root()) {
    if let Some(other) = entries.iter().find(|e| !e.path.is_root()) {
      return Err(ComposeError::RootConflict {
        path: other.path.as_str().to_string(),
      });
    }
  }

  let paths: HashSet<&str> = entries.iter().map(|e| e.path.as_str()).collect();
  for entry in entries {
    if let Some(ancestor) = entry.path.ancestors().into_iter().find(|a| paths.contains(a)) {
      return Err(ComposeError::PathConflict {
        path: entry.path.as_str().to_string(),
        ancestor: ancestor.to_string(),
      });
    }
  }

  Ok(())
}
