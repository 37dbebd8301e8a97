//! Hashing utilities for staging identifiers and output verification.
//!
//! This module provides:
//! - `VarName`: the deterministic identifier of an inline-content entry
//! - `ContentHash`: a full 64-character hash for content verification
//! - `hash_tree()`: deterministic hashing of an assembled output tree
//! - `hash_file()`: single file hashing
//! - `hash_bytes()`: arbitrary byte hashing

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::consts::VAR_NAME_PREFIX;

/// Internal identifier of a text entry, derived from its destination path.
///
/// The identifier is `file_` followed by the hex SHA-256 of the path, so the
/// planner and the installer agree on it even when they run in different
/// processes. Two distinct paths colliding is treated as impossible.
///
/// # Format
///
/// `file_` + 64 lowercase hex characters, e.g. `"file_e3b0c442..."`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VarName(pub String);

impl VarName {
  pub fn for_path(path: &str) -> Self {
    let digest = Sha256::digest(path.as_bytes());
    VarName(format!("{}{}", VAR_NAME_PREFIX, hex::encode(digest)))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl TryFrom<String> for VarName {
  type Error = String;

  fn try_from(name: String) -> Result<Self, Self::Error> {
    let well_formed = name
      .strip_prefix(VAR_NAME_PREFIX)
      .is_some_and(|digest| digest.len() == 64 && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));

    if well_formed {
      Ok(VarName(name))
    } else {
      Err(format!("invalid staging identifier {:?}", name))
    }
  }
}

impl From<VarName> for String {
  fn from(name: VarName) -> Self {
    name.0
  }
}

impl std::fmt::Display for VarName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A full 64-character SHA256 hash for content verification.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Error during tree hashing.
#[derive(Debug, thiserror::Error)]
pub enum DirHashError {
  #[error("failed to walk directory: {message}")]
  WalkDir { message: String },

  #[error("failed to read file {path}: {message}")]
  ReadFile { path: String, message: String },

  #[error("failed to read symlink {path}: {message}")]
  ReadSymlink { path: String, message: String },
}

/// Compute a deterministic hash of an output tree.
///
/// The root may be a directory, a regular file or a symlink (a spec whose
/// only entry is the root path produces a single file). The hash covers:
/// - Relative paths and entry kinds
/// - File contents and, on Unix, permission bits
/// - Symlink targets
///
/// Timestamps and ownership are ignored. Entries are sorted by path.
pub fn hash_tree(root: &Path) -> Result<ContentHash, DirHashError> {
  let mut entries: Vec<(String, String)> = Vec::new();

  let walker = WalkDir::new(root)
    .follow_links(false)
    .follow_root_links(false)
    .sort_by_file_name();

  for entry in walker {
    let entry = entry.map_err(|e| DirHashError::WalkDir { message: e.to_string() })?;
    let entry_path = entry.path();

    let rel_path = entry_path
      .strip_prefix(root)
      .unwrap_or(entry_path)
      .to_string_lossy()
      .replace('\\', "/");

    let file_type = entry.file_type();
    let entry_hash = if file_type.is_file() {
      let content_hash = hash_file(entry_path)?;
      format!("F:{}:{:o}:{}", rel_path, mode_bits(entry_path)?, content_hash.0)
    } else if file_type.is_dir() {
      // The root directory itself carries no information.
      if rel_path.is_empty() {
        continue;
      }
      format!("D:{}", rel_path)
    } else if file_type.is_symlink() {
      let target = fs::read_link(entry_path).map_err(|e| DirHashError::ReadSymlink {
        path: entry_path.display().to_string(),
        message: e.to_string(),
      })?;
      let target_hash = hash_bytes(target.to_string_lossy().as_bytes());
      format!("L:{}:{}", rel_path, target_hash.0)
    } else {
      // Sockets, devices and fifos never appear in a composed tree
      continue;
    };

    entries.push((rel_path, entry_hash));
  }

  entries.sort_by(|a, b| a.0.cmp(&b.0));

  let mut hasher = Sha256::new();
  for (_, entry_hash) in entries {
    hasher.update(entry_hash.as_bytes());
    hasher.update(b"\n");
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

#[cfg(unix)]
fn mode_bits(path: &Path) -> Result<u32, DirHashError> {
  use std::os::unix::fs::PermissionsExt;

  let meta = fs::symlink_metadata(path).map_err(|e| DirHashError::ReadFile {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;
  Ok(meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn mode_bits(_path: &Path) -> Result<u32, DirHashError> {
  Ok(0)
}

/// Hash a file's contents.
///
/// Returns the full 64-character SHA256 hash of the file.
pub fn hash_file(path: &Path) -> Result<ContentHash, DirHashError> {
  let mut file = fs::File::open(path).map_err(|e| DirHashError::ReadFile {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(|e| DirHashError::ReadFile {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(format!("{:x}", hasher.finalize())))
}

/// Hash arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  ContentHash(format!("{:x}", Sha256::digest(data)))
}
