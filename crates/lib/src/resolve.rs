//! Artifact reference resolution for link entries.
//!
//! A link entry names an existing artifact by reference. What a reference
//! means is up to the caller, so resolution is an injected capability rather
//! than global state: the composer only asks an [`ArtifactResolver`] to turn
//! a reference into a readable filesystem path.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  #[error("empty artifact reference")]
  Empty,

  #[error("{path} does not exist")]
  NotFound { path: PathBuf },

  #[error("{path} is not readable: {message}")]
  Unreadable { path: PathBuf, message: String },
}

/// Turns an artifact reference into a concrete, readable path.
pub trait ArtifactResolver: Send + Sync {
  fn resolve(&self, reference: &str) -> Result<PathBuf, ResolveError>;
}

impl<R: ArtifactResolver + ?Sized> ArtifactResolver for &R {
  fn resolve(&self, reference: &str) -> Result<PathBuf, ResolveError> {
    (**self).resolve(reference)
  }
}

impl<R: ArtifactResolver + ?Sized> ArtifactResolver for Box<R> {
  fn resolve(&self, reference: &str) -> Result<PathBuf, ResolveError> {
    (**self).resolve(reference)
  }
}

/// Treats references as filesystem paths. Relative references are anchored
/// at `base`.
#[derive(Debug, Clone)]
pub struct FsResolver {
  base: PathBuf,
}

impl FsResolver {
  pub fn new(base: impl Into<PathBuf>) -> Self {
    Self { base: base.into() }
  }
}

impl ArtifactResolver for FsResolver {
  fn resolve(&self, reference: &str) -> Result<PathBuf, ResolveError> {
    if reference.is_empty() {
      return Err(ResolveError::Empty);
    }

    let path = Path::new(reference);
    let path = if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.base.join(path)
    };

    check_readable(&path)?;
    trace!(reference, path = %path.display(), "resolved artifact");
    Ok(path)
  }
}

/// Named artifacts (`hello` -> `/opt/hello`), falling back to another
/// resolver for anything without an alias.
#[derive(Debug, Clone)]
pub struct AliasResolver<R> {
  aliases: BTreeMap<String, PathBuf>,
  fallback: R,
}

impl<R: ArtifactResolver> AliasResolver<R> {
  pub fn new(fallback: R) -> Self {
    Self {
      aliases: BTreeMap::new(),
      fallback,
    }
  }

  pub fn with_alias(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
    self.aliases.insert(name.to_string(), path.into());
    self
  }

  pub fn insert(&mut self, name: &str, path: impl Into<PathBuf>) {
    self.aliases.insert(name.to_string(), path.into());
  }
}

impl<R: ArtifactResolver> ArtifactResolver for AliasResolver<R> {
  fn resolve(&self, reference: &str) -> Result<PathBuf, ResolveError> {
    match self.aliases.get(reference) {
      Some(path) => {
        check_readable(path)?;
        Ok(path.clone())
      }
      None => self.fallback.resolve(reference),
    }
  }
}

/// Follows symlinks: the artifact itself must exist and be readable.
fn check_readable(path: &Path) -> Result<(), ResolveError> {
  let meta = fs::metadata(path).map_err(|e| match e.kind() {
    std::io::ErrorKind::NotFound => ResolveError::NotFound {
      path: path.to_path_buf(),
    },
    _ => ResolveError::Unreadable {
      path: path.to_path_buf(),
      message: e.to_string(),
    },
  })?;

  let readable = if meta.is_dir() {
    fs::read_dir(path).map(|_| ())
  } else {
    fs::File::open(path).map(|_| ())
  };

  readable.map_err(|e| ResolveError::Unreadable {
    path: path.to_path_buf(),
    message: e.to_string(),
  })
}
