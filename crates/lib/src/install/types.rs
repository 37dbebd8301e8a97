use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::consts::{CHECK_SCRATCH_DIR, STAGING_DIR, TREE_DIR};
use crate::spec::{DestPath, FileMode};
use crate::util::hash::ContentHash;

/// Outcome of a successful build.
#[derive(Debug, Clone, Serialize)]
pub struct ComposeResult {
  /// Where the output tree was published.
  pub out_root: PathBuf,

  /// One entry per spec key, in spec order.
  pub entries: Vec<InstalledEntry>,

  /// Deterministic digest of the published tree.
  pub tree_hash: ContentHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledEntry {
  pub path: DestPath,
  #[serde(flatten)]
  pub kind: InstalledKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstalledKind {
  Link { target: String },
  File { mode: FileMode, checked: bool },
}

/// Locations inside the private build directory.
#[derive(Debug, Clone)]
pub(crate) struct BuildPaths {
  pub staging: PathBuf,
  pub scratch: PathBuf,
  pub tree: PathBuf,
}

impl BuildPaths {
  pub fn new(build_dir: &Path) -> Self {
    Self {
      staging: build_dir.join(STAGING_DIR),
      scratch: build_dir.join(CHECK_SCRATCH_DIR),
      tree: build_dir.join(TREE_DIR),
    }
  }

  /// Location of a destination inside the assembled tree. The root entry is
  /// the tree itself.
  pub fn dest(&self, path: &DestPath) -> PathBuf {
    self.tree_path(path.as_str())
  }

  pub fn tree_path(&self, absolute: &str) -> PathBuf {
    let relative = absolute.trim_start_matches('/');
    if relative.is_empty() {
      self.tree.clone()
    } else {
      self.tree.join(relative)
    }
  }
}
