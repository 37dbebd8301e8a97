use std::path::Path;

use anyhow::{Context, Result};

use stagetree_lib::util::hash::hash_tree;

use crate::output::{OutputFormat, print_json};

pub fn cmd_hash(path: &Path, output: OutputFormat) -> Result<()> {
  if std::fs::symlink_metadata(path).is_err() {
    anyhow::bail!("No such path: {}", path.display());
  }

  let hash = hash_tree(path).with_context(|| format!("Failed to hash {}", path.display()))?;

  if output.is_json() {
    print_json(&serde_json::json!({ "path": path, "hash": hash }))?;
  } else {
    println!("{}", hash);
  }

  Ok(())
}
