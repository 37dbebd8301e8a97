//! Loading specs from files or stdin.

use std::io::Read;

use anyhow::{Context, Result};

use stagetree_lib::spec::ArtifactSpec;

/// Read and parse a spec. `-` reads stdin.
pub fn load_spec(source: &str) -> Result<ArtifactSpec> {
  let json = if source == "-" {
    let mut buf = String::new();
    std::io::stdin()
      .read_to_string(&mut buf)
      .context("Failed to read spec from stdin")?;
    buf
  } else {
    std::fs::read_to_string(source).with_context(|| format!("Failed to read spec: {}", source))?
  };

  ArtifactSpec::from_json(&json).with_context(|| format!("Failed to parse spec: {}", source))
}
