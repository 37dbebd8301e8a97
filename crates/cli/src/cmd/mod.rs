mod build;
mod hash;
mod plan;

pub use build::{BuildOptions, cmd_build};
pub use hash::cmd_hash;
pub use plan::cmd_plan;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use stagetree_lib::resolve::{AliasResolver, FsResolver};

/// How link targets are resolved.
#[derive(Debug, Args)]
pub struct ResolveArgs {
  /// Named artifact for link targets, as NAME=PATH (repeatable)
  #[arg(short, long = "artifact", value_name = "NAME=PATH")]
  pub artifacts: Vec<String>,

  /// Directory relative link targets are resolved against (default: cwd)
  #[arg(long)]
  pub base_dir: Option<PathBuf>,
}

impl ResolveArgs {
  pub fn resolver(&self) -> Result<AliasResolver<FsResolver>> {
    let base = match &self.base_dir {
      Some(dir) => dir.clone(),
      None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let base = dunce::canonicalize(&base).with_context(|| format!("Invalid base directory: {}", base.display()))?;

    let mut resolver = AliasResolver::new(FsResolver::new(base));
    for artifact in &self.artifacts {
      let (name, path) = parse_artifact(artifact)?;
      resolver.insert(name, path);
    }
    Ok(resolver)
  }
}

fn parse_artifact(arg: &str) -> Result<(&str, &str)> {
  match arg.split_once('=') {
    Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok((name, path)),
    _ => bail!("Invalid --artifact {:?}: expected NAME=PATH", arg),
  }
}
