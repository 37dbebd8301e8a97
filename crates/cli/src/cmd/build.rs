//! Implementation of the `stagetree build` command.
//!
//! Loads a spec, validates and plans it, then stages, checks and publishes
//! the output tree. Nothing is published unless every entry succeeded.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use stagetree_lib::install::InstalledKind;
use stagetree_lib::{ComposeConfig, compose};

use super::ResolveArgs;
use crate::input::load_spec;
use crate::output::{OutputFormat, format_duration, print_json, print_stat, print_success, symbols, truncate_hash};

pub struct BuildOptions {
  pub jobs: Option<usize>,
  pub shell: Option<String>,
  pub force: bool,
}

pub fn cmd_build(
  spec_source: &str,
  out: &Path,
  resolve: &ResolveArgs,
  options: BuildOptions,
  output: OutputFormat,
) -> Result<()> {
  let start = Instant::now();

  let spec = load_spec(spec_source)?;
  let resolver = resolve.resolver()?;

  let mut config = ComposeConfig::from_env().with_overwrite(options.force);
  if let Some(jobs) = options.jobs {
    config = config.with_parallelism(jobs);
  }
  if let Some(shell) = &options.shell {
    config = config.with_shell(shell);
  }

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let result = rt
    .block_on(compose(&spec, &resolver, out, &config))
    .context("Build failed")?;

  info!(out = %out.display(), "build published");

  if output.is_json() {
    return print_json(&result);
  }

  for entry in &result.entries {
    match &entry.kind {
      InstalledKind::File { mode, checked } => {
        let note = if *checked { " (checked)" } else { "" };
        println!("  {} {} {}{}", symbols::ADD, entry.path, mode, note);
      }
      InstalledKind::Link { target } => {
        println!("  {} {} {} {}", symbols::ADD, entry.path, symbols::ARROW, target);
      }
    }
  }

  println!();
  print_success("Build complete!");
  print_stat("Output", &result.out_root.display().to_string());
  print_stat("Entries", &result.entries.len().to_string());
  print_stat("Tree hash", truncate_hash(&result.tree_hash.0));
  print_stat("Duration", &format_duration(start.elapsed()));

  Ok(())
}
