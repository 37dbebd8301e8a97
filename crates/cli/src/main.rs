mod cmd;
mod input;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::{OutputFormat, print_error};

/// stagetree - compose a file tree from a declarative spec
#[derive(Parser)]
#[command(name = "stagetree")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the output tree described by a spec
  Build {
    /// Path to the JSON spec ("-" reads stdin)
    spec: String,

    /// Where to publish the output tree
    #[arg(short = 'o', long = "out")]
    out: PathBuf,

    #[command(flatten)]
    resolve: cmd::ResolveArgs,

    /// Entries staged concurrently (default: STAGETREE_JOBS or 1)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Shell used to run checks (default: STAGETREE_SHELL or /bin/sh)
    #[arg(long)]
    shell: Option<String>,

    /// Replace the output if it already exists
    #[arg(short, long)]
    force: bool,
  },

  /// Validate a spec and show the installation steps without building
  Plan {
    /// Path to the JSON spec ("-" reads stdin)
    spec: String,

    #[command(flatten)]
    resolve: cmd::ResolveArgs,
  },

  /// Print the deterministic digest of an output tree
  Hash {
    /// Output tree (directory, file or symlink)
    path: PathBuf,
  },
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build {
      spec,
      out,
      resolve,
      jobs,
      shell,
      force,
    } => cmd::cmd_build(
      &spec,
      &out,
      &resolve,
      cmd::BuildOptions { jobs, shell, force },
      cli.output,
    ),
    Commands::Plan { spec, resolve } => cmd::cmd_plan(&spec, &resolve, cli.output),
    Commands::Hash { path } => cmd::cmd_hash(&path, cli.output),
  };

  if let Err(e) = result {
    print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}
