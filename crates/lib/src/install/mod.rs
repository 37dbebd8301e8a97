//! Plan execution.
//!
//! Steps run against a private build directory created next to the output
//! root:
//!
//! ```text
//! <parent of out>/.stagetree-build-XXXX/
//! ├── staging/          # text content, one file per identifier
//! ├── check/<id>/       # scratch dir of each validator
//! └── tree/             # the output tree being assembled
//! ```
//!
//! The tree is renamed onto the output root only after every step succeeded.
//! On failure the build directory is discarded and the output root is left
//! as it was, so a failed build never looks like a finished one.

mod check;
mod types;

pub use check::run_check;
pub use types::*;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::ComposeConfig;
use crate::consts::{BLOCKING_SLOTS, BUILD_DIR_PREFIX};
use crate::error::ComposeError;
use crate::plan::{InstallStep, Plan, StepAction};
use crate::util::fs as ufs;
use crate::util::hash::hash_tree;

/// Execute a plan and publish the resulting tree at `out_root`.
pub async fn run(plan: &Plan, out_root: &Path, config: &ComposeConfig) -> Result<ComposeResult, ComposeError> {
  info!(out = %out_root.display(), steps = plan.len(), "composing output tree");

  if ufs::exists_no_follow(out_root) && !config.overwrite {
    return Err(ComposeError::OutputExists(out_root.to_path_buf()));
  }

  let parent = match out_root.parent() {
    Some(p) if !p.as_os_str().is_empty() => p,
    _ => Path::new("."),
  };
  tokio::fs::create_dir_all(parent).await?;

  // Same filesystem as the output root, so publishing is a rename.
  let build_dir = tempfile::Builder::new().prefix(BUILD_DIR_PREFIX).tempdir_in(parent)?;
  debug!(build_dir = ?build_dir.path(), "created build directory");

  let outcome = build(plan, build_dir.path(), out_root, config).await;

  if let Err(e) = build_dir.close() {
    warn!(error = %e, "failed to remove build directory");
  }

  let result = outcome?;
  info!(out = %out_root.display(), hash = %result.tree_hash, "output tree complete");
  Ok(result)
}

async fn build(
  plan: &Plan,
  build_dir: &Path,
  out_root: &Path,
  config: &ComposeConfig,
) -> Result<ComposeResult, ComposeError> {
  let paths = Arc::new(BuildPaths::new(build_dir));

  tokio::fs::create_dir(&paths.staging).await?;
  tokio::fs::create_dir(&paths.scratch).await?;
  if !plan.is_root() {
    tokio::fs::create_dir(&paths.tree).await?;
  }

  let entries = execute_steps(plan, paths.clone(), config).await?;

  let tree = paths.tree.clone();
  let tree_hash = tokio::task::spawn_blocking(move || hash_tree(&tree))
    .await
    .map_err(|e| ComposeError::Task(e.to_string()))??;

  publish(&paths.tree, out_root, config.overwrite).await?;

  Ok(ComposeResult {
    out_root: out_root.to_path_buf(),
    entries,
    tree_hash,
  })
}

/// Filesystem work of in-flight steps.
///
/// Aborting a step cancels its future but not a closure already handed to
/// the blocking pool, so every such closure holds a permit until it returns.
/// [`BlockingWork::settle`] waits for all of them.
#[derive(Clone)]
struct BlockingWork {
  slots: Arc<Semaphore>,
}

impl BlockingWork {
  fn new() -> Self {
    Self {
      slots: Arc::new(Semaphore::new(BLOCKING_SLOTS as usize)),
    }
  }

  /// Run `f` on the blocking pool, attributing failures to `dest`.
  async fn run<F>(&self, dest: &str, f: F) -> Result<(), ComposeError>
  where
    F: FnOnce() -> io::Result<()> + Send + 'static,
  {
    let permit = self
      .slots
      .clone()
      .acquire_owned()
      .await
      .map_err(|e| ComposeError::Task(e.to_string()))?;

    let handle = tokio::task::spawn_blocking(move || {
      let _permit = permit;
      f()
    });

    match handle.await {
      Ok(Ok(())) => Ok(()),
      Ok(Err(e)) => Err(ComposeError::install(dest, e)),
      Err(e) => Err(ComposeError::Task(e.to_string())),
    }
  }

  /// Wait until no blocking closure is running.
  async fn settle(&self) {
    if self.slots.acquire_many(BLOCKING_SLOTS).await.is_err() {
      warn!("blocking work tracker closed early");
    }
  }
}

/// Run every step, at most `config.parallelism` at a time, spawning in plan
/// order. The first failure observed aborts the steps still in flight.
async fn execute_steps(
  plan: &Plan,
  paths: Arc<BuildPaths>,
  config: &ComposeConfig,
) -> Result<Vec<InstalledEntry>, ComposeError> {
  let parallelism = config.parallelism.max(1);
  let work = BlockingWork::new();
  let mut pending = plan.steps.iter().cloned().enumerate();
  let mut installed: Vec<Option<InstalledEntry>> = vec![None; plan.len()];
  let mut join_set: JoinSet<(usize, Result<InstalledEntry, ComposeError>)> = JoinSet::new();

  loop {
    while join_set.len() < parallelism {
      let Some((index, step)) = pending.next() else {
        break;
      };
      let paths = paths.clone();
      let config = config.clone();
      let work = work.clone();
      join_set.spawn(async move { (index, install_step(step, &paths, &config, &work).await) });
    }

    let Some(joined) = join_set.join_next().await else {
      break;
    };

    let failure = match joined {
      Ok((index, Ok(entry))) => {
        installed[index] = Some(entry);
        continue;
      }
      Ok((_, Err(e))) => e,
      Err(e) => ComposeError::Task(e.to_string()),
    };

    warn!(error = %failure, in_flight = join_set.len(), "step failed, aborting build");
    join_set.abort_all();
    while join_set.join_next().await.is_some() {}
    work.settle().await;
    return Err(failure);
  }

  Ok(installed.into_iter().flatten().collect())
}

/// Install a single step into the tree.
async fn install_step(
  step: InstallStep,
  paths: &BuildPaths,
  config: &ComposeConfig,
  work: &BlockingWork,
) -> Result<InstalledEntry, ComposeError> {
  let dest_name = step.path.as_str().to_string();
  let dest = paths.dest(&step.path);

  if let Some(deepest) = step.parents().last().map(|p| paths.tree_path(p)) {
    work.run(&dest_name, move || std::fs::create_dir_all(deepest)).await?;
  }

  let kind = match step.action {
    StepAction::Link { target } => {
      debug!(path = %step.path, target = %target, "linking");
      let link_target = PathBuf::from(&target);
      work.run(&dest_name, move || ufs::symlink(&link_target, &dest)).await?;
      InstalledKind::Link { target }
    }

    StepAction::Text {
      var,
      content,
      mode,
      check,
    } => {
      let staged = paths.staging.join(var.as_str());
      debug!(path = %step.path, staged = ?staged, "staging content");

      let staged_write = staged.clone();
      work
        .run(&dest_name, move || ufs::write_new(&staged_write, content.as_bytes()))
        .await?;

      if let Some(check) = &check {
        let scratch = paths.scratch.join(var.as_str());
        let scratch_create = scratch.clone();
        work.run(&dest_name, move || std::fs::create_dir(scratch_create)).await?;
        run_check(&dest_name, check, &staged, &scratch, config).await?;
      }

      work
        .run(&dest_name, move || {
          ufs::set_mode(&staged, mode.0)?;
          ufs::install(&staged, &dest)
        })
        .await?;

      InstalledKind::File {
        mode,
        checked: check.is_some(),
      }
    }
  };

  info!(path = %step.path, "installed");
  Ok(InstalledEntry { path: step.path, kind })
}

/// Move the finished tree onto the output root. Without `overwrite`,
/// anything that appeared at the output root during the build is kept and
/// the build fails with `OutputExists`.
async fn publish(tree: &Path, out_root: &Path, overwrite: bool) -> Result<(), ComposeError> {
  let tree = tree.to_path_buf();
  let out = out_root.to_path_buf();

  let renamed = tokio::task::spawn_blocking(move || {
    if !overwrite {
      return ufs::rename_no_replace(&tree, &out);
    }
    if ufs::exists_no_follow(&out) {
      debug!(out = ?out, "replacing existing output");
      ufs::remove_any(&out)?;
    }
    std::fs::rename(&tree, &out)
  })
  .await
  .map_err(|e| ComposeError::Task(e.to_string()))?;

  match renamed {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(ComposeError::OutputExists(out_root.to_path_buf())),
    Err(e) => Err(e.into()),
  }
}
