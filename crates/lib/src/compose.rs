//! End-to-end composition: validate, plan, install.

use std::path::Path;

use tracing::info;

use crate::config::ComposeConfig;
use crate::error::ComposeError;
use crate::install::{self, ComposeResult};
use crate::plan::{Plan, plan};
use crate::resolve::ArtifactResolver;
use crate::spec::{ArtifactSpec, validate};

/// Validate and plan a spec without touching the filesystem.
pub fn plan_spec(spec: &ArtifactSpec, resolver: &dyn ArtifactResolver) -> Result<Plan, ComposeError> {
  let entries = validate(spec, resolver)?;
  Ok(plan(entries))
}

/// Build the output tree described by `spec` at `out_root`.
///
/// Validation errors are returned before anything is written. Any later
/// failure leaves `out_root` untouched.
pub async fn compose(
  spec: &ArtifactSpec,
  resolver: &dyn ArtifactResolver,
  out_root: &Path,
  config: &ComposeConfig,
) -> Result<ComposeResult, ComposeError> {
  info!(entries = spec.len(), out = %out_root.display(), "compose requested");
  let plan = plan_spec(spec, resolver)?;
  install::run(&plan, out_root, config).await
}
