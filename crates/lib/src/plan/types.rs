use serde::{Deserialize, Serialize};

use crate::spec::{DestPath, FileMode};
use crate::util::hash::VarName;

/// Ordered installation steps for one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
  pub steps: Vec<InstallStep>,
}

impl Plan {
  /// True when the plan produces a single file or link at the output root.
  pub fn is_root(&self) -> bool {
    self.steps.len() == 1 && self.steps[0].path.is_root()
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }
}

/// Installation of a single destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallStep {
  pub path: DestPath,
  pub action: StepAction,
}

impl InstallStep {
  /// Directories that must exist before installing, shortest first.
  pub fn parents(&self) -> Vec<&str> {
    self.path.ancestors()
  }

  pub fn var(&self) -> Option<&VarName> {
    match &self.action {
      StepAction::Text { var, .. } => Some(var),
      StepAction::Link { .. } => None,
    }
  }

  pub fn check(&self) -> Option<&str> {
    match &self.action {
      StepAction::Text { check, .. } => check.as_deref(),
      StepAction::Link { .. } => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepAction {
  /// Create a symlink at the destination pointing at `target`, verbatim.
  Link { target: String },

  /// Stage `content` under `var`, run `check` on it, then install it with `mode`.
  Text {
    var: VarName,
    content: String,
    mode: FileMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    check: Option<String>,
  },
}
