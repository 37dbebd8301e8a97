//! Staging plans.
//!
//! A [`Plan`] is the ordered list of per-entry installation steps derived
//! from validated entries. Planning is pure and deterministic: the same
//! entries always yield the same steps, identifiers included.

mod types;

pub use types::*;

use tracing::debug;

use crate::spec::{EntrySpec, ValidEntry};
use crate::util::hash::VarName;

/// Turn validated entries into installation steps, preserving their order.
pub fn plan(entries: Vec<ValidEntry>) -> Plan {
  let steps: Vec<InstallStep> = entries.into_iter().map(plan_entry).collect();
  debug!(steps = steps.len(), "plan computed");
  Plan { steps }
}

fn plan_entry(entry: ValidEntry) -> InstallStep {
  let action = match entry.spec {
    EntrySpec::Link(link) => StepAction::Link { target: link.target },
    EntrySpec::Text(text) => StepAction::Text {
      var: VarName::for_path(entry.path.as_str()),
      mode: text.effective_mode(),
      content: text.content,
      check: text.check,
    },
  };

  InstallStep {
    path: entry.path,
    action,
  }
}
