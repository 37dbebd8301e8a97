//! Implementation of the `stagetree plan` command.
//!
//! Validates a spec and prints the installation steps it would run. The
//! filesystem is only read (to resolve link targets), never written.

use anyhow::{Context, Result};

use stagetree_lib::plan::StepAction;
use stagetree_lib::plan_spec;

use super::ResolveArgs;
use crate::input::load_spec;
use crate::output::{OutputFormat, print_info, print_json, symbols};

pub fn cmd_plan(spec_source: &str, resolve: &ResolveArgs, output: OutputFormat) -> Result<()> {
  let spec = load_spec(spec_source)?;
  let resolver = resolve.resolver()?;

  let plan = plan_spec(&spec, &resolver).context("Invalid spec")?;

  if output.is_json() {
    return print_json(&plan);
  }

  print_info(&format!("{} step(s)", plan.len()));
  for step in &plan.steps {
    match &step.action {
      StepAction::Text { var, mode, check, .. } => {
        println!("  {} {} {} [{}]", symbols::ADD, step.path, mode, var);
        if let Some(check) = check {
          println!("      check: {}", check);
        }
      }
      StepAction::Link { target } => {
        println!("  {} {} {} {}", symbols::ADD, step.path, symbols::ARROW, target);
      }
    }
  }

  Ok(())
}
