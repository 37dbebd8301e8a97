//! Building the same spec twice yields identical trees and identifiers.

use stagetree_lib::plan_spec;
use stagetree_lib::resolve::FsResolver;
use stagetree_lib::spec::{ArtifactSpec, FileMode, TextEntry};
use stagetree_lib::util::hash::VarName;
use stagetree_lib::{ComposeConfig, compose};
use tempfile::TempDir;

fn sample_spec() -> ArtifactSpec {
  ArtifactSpec::new()
    .text("/bin/a", TextEntry::new("#!/bin/sh\necho a").executable(true))
    .text("/etc/a.conf", TextEntry::new("key = value\n").with_mode(FileMode(0o600)))
    .text("/share/doc/a/README", TextEntry::new("docs"))
    .link("/share/base", "base")
}

#[tokio::test]
async fn same_spec_builds_identical_trees() {
  let temp = TempDir::new().unwrap();
  std::fs::create_dir(temp.path().join("base")).unwrap();
  let resolver = FsResolver::new(temp.path());
  let spec = sample_spec();

  let first = compose(&spec, &resolver, &temp.path().join("one"), &ComposeConfig::default())
    .await
    .unwrap();
  let second = compose(&spec, &resolver, &temp.path().join("two"), &ComposeConfig::default())
    .await
    .unwrap();

  assert_eq!(first.tree_hash, second.tree_hash);
  assert_eq!(first.entries, second.entries);
}

#[test]
fn identifiers_are_stable_across_plans() {
  let temp = TempDir::new().unwrap();
  std::fs::create_dir(temp.path().join("base")).unwrap();
  let resolver = FsResolver::new(temp.path());

  let first = plan_spec(&sample_spec(), &resolver).unwrap();
  let second = plan_spec(&sample_spec(), &resolver).unwrap();

  let ids = |plan: &stagetree_lib::plan::Plan| plan.steps.iter().filter_map(|s| s.var().cloned()).collect::<Vec<_>>();
  assert_eq!(ids(&first), ids(&second));
  assert_eq!(ids(&first)[0], VarName::for_path("/bin/a"));
  assert_eq!(ids(&first).len(), 3);
}

#[test]
fn parsed_and_built_specs_plan_identically() {
  let temp = TempDir::new().unwrap();
  let resolver = FsResolver::new(temp.path());
  let json = r#"{
    "/bin/a": { "text": "x", "executable": true },
    "/etc/b": { "text": "y", "mode": "0600", "check": "true" }
  }"#;
  let built = ArtifactSpec::new()
    .text("/bin/a", TextEntry::new("x").executable(true))
    .text("/etc/b", TextEntry::new("y").with_mode(FileMode(0o600)).with_check("true"));

  assert_eq!(
    plan_spec(&ArtifactSpec::from_json(json).unwrap(), &resolver).unwrap(),
    plan_spec(&built, &resolver).unwrap()
  );
}
