//! End-to-end composition behaviour.

use std::fs;
use std::path::Path;

use stagetree_lib::resolve::{AliasResolver, FsResolver};
use stagetree_lib::spec::{ArtifactSpec, TextEntry};
use stagetree_lib::util::hash::hash_tree;
use stagetree_lib::{ComposeConfig, ComposeError, compose};
use tempfile::TempDir;
use walkdir::WalkDir;

fn resolver(base: &Path) -> FsResolver {
  FsResolver::new(base)
}

/// Every non-directory entry under `root`, as absolute destination paths.
fn output_entries(root: &Path) -> Vec<String> {
  let mut entries: Vec<String> = WalkDir::new(root)
    .follow_links(false)
    .into_iter()
    .map(|e| e.unwrap())
    .filter(|e| !e.file_type().is_dir())
    .map(|e| format!("/{}", e.path().strip_prefix(root).unwrap().to_string_lossy()))
    .collect();
  entries.sort();
  entries
}

#[tokio::test]
async fn output_entries_match_spec_keys() {
  let temp = TempDir::new().unwrap();
  let artifact = temp.path().join("artifact");
  fs::create_dir(&artifact).unwrap();
  let out = temp.path().join("out");

  let spec = ArtifactSpec::new()
    .text("/bin/run", TextEntry::new("#!/bin/sh\nexec true").executable(true))
    .text("/share/app/config.json", TextEntry::new("{}"))
    .link("/lib/dep", "dep");

  let resolver = AliasResolver::new(resolver(temp.path())).with_alias("dep", &artifact);
  compose(&spec, &resolver, &out, &ComposeConfig::default())
    .await
    .unwrap();

  let mut keys: Vec<String> = spec.iter().map(|(k, _)| k.to_string()).collect();
  keys.sort();
  assert_eq!(output_entries(&out), keys);
}

#[tokio::test]
#[cfg(unix)]
async fn root_script_example() {
  use std::os::unix::fs::PermissionsExt;

  let temp = TempDir::new().unwrap();
  let out = temp.path().join("hi");
  let spec = ArtifactSpec::from_json(r##"{ "": { "text": "#!/bin/sh\necho hi", "executable": true } }"##).unwrap();

  compose(&spec, &resolver(temp.path()), &out, &ComposeConfig::default())
    .await
    .unwrap();

  assert!(out.is_file());
  assert_eq!(fs::read_to_string(&out).unwrap(), "#!/bin/sh\necho hi");
  assert_eq!(fs::metadata(&out).unwrap().permissions().mode() & 0o7777, 0o755);
}

#[tokio::test]
#[cfg(unix)]
async fn non_executable_defaults_to_0644() {
  use std::os::unix::fs::PermissionsExt;

  let temp = TempDir::new().unwrap();
  let out = temp.path().join("out");
  let spec = ArtifactSpec::from_json(r#"{ "/README": { "text": "read me", "executable": false } }"#).unwrap();

  compose(&spec, &resolver(temp.path()), &out, &ComposeConfig::default())
    .await
    .unwrap();

  let mode = fs::metadata(out.join("README")).unwrap().permissions().mode() & 0o7777;
  assert_eq!(mode, 0o644);
}

#[tokio::test]
async fn ambiguous_entry_fails_before_any_io() {
  let temp = TempDir::new().unwrap();
  let out = temp.path().join("out");
  let spec = ArtifactSpec::from_json(r#"{ "/ok": {"text": "x"}, "/x": { "link": "/opt", "text": "hi" } }"#).unwrap();

  let err = compose(&spec, &resolver(temp.path()), &out, &ComposeConfig::default())
    .await
    .unwrap_err();

  assert!(matches!(err, ComposeError::AmbiguousEntrySpec { .. }));
  assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn invalid_paths_fail_before_any_io() {
  let temp = TempDir::new().unwrap();
  let out = temp.path().join("out");

  for bad in ["../etc/passwd", "/etc/pass wd", "/etc/*"] {
    let spec = ArtifactSpec::new().text(bad, TextEntry::new("root::0:0"));
    let err = compose(&spec, &resolver(temp.path()), &out, &ComposeConfig::default())
      .await
      .unwrap_err();
    assert!(matches!(err, ComposeError::InvalidPath { .. }), "{bad}: {err}");
  }

  assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
#[cfg(unix)]
async fn rejected_check_fails_whole_build() {
  let temp = TempDir::new().unwrap();
  let out = temp.path().join("out");
  let spec = ArtifactSpec::new()
    .text("/good", TextEntry::new("fine"))
    .text("/bad.py", TextEntry::new("def (:").with_check("false"));

  let err = compose(&spec, &resolver(temp.path()), &out, &ComposeConfig::default())
    .await
    .unwrap_err();

  assert!(matches!(err, ComposeError::ValidationFailed { ref path, .. } if path == "/bad.py"));
  assert!(!out.join("bad.py").exists());
  assert!(!out.exists());
}

#[tokio::test]
#[cfg(unix)]
async fn accepted_check_installs_content() {
  let temp = TempDir::new().unwrap();
  let out = temp.path().join("out");
  let spec = ArtifactSpec::new().text(
    "/bin/script",
    TextEntry::new("#!/bin/sh\necho ok\n").executable(true).with_check("sh -n"),
  );

  let result = compose(&spec, &resolver(temp.path()), &out, &ComposeConfig::default())
    .await
    .unwrap();

  assert_eq!(fs::read_to_string(out.join("bin/script")).unwrap(), "#!/bin/sh\necho ok\n");
  assert_eq!(result.tree_hash, hash_tree(&out).unwrap());
}

#[tokio::test]
#[cfg(unix)]
async fn syntax_check_rejects_broken_script() {
  let temp = TempDir::new().unwrap();
  let out = temp.path().join("out");
  let spec = ArtifactSpec::new().text(
    "/bin/script",
    TextEntry::new("if then fi (").executable(true).with_check("sh -n"),
  );

  let err = compose(&spec, &resolver(temp.path()), &out, &ComposeConfig::default())
    .await
    .unwrap_err();

  assert!(matches!(err, ComposeError::ValidationFailed { .. }));
}

#[tokio::test]
async fn unresolved_link_is_reported() {
  let temp = TempDir::new().unwrap();
  let out = temp.path().join("out");
  let spec = ArtifactSpec::new().link("/lib/missing", "missing-artifact");

  let err = compose(&spec, &resolver(temp.path()), &out, &ComposeConfig::default())
    .await
    .unwrap_err();

  match err {
    ComposeError::UnresolvedLink { path, target, .. } => {
      assert_eq!(path, "/lib/missing");
      assert_eq!(target, "missing-artifact");
    }
    other => panic!("Expected UnresolvedLink, got {other:?}"),
  }
  assert!(!out.exists());
}
