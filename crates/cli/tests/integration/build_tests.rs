//! Tests for `stagetree build`.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
#[cfg(unix)]
fn builds_root_script() {
  use std::os::unix::fs::PermissionsExt;

  let env = TestEnv::with_spec(r##"{ "": { "text": "#!/bin/sh\necho hi", "executable": true } }"##);

  env
    .build_cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("Build complete"));

  let out = env.out_path();
  assert!(out.is_file());
  assert_eq!(std::fs::read_to_string(&out).unwrap(), "#!/bin/sh\necho hi");
  assert_eq!(std::fs::metadata(&out).unwrap().permissions().mode() & 0o7777, 0o755);
}

#[test]
#[cfg(unix)]
fn builds_tree_with_links_and_checks() {
  let env = TestEnv::with_spec(
    r#"{
      "/bin/hello": { "text": "echo hello\n", "executable": true, "check": "sh -n" },
      "/share/hello/data": { "link": "pkg-data" },
      "/etc/hello.conf": { "text": "greeting = hi\n", "mode": "0600" }
    }"#,
  );
  let data = env.write_file("vendor/data.txt", "data");

  env
    .build_cmd()
    .arg("--artifact")
    .arg(format!("pkg-data={}", data.display()))
    .assert()
    .success()
    .stdout(predicate::str::contains("/bin/hello 0755 (checked)"));

  let out = env.out_path();
  assert_eq!(std::fs::read_to_string(out.join("bin/hello")).unwrap(), "echo hello\n");
  assert_eq!(std::fs::read_link(out.join("share/hello/data")).unwrap(), data);
  assert!(out.join("etc/hello.conf").is_file());
}

#[test]
fn relative_link_targets_use_base_dir() {
  let env = TestEnv::with_spec(r#"{ "/lib/thing": { "link": "thing" } }"#);
  env.write_file("artifacts/thing", "x");

  env
    .build_cmd()
    .arg("--base-dir")
    .arg(env.temp.path().join("artifacts"))
    .assert()
    .success();

  assert!(std::fs::symlink_metadata(env.out_path().join("lib/thing")).is_ok());
}

#[test]
#[cfg(unix)]
fn failed_check_fails_build_and_publishes_nothing() {
  let env = TestEnv::with_spec(
    r#"{
      "/ok": { "text": "fine" },
      "/broken.sh": { "text": "if then (", "check": "sh -n" }
    }"#,
  );

  env
    .build_cmd()
    .assert()
    .failure()
    .stderr(predicate::str::contains("check failed for \"/broken.sh\""));

  assert!(!env.out_path().exists());
}

#[test]
fn ambiguous_entry_fails() {
  let env = TestEnv::with_spec(r#"{ "/x": { "link": "/opt", "text": "hi" } }"#);

  env
    .build_cmd()
    .assert()
    .failure()
    .stderr(predicate::str::contains("exactly one of `link` or `text`"));

  assert!(!env.out_path().exists());
}

#[test]
fn invalid_path_fails() {
  let env = TestEnv::with_spec(r#"{ "../etc/passwd": { "text": "x" } }"#);

  env
    .build_cmd()
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid destination path \"../etc/passwd\""));
}

#[test]
fn existing_output_requires_force() {
  let env = TestEnv::with_spec(r#"{ "/a": { "text": "new" } }"#);
  env.write_file("out/old", "old");

  env
    .build_cmd()
    .assert()
    .failure()
    .stderr(predicate::str::contains("already exists"));

  env.build_cmd().arg("--force").assert().success();

  assert!(!env.out_path().join("old").exists());
  assert_eq!(std::fs::read_to_string(env.out_path().join("a")).unwrap(), "new");
}

#[test]
fn json_output_reports_entries_and_hash() {
  let env = TestEnv::with_spec(r#"{ "/a": { "text": "1" }, "/b/c": { "text": "2", "executable": true } }"#);

  let output = env.build_cmd().arg("--output").arg("json").output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["entries"].as_array().unwrap().len(), 2);
  assert_eq!(json["entries"][0]["path"], "/a");
  assert_eq!(json["entries"][1]["mode"], "0755");
  assert_eq!(json["tree_hash"].as_str().unwrap().len(), 64);
}

#[test]
fn repeated_builds_hash_identically() {
  let env = TestEnv::with_spec(r#"{ "/bin/x": { "text": "x", "executable": true }, "/doc": { "text": "d" } }"#);

  env.build_cmd().assert().success();
  let first = env.stagetree_cmd().arg("hash").arg(env.out_path()).output().unwrap();

  env.build_cmd().arg("--force").arg("--jobs").arg("4").assert().success();
  let second = env.stagetree_cmd().arg("hash").arg(env.out_path()).output().unwrap();

  assert!(first.status.success());
  assert_eq!(first.stdout, second.stdout);
}
