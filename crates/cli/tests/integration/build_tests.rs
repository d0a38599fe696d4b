//! Build command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn dry_run_reports_affected_entrypoint() {
  let env = TestEnv::with_changes(&["pkg/foo/util.go"]);

  env
    .build_cmd()
    .args(["--git-range-start", "old", "--git-range-end", "new"])
    .assert()
    .success()
    .stdout(predicate::str::diff("cmd/foo\n"))
    .stderr(predicate::str::contains("Would rebuild 1 target"));
}

#[test]
fn builds_run_in_working_directory() {
  let env = TestEnv::with_changes(&["pkg/foo/util.go", "pkg/bar/util.go"]);

  env
    .build_cmd()
    .args(["--git-range-start", "old", "--git-range-end", "new", "--dry-run=false"])
    .args(["--build-command", "/usr/bin/touch {{entrypoint}}built"])
    .assert()
    .success()
    .stderr(predicate::str::contains("Rebuilt 2 targets"));

  assert!(env.root().join("cmd/foo/built").exists());
  assert!(env.root().join("cmd/bar/built").exists());
}

#[test]
fn build_logs_are_persisted() {
  let env = TestEnv::with_changes(&["pkg/bar/util.go"]);
  let logs = env.root().join("logs");

  env
    .build_cmd()
    .args(["--git-range-start", "old", "--git-range-end", "new", "--dry-run=false"])
    .args(["--build-command", "/bin/echo building {{entrypoint}}"])
    .arg("--log-dir")
    .arg(&logs)
    .assert()
    .success();

  let log = std::fs::read_to_string(logs.join("cmd_bar.log")).unwrap();
  assert_eq!(log, "building ./cmd/bar/\n");
  assert!(!logs.join("cmd_foo.log").exists());
}

#[test]
fn range_from_ci_environment() {
  let env = TestEnv::with_changes(&["pkg/foo/util.go"]);

  env
    .build_cmd()
    .env("GIT_PREVIOUS_COMMIT", "old")
    .env("GIT_COMMIT", "new")
    .assert()
    .success()
    .stdout(predicate::str::contains("cmd/foo"));
}

#[test]
fn unrelated_change_fails_with_no_targets() {
  let env = TestEnv::with_changes(&["docs/readme.md"]);

  env
    .build_cmd()
    .args(["--git-range-start", "old", "--git-range-end", "new"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no targets need to be rebuilt"));
}

#[test]
fn empty_diff_fails_with_no_changes() {
  let env = TestEnv::with_changes(&[]);

  env
    .build_cmd()
    .args(["--git-range-start", "old", "--git-range-end", "new"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no changes were found"));
}

#[test]
fn json_report_is_terminal() {
  let env = TestEnv::with_changes(&["pkg/foo/util.go"]);

  env
    .build_cmd()
    .args(["--git-range-start", "old", "--git-range-end", "new", "--out-format", "json"])
    .assert()
    .failure()
    .stdout(predicate::str::diff("[\"cmd/foo\"]\n"))
    .stderr(predicate::str::contains("no valid rebuild targets determined"));
}

#[test]
fn json_report_can_continue_to_build() {
  let env = TestEnv::with_changes(&["pkg/foo/util.go"]);

  env
    .build_cmd()
    .args(["--git-range-start", "old", "--git-range-end", "new", "--out-format", "json"])
    .arg("--build-after-report=true")
    .assert()
    .success()
    .stdout(predicate::str::diff("[\"cmd/foo\"]\n"));
}

#[test]
fn unknown_format_is_rejected() {
  let env = TestEnv::with_changes(&["pkg/foo/util.go"]);

  env
    .build_cmd()
    .args(["--git-range-start", "old", "--git-range-end", "new", "--out-format", "yaml"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid output format"));
}

#[test]
fn failing_build_aborts_run() {
  let env = TestEnv::with_changes(&["pkg/foo/util.go"]);

  env
    .build_cmd()
    .args(["--git-range-start", "old", "--git-range-end", "new", "--dry-run=false"])
    .args(["--build-command", "/bin/sh -c 'exit 7' {{entrypoint}}"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("exit code 7"));
}

#[test]
fn build_command_from_environment() {
  let env = TestEnv::with_changes(&["pkg/bar/util.go"]);

  env
    .build_cmd()
    .env("ARTIFACT_BUILD_COMMAND", "/usr/bin/touch {{entrypoint}}from_env")
    .args(["--git-range-start", "old", "--git-range-end", "new", "--dry-run=false"])
    .assert()
    .success();

  assert!(env.root().join("cmd/bar/from_env").exists());
  assert!(!env.root().join("cmd/foo/from_env").exists());
}
