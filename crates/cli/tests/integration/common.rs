//! Shared test helpers for CLI integration tests.
//!
//! Each test gets a throwaway repository layout plus stand-in `git` and `go`
//! executables on `PATH`, so the pipeline runs end to end without a real
//! repository or Go toolchain.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub const BASENAME: &str = "github.com/acme/repo";

/// Isolated test environment.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// A repository with `cmd/foo` depending on `pkg/foo` and `cmd/bar` on `pkg/bar`,
  /// where `changed` is what `git diff-tree` reports.
  pub fn with_changes(changed: &[&str]) -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    for dir in ["cmd/foo", "cmd/bar", "pkg/foo", "pkg/bar"] {
      env.write_file(&format!("{}/main.go", dir), "package main\n");
    }

    let diff = changed.iter().map(|f| format!("echo '{}'\n", f)).collect::<String>();
    env.write_tool("git", &format!("#!/bin/sh\n{}", diff));
    env.write_tool(
      "go",
      &format!(
        r#"#!/bin/sh
case "$4" in
  ./cmd/foo) printf 'fmt\n{base}/pkg/foo\n' ;;
  ./cmd/bar) printf 'os\n{base}/pkg/bar\n' ;;
  *) echo "unknown package $4" >&2; exit 1 ;;
esac
"#,
        base = BASENAME
      ),
    );
    env
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  fn bin_dir(&self) -> PathBuf {
    self.temp.path().join(".bin")
  }

  fn write_tool(&self, name: &str, script: &str) {
    let dir = self.bin_dir();
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  }

  /// Get a pre-configured Command for `artifact build` in this repository.
  ///
  /// Puts the stand-in tools first on `PATH` and clears every variable the CLI reads.
  pub fn build_cmd(&self) -> Command {
    let path = format!(
      "{}:{}",
      self.bin_dir().display(),
      std::env::var("PATH").unwrap_or_default()
    );
    let mut cmd: Command = cargo_bin_cmd!("artifact");
    cmd.env("PATH", path);
    for var in [
      "ARTIFACT_GIT_RANGE_START",
      "GIT_PREVIOUS_COMMIT",
      "ARTIFACT_GIT_RANGE_END",
      "GIT_COMMIT",
      "ARTIFACT_BUILD_COMMAND",
      "ARTIFACT_LOG_DIR",
    ] {
      cmd.env_remove(var);
    }
    cmd
      .arg("build")
      .arg("--working-directory")
      .arg(self.root())
      .args(["--repo-basename", BASENAME, "--skip-nested-entrypoints=false"]);
    cmd
  }
}
