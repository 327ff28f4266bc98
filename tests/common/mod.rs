//! Common test utilities for berth integration tests.
//!
//! Provides `TestEnv`, an isolated environment with its own config and data
//! directories and a fake `gh` script that serves canned `codespace list`
//! output and records every invocation.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
pub use tempfile::TempDir;

/// Two codespaces: "cs1" is running, "Beta Box" (cs2) is shut down.
pub const SAMPLE_LIST: &str = r#"[
  {"name":"cs1","displayName":"","repository":"octo/alpha","state":"Available","gitStatus":{"ref":"main"},"lastUsedAt":"2026-01-02T03:04:05Z"},
  {"name":"cs2","displayName":"Beta Box","repository":"octo/beta","state":"Shutdown","gitStatus":{"ref":"feature/x"},"lastUsedAt":"2026-01-01T00:00:00Z"}
]"#;

/// An isolated berth environment.
///
/// The `berth()` method returns a `Command` that sets `BERTH_GH`,
/// `BERTH_CONFIG_DIR` and `BERTH_DATA_DIR` per invocation, so tests can run
/// in parallel.
pub struct TestEnv {
    pub root: TempDir,
}

impl TestEnv {
    /// Create a new environment whose fake `gh` lists `SAMPLE_LIST`.
    pub fn new() -> Self {
        let env = Self {
            root: TempDir::new().unwrap(),
        };
        for dir in ["bin", "config", "data", "fake"] {
            fs::create_dir_all(env.root.path().join(dir)).unwrap();
        }
        env.set_list(SAMPLE_LIST);
        env.write_fake_gh();
        env
    }

    /// Get a Command for the berth binary inside this environment.
    pub fn berth(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_berth"));
        cmd.current_dir(self.root.path());
        cmd.env("BERTH_GH", self.gh_path());
        cmd.env("BERTH_CONFIG_DIR", self.config_dir());
        cmd.env("BERTH_DATA_DIR", self.data_dir());
        cmd.env_remove("BERTH_LOG");
        cmd.env_remove("BERTH_ACTION_LOG");
        cmd
    }

    pub fn gh_path(&self) -> PathBuf {
        self.root.path().join("bin").join("gh")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.path().join("config")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    fn fake_dir(&self) -> PathBuf {
        self.root.path().join("fake")
    }

    /// Replace what `gh codespace list` prints.
    pub fn set_list(&self, json: &str) {
        fs::write(self.fake_dir().join("list.json"), json).unwrap();
    }

    /// Make `gh codespace <subcommand>` exit 1 with `stderr`.
    pub fn fail(&self, subcommand: &str, stderr: &str) {
        fs::write(self.fake_dir().join(format!("{}-error", subcommand)), stderr).unwrap();
    }

    /// Write config.kdl in the isolated config directory.
    pub fn write_config(&self, content: &str) {
        fs::write(self.config_dir().join("config.kdl"), content).unwrap();
    }

    /// Every fake `gh` invocation so far, one argv per entry.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.fake_dir().join("calls.log"))
            .map(|s| s.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Wait until `path` contains `needle`, for detached processes.
    pub fn wait_for_content(path: &Path, needle: &str) -> bool {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if fs::read_to_string(path)
                .map(|s| s.contains(needle))
                .unwrap_or(false)
            {
                return true;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        false
    }

    fn write_fake_gh(&self) {
        let fake = self.fake_dir();
        let fake = fake.display();
        let script = format!(
            r#"#!/bin/sh
printf '%s\n' "$*" >> "{fake}/calls.log"
if [ "$1" != "codespace" ]; then
  echo "unknown command: $*" >&2
  exit 2
fi
if [ -f "{fake}/$2-error" ]; then
  cat "{fake}/$2-error" >&2
  exit 1
fi
case "$2" in
  list) cat "{fake}/list.json" ;;
  stop) ;;
  ssh) echo "Codespace ready." ;;
  *) echo "unknown command: $*" >&2; exit 2 ;;
esac
"#
        );

        let path = self.gh_path();
        fs::write(&path, script).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as JSON.
pub fn parse_json(stdout: &[u8]) -> serde_json::Value {
    serde_json::from_slice(stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({}): {}",
            e,
            String::from_utf8_lossy(stdout)
        )
    })
}
