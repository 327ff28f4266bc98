//! Action log for berth commands.
//!
//! Every command appends one JSON line to `<data dir>/action.log`. Set
//! `BERTH_ACTION_LOG=0` to turn it off. Codespace state is never recorded,
//! only which command ran and how it ended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable that disables the action log when set to 0/false/no.
pub const ACTION_LOG_ENV: &str = "BERTH_ACTION_LOG";

/// Represents a single action log entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionLog {
    /// ISO 8601 timestamp when the action occurred
    pub timestamp: DateTime<Utc>,

    /// Command name (e.g., "connect", "config show")
    pub command: String,

    /// Command arguments as JSON
    pub args: serde_json::Value,

    /// Whether the command succeeded
    pub success: bool,

    /// Error message if the command failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Command execution duration in milliseconds
    pub duration_ms: u64,

    /// User who executed the command
    pub user: String,
}

/// Log an action under `data_dir`.
///
/// Never fails the caller: problems writing the log are reported on stderr.
pub fn log_action(
    data_dir: &Path,
    command: &str,
    args: serde_json::Value,
    success: bool,
    error: Option<String>,
    duration_ms: u64,
) {
    if !enabled() {
        return;
    }

    let entry = ActionLog {
        timestamp: Utc::now(),
        command: command.to_string(),
        args: sanitize_args(&args),
        success,
        error,
        duration_ms,
        user: get_current_user(),
    };

    if let Err(e) = write_log_entry(&log_path(data_dir), &entry) {
        eprintln!("Warning: Failed to write action log: {}", e);
    }
}

/// Location of the action log inside `data_dir`.
pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("action.log")
}

fn enabled() -> bool {
    match std::env::var(ACTION_LOG_ENV) {
        Ok(value) => !matches!(value.to_lowercase().as_str(), "0" | "false" | "no" | "off"),
        Err(_) => true,
    }
}

/// Write a log entry to the log file.
fn write_log_entry(path: &Path, entry: &ActionLog) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", json)?;

    Ok(())
}

/// Redact secret-looking keys and truncate long strings.
fn sanitize_args(args: &serde_json::Value) -> serde_json::Value {
    match args {
        serde_json::Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, value) in map {
                let key_lower = key.to_lowercase();
                if key_lower.contains("password")
                    || key_lower.contains("token")
                    || key_lower.contains("secret")
                {
                    sanitized.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    sanitized.insert(key.clone(), sanitize_args(value));
                }
            }
            serde_json::Value::Object(sanitized)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(sanitize_args).collect())
        }
        serde_json::Value::String(s) if s.chars().count() > 100 => {
            let head: String = s.chars().take(97).collect();
            serde_json::Value::String(format!("{}... ({} chars)", head, s.chars().count()))
        }
        _ => args.clone(),
    }
}

/// Get the current user's username.
fn get_current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_keeps_labels() {
        let value = serde_json::json!({ "name": "My Box", "wait": true });
        assert_eq!(sanitize_args(&value), value);
    }

    #[test]
    fn test_sanitize_redacts_secrets() {
        let value = serde_json::json!({ "github_token": "ghp_abc", "name": "cs1" });
        assert_eq!(
            sanitize_args(&value),
            serde_json::json!({ "github_token": "[REDACTED]", "name": "cs1" })
        );
    }

    #[test]
    fn test_sanitize_long_string() {
        let long_str = "a".repeat(150);
        let sanitized = sanitize_args(&serde_json::json!(long_str));
        let s = sanitized.as_str().unwrap();
        assert!(s.starts_with(&"a".repeat(97)));
        assert!(s.ends_with("... (150 chars)"));
    }

    #[test]
    #[serial]
    fn test_log_action_appends_lines() {
        let dir = TempDir::new().unwrap();
        // SAFETY: test-only and serialized with #[serial]
        unsafe { std::env::remove_var(ACTION_LOG_ENV) };

        log_action(dir.path(), "list", serde_json::json!({}), true, None, 12);
        log_action(
            dir.path(),
            "stop",
            serde_json::json!({ "name": "cs1" }),
            false,
            Some("boom".to_string()),
            40,
        );

        let content = fs::read_to_string(log_path(dir.path())).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: ActionLog = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.command, "stop");
        assert!(!second.success);
        assert_eq!(second.error.as_deref(), Some("boom"));
    }

    #[test]
    #[serial]
    fn test_log_action_disabled() {
        let dir = TempDir::new().unwrap();
        // SAFETY: test-only and serialized with #[serial]
        unsafe { std::env::set_var(ACTION_LOG_ENV, "0") };
        log_action(dir.path(), "list", serde_json::json!({}), true, None, 1);
        unsafe { std::env::remove_var(ACTION_LOG_ENV) };

        assert!(!log_path(dir.path()).exists());
    }
}
