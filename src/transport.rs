//! Remote-access transport profiles.
//!
//! A [`TransportProfile`] tells a remote-access layer how to reach a
//! codespace: log in with `gh codespace ssh -c <host>` and run commands
//! through `/bin/sh -l -c`. Profiles live in a [`ProfileRegistry`] owned by
//! the running process and passed to whichever [`Transport`] opens a path.

use std::collections::HashMap;
use std::fmt;
use std::process::Command;

use serde::Serialize;

use crate::provider::locate_program;
use crate::{Error, Result};

/// Profile name used when the config does not set one.
pub const DEFAULT_PROFILE_NAME: &str = "ghcs";

/// Mount root the provider creates in every codespace.
pub const DEFAULT_MOUNT_ROOT: &str = "/workspaces";

/// Placeholder in `login_args` replaced by the codespace name.
pub const HOST_PLACEHOLDER: &str = "%h";

/// Connection parameters for one named remote-access method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransportProfile {
    pub name: String,
    pub login_program: String,
    /// Arguments after `login_program`; [`HOST_PLACEHOLDER`] marks the host
    pub login_args: Vec<String>,
    pub remote_shell: String,
    pub login_shell_flag: String,
    pub command_flag: String,
}

impl TransportProfile {
    /// Profile routing through `<program> codespace ssh -c <host>`.
    pub fn for_provider(name: &str, program: &str) -> Self {
        Self {
            name: name.to_string(),
            login_program: program.to_string(),
            login_args: ["codespace", "ssh", "-c", HOST_PLACEHOLDER]
                .map(String::from)
                .to_vec(),
            remote_shell: "/bin/sh".to_string(),
            login_shell_flag: "-l".to_string(),
            command_flag: "-c".to_string(),
        }
    }

    /// Full login argv for `host`, program first.
    pub fn login_argv(&self, host: &str) -> Vec<String> {
        std::iter::once(self.login_program.clone())
            .chain(self.login_args.iter().map(|a| a.replace(HOST_PLACEHOLDER, host)))
            .collect()
    }

    /// Remote command line that runs `script` through the remote shell.
    pub fn remote_command(&self, script: &str) -> String {
        format!(
            "{} {} {} {}",
            self.remote_shell,
            self.login_shell_flag,
            self.command_flag,
            shell_quote(script)
        )
    }
}

/// Named transport profiles for the lifetime of the process.
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: HashMap<String, TransportProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `profile`, replacing any profile of the same name wholesale.
    ///
    /// Returns the replaced profile, if there was one.
    pub fn register(&mut self, profile: TransportProfile) -> Option<TransportProfile> {
        self.profiles.insert(profile.name.clone(), profile)
    }

    pub fn get(&self, name: &str) -> Option<&TransportProfile> {
        self.profiles.get(name)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Check the provider CLI is installed and register its transport profile.
///
/// JSON support is compiled in, so the only environment check is that
/// `program` resolves. Calling this again overwrites the profile.
pub fn setup(
    registry: &mut ProfileRegistry,
    profile_name: &str,
    program: &str,
) -> Result<TransportProfile> {
    let resolved = locate_program(program)?;
    tracing::debug!(program, resolved = %resolved.display(), "provider CLI found");

    let profile = TransportProfile::for_provider(profile_name, program);
    if registry.register(profile.clone()).is_some() {
        tracing::debug!(profile = profile_name, "replaced existing transport profile");
    }
    Ok(profile)
}

/// `<profile>:<host>:<path>` address handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    pub profile: String,
    pub host: String,
    pub path: String,
}

impl RemotePath {
    pub fn new(profile: &str, host: &str, path: &str) -> Self {
        Self {
            profile: profile.to_string(),
            host: host.to_string(),
            path: path.to_string(),
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.profile, self.host, self.path)
    }
}

/// What a transport did when asked to open a remote path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub remote_path: String,
    /// Local argv that reaches the remote path
    pub argv: Vec<String>,
    /// Whether berth ran the session itself
    pub interactive: bool,
}

/// Opens remote paths using a registered profile.
pub trait Transport {
    fn open(&self, registry: &ProfileRegistry, path: &RemotePath) -> Result<Session>;
}

fn lookup<'r>(registry: &'r ProfileRegistry, path: &RemotePath) -> Result<&'r TransportProfile> {
    registry.get(&path.profile).ok_or_else(|| {
        Error::Environment(format!(
            "Transport profile '{}' is not registered. Run `berth setup` first.",
            path.profile
        ))
    })
}

/// Argv that logs in and drops into a login shell at the remote path.
fn shell_argv(profile: &TransportProfile, path: &RemotePath) -> Vec<String> {
    let script = format!("cd {} && exec \"${{SHELL:-/bin/sh}}\" -l", shell_quote(&path.path));
    let mut argv = profile.login_argv(&path.host);
    argv.extend(["--".to_string(), "-t".to_string()]);
    argv.push(profile.remote_command(&script));
    argv
}

/// Resolves the path and reports how to reach it, for an external browser or editor.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintTransport;

impl Transport for PrintTransport {
    fn open(&self, registry: &ProfileRegistry, path: &RemotePath) -> Result<Session> {
        let profile = lookup(registry, path)?;
        Ok(Session {
            remote_path: path.to_string(),
            argv: shell_argv(profile, path),
            interactive: false,
        })
    }
}

/// Runs an interactive login shell at the remote path on this terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellTransport;

impl Transport for ShellTransport {
    fn open(&self, registry: &ProfileRegistry, path: &RemotePath) -> Result<Session> {
        let profile = lookup(registry, path)?;
        let argv = shell_argv(profile, path);
        tracing::info!(remote_path = %path, "opening interactive session");

        let status = Command::new(&argv[0]).args(&argv[1..]).status()?;
        if !status.success() {
            return Err(Error::SubprocessFailure {
                command: argv.join(" "),
                stderr: match status.code() {
                    Some(code) => format!("exited with status {}", code),
                    None => "terminated by signal".to_string(),
                },
            });
        }

        Ok(Session {
            remote_path: path.to_string(),
            argv,
            interactive: true,
        })
    }
}

/// Single-quote `s` for a POSIX shell.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_profile_parameters() {
        let profile = TransportProfile::for_provider("ghcs", "gh");
        assert_eq!(profile.login_program, "gh");
        assert_eq!(profile.login_args, vec!["codespace", "ssh", "-c", "%h"]);
        assert_eq!(profile.remote_shell, "/bin/sh");
        assert_eq!(profile.login_shell_flag, "-l");
        assert_eq!(profile.command_flag, "-c");
    }

    #[test]
    fn test_login_argv_substitutes_host() {
        let profile = TransportProfile::for_provider("ghcs", "/usr/bin/gh");
        assert_eq!(
            profile.login_argv("cs1"),
            vec!["/usr/bin/gh", "codespace", "ssh", "-c", "cs1"]
        );
    }

    #[test]
    fn test_register_twice_keeps_only_second() {
        let mut registry = ProfileRegistry::new();
        let first = TransportProfile::for_provider("ghcs", "gh");
        let mut second = TransportProfile::for_provider("ghcs", "/opt/gh/bin/gh");
        second.remote_shell = "/bin/bash".to_string();
        second.login_args = vec!["cs".to_string(), "ssh".to_string(), "%h".to_string()];

        assert!(registry.register(first.clone()).is_none());
        assert_eq!(registry.register(second.clone()), Some(first));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("ghcs"), Some(&second));
    }

    #[cfg(unix)]
    #[test]
    fn test_setup_registers_profile_for_resolvable_program() {
        let mut registry = ProfileRegistry::new();
        let profile = setup(&mut registry, "ghcs", "sh").unwrap();
        assert_eq!(registry.get("ghcs"), Some(&profile));

        // Idempotent
        setup(&mut registry, "ghcs", "sh").unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_setup_fails_when_program_missing() {
        let mut registry = ProfileRegistry::new();
        let err = setup(&mut registry, "ghcs", "berth-no-such-gh").unwrap_err();
        assert!(matches!(err, Error::Environment(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remote_path_format() {
        let path = RemotePath::new("ghcs", "cs1", DEFAULT_MOUNT_ROOT);
        assert_eq!(path.to_string(), "ghcs:cs1:/workspaces");
    }

    #[test]
    fn test_print_transport_requires_registered_profile() {
        let registry = ProfileRegistry::new();
        let err = PrintTransport
            .open(&registry, &RemotePath::new("ghcs", "cs1", "/workspaces"))
            .unwrap_err();
        assert!(err.to_string().contains("berth setup"));
    }

    #[test]
    fn test_print_transport_session() {
        let mut registry = ProfileRegistry::new();
        registry.register(TransportProfile::for_provider("ghcs", "gh"));

        let session = PrintTransport
            .open(&registry, &RemotePath::new("ghcs", "cs1", "/workspaces"))
            .unwrap();

        assert_eq!(session.remote_path, "ghcs:cs1:/workspaces");
        assert!(!session.interactive);
        assert_eq!(
            session.argv,
            vec![
                "gh",
                "codespace",
                "ssh",
                "-c",
                "cs1",
                "--",
                "-t",
                r#"/bin/sh -l -c 'cd '\''/workspaces'\'' && exec "${SHELL:-/bin/sh}" -l'"#,
            ]
        );
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
