//! The `gh` CLI as an opaque subprocess.
//!
//! [`CodespaceCommand`] builds the argv for each `gh codespace` subcommand
//! berth issues; [`Provider`] runs them. Arguments are passed as argv, never
//! through a local shell.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::output::OutputSurface;
use crate::{Error, Result};

/// Default provider program.
pub const DEFAULT_PROGRAM: &str = "gh";

/// Fields requested from `gh codespace list`.
pub const LIST_FIELDS: &str = "name,displayName,repository,state,gitStatus,lastUsedAt";

/// Remote command used to wake a codespace; it returns once ssh is responsive.
pub const READY_COMMAND: [&str; 2] = ["echo", "'Codespace ready.'"];

/// Builder for `gh codespace ...` argument vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodespaceCommand {
    args: Vec<String>,
}

impl CodespaceCommand {
    fn new(subcommand: &str) -> Self {
        Self {
            args: vec!["codespace".to_string(), subcommand.to_string()],
        }
    }

    fn flag_with_value(mut self, flag: &str, value: &str) -> Self {
        self.args.push(flag.to_string());
        self.args.push(value.to_string());
        self
    }

    fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// List codespaces as JSON.
    ///
    /// # Example
    /// ```
    /// use berth::provider::CodespaceCommand;
    /// assert_eq!(
    ///     CodespaceCommand::list().to_string(),
    ///     "codespace list --json name,displayName,repository,state,gitStatus,lastUsedAt"
    /// );
    /// ```
    pub fn list() -> Self {
        Self::new("list").flag_with_value("--json", LIST_FIELDS)
    }

    /// Stop a codespace.
    ///
    /// # Example
    /// ```
    /// use berth::provider::CodespaceCommand;
    /// assert_eq!(CodespaceCommand::stop("cs1").to_string(), "codespace stop -c cs1");
    /// ```
    pub fn stop(name: &str) -> Self {
        Self::new("stop").flag_with_value("-c", name)
    }

    /// Open an ssh session that only echoes a readiness message.
    ///
    /// Connecting over ssh is what makes the provider start a shut-down
    /// codespace, so this doubles as the start command.
    ///
    /// # Example
    /// ```
    /// use berth::provider::CodespaceCommand;
    /// assert_eq!(
    ///     CodespaceCommand::ssh_ready("cs1").to_string(),
    ///     "codespace ssh -c cs1 echo 'Codespace ready.'"
    /// );
    /// ```
    pub fn ssh_ready(name: &str) -> Self {
        READY_COMMAND
            .iter()
            .fold(Self::new("ssh").flag_with_value("-c", name), |cmd, a| cmd.arg(a))
    }

    /// The `gh codespace` subcommand ("list", "stop", "ssh").
    pub fn subcommand(&self) -> &str {
        &self.args[1]
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CodespaceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args.join(" "))
    }
}

/// Captured result of a synchronous provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    /// Exit code, `None` if the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Stdout followed by stderr, as a user would have seen it in a terminal.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }

    /// Error text to surface when the call failed.
    ///
    /// The provider's own stderr when it wrote any, otherwise the exit status.
    pub fn failure_text(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.status {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs `gh codespace` subcommands.
pub trait Provider {
    /// Program name or path invoked for every command.
    fn program(&self) -> &str;

    /// Run to completion, capturing stdout and stderr. Blocks with no timeout.
    fn run(&self, command: &CodespaceCommand) -> Result<Captured>;

    /// Launch without waiting, streaming stdout and stderr into `surface`.
    ///
    /// Returns the child's pid. The child is not tracked afterwards.
    fn spawn_detached(&self, command: &CodespaceCommand, surface: &OutputSurface) -> Result<u32>;
}

/// The real `gh` executable.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
}

impl GhCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve the program on `PATH` (or as a path).
    pub fn locate(&self) -> Result<PathBuf> {
        locate_program(&self.program)
    }

    fn command(&self, command: &CodespaceCommand) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(command.args());
        cmd
    }

    fn spawn_error(&self, e: io::Error) -> Error {
        if e.kind() == io::ErrorKind::NotFound {
            not_found(&self.program)
        } else {
            Error::Io(e)
        }
    }
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl Provider for GhCli {
    fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, command: &CodespaceCommand) -> Result<Captured> {
        tracing::debug!(program = %self.program, %command, "running provider command");

        let output = self
            .command(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        let captured = Captured {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(status = ?captured.status, "provider command finished");
        Ok(captured)
    }

    fn spawn_detached(&self, command: &CodespaceCommand, surface: &OutputSurface) -> Result<u32> {
        let stdout = surface.open_stream()?;
        let stderr = stdout.try_clone()?;

        let mut cmd = self.command(command);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));

        // Own process group so an interrupt aimed at berth does not reach it
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd.spawn().map_err(|e| self.spawn_error(e))?;
        let pid = child.id();
        tracing::info!(pid, %command, output = %surface.path().display(), "spawned detached provider command");
        Ok(pid)
    }
}

/// Resolve `program` the way a shell would.
pub fn locate_program(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| not_found(program))
}

fn not_found(program: &str) -> Error {
    Error::Environment(format!(
        "{} not found in PATH. Install the GitHub CLI from https://cli.github.com/ \
         or point berth at it with --gh or BERTH_GH.",
        program
    ))
}
