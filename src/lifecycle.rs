//! Starting, stopping, and connecting to a chosen codespace.
//!
//! The only state berth distinguishes is available / not available:
//!
//! ```text
//! Unavailable --start--> Starting --(ssh responds)--> Available --stop--> Unavailable
//! ```
//!
//! Nothing here retries or rolls back. A failed transport open after a
//! successful start leaves the codespace running.

use std::path::PathBuf;

use serde::Serialize;

use crate::codespace::Codespace;
use crate::output::OutputSurfaces;
use crate::provider::{Captured, CodespaceCommand, Provider};
use crate::transport::{ProfileRegistry, RemotePath, Session, Transport};
use crate::{Error, Result};

/// Handle for a background start. There is no completion signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackgroundStart {
    pub pid: u32,
    /// Where the start command's output is streaming
    pub output: PathBuf,
}

/// Result of [`Lifecycle::connect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    /// Whether the codespace had to be started first
    pub started: bool,
    pub session: Session,
}

/// Where `connect` should land.
#[derive(Debug, Clone, Copy)]
pub struct ConnectTarget<'a> {
    pub profile: &'a str,
    pub mount_root: &'a str,
}

/// Drives provider lifecycle commands for one process.
pub struct Lifecycle<'a> {
    provider: &'a dyn Provider,
    surfaces: &'a OutputSurfaces,
}

impl<'a> Lifecycle<'a> {
    pub fn new(provider: &'a dyn Provider, surfaces: &'a OutputSurfaces) -> Self {
        Self { provider, surfaces }
    }

    /// Stop `codespace` and wait for the provider to finish.
    pub fn stop(&self, codespace: &Codespace) -> Result<Captured> {
        tracing::info!(codespace = %codespace.name, "stopping codespace");
        self.run_checked(&CodespaceCommand::stop(&codespace.name))
    }

    /// Start `codespace` in the background and return immediately.
    ///
    /// The command's output streams into the codespace's dedicated surface.
    pub fn start_async(&self, codespace: &Codespace) -> Result<BackgroundStart> {
        let surface = self.surfaces.for_start(&codespace.name);
        let pid = self
            .provider
            .spawn_detached(&CodespaceCommand::ssh_ready(&codespace.name), &surface)?;
        Ok(BackgroundStart {
            pid,
            output: surface.path().to_path_buf(),
        })
    }

    /// Start `codespace` and block until its ssh endpoint answers.
    ///
    /// Output, successful or not, replaces the shared surface's content.
    pub fn start_sync(&self, codespace: &Codespace) -> Result<Captured> {
        tracing::info!(codespace = %codespace.name, "starting codespace");
        let command = CodespaceCommand::ssh_ready(&codespace.name);
        let captured = self.provider.run(&command)?;
        self.surfaces.shared().write(&captured.combined())?;
        self.check(&command, captured)
    }

    /// Make sure `codespace` is running, then open its workspace root.
    pub fn connect(
        &self,
        codespace: &Codespace,
        transport: &dyn Transport,
        registry: &ProfileRegistry,
        target: ConnectTarget<'_>,
    ) -> Result<Connection> {
        let started = !codespace.is_available();
        if started {
            eprintln!(
                "Activating codespace {}, this may take some time...",
                codespace.readable_name()
            );
            self.start_sync(codespace)?;
        }

        let path = RemotePath::new(target.profile, &codespace.name, target.mount_root);
        let session = transport.open(registry, &path)?;
        Ok(Connection { started, session })
    }

    fn run_checked(&self, command: &CodespaceCommand) -> Result<Captured> {
        let captured = self.provider.run(command)?;
        self.check(command, captured)
    }

    fn check(&self, command: &CodespaceCommand, captured: Captured) -> Result<Captured> {
        if captured.success() {
            Ok(captured)
        } else {
            Err(Error::SubprocessFailure {
                command: format!("{} {}", self.provider.program(), command),
                stderr: captured.failure_text(),
            })
        }
    }
}
