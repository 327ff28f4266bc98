//! Command implementations for the Berth CLI.
//!
//! Each command returns a result type implementing [`Output`], so `main`
//! can print it as JSON or human-readable text. Every command that picks a
//! codespace fetches a fresh inventory first.

use std::path::PathBuf;

use serde::Serialize;

use crate::codespace::Codespace;
use crate::config::ResolvedConfig;
use crate::inventory::{self, Inventory};
use crate::lifecycle::{ConnectTarget, Lifecycle};
use crate::output::OutputSurfaces;
use crate::provider::{GhCli, Provider};
use crate::selector::{self, Selector};
use crate::transport::{self, ProfileRegistry, Session, Transport, TransportProfile};
use crate::Result;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Everything a command needs for one process run.
pub struct Context {
    pub config: ResolvedConfig,
    pub data_dir: PathBuf,
    pub provider: Box<dyn Provider>,
    pub surfaces: OutputSurfaces,
    pub registry: ProfileRegistry,
}

impl Context {
    /// Context backed by the real `gh` program from `config`.
    pub fn new(config: ResolvedConfig, data_dir: PathBuf) -> Self {
        let provider = Box::new(GhCli::new(config.gh_program()));
        Self::with_provider(config, data_dir, provider)
    }

    pub fn with_provider(
        config: ResolvedConfig,
        data_dir: PathBuf,
        provider: Box<dyn Provider>,
    ) -> Self {
        Self {
            surfaces: OutputSurfaces::in_data_dir(&data_dir),
            config,
            data_dir,
            provider,
            registry: ProfileRegistry::new(),
        }
    }

    fn lifecycle(&self) -> Lifecycle<'_> {
        Lifecycle::new(self.provider.as_ref(), &self.surfaces)
    }

    /// Run setup unless this process already registered the profile.
    fn ensure_setup(&mut self) -> Result<()> {
        if self.registry.get(self.config.profile_name()).is_none() {
            setup(self)?;
        }
        Ok(())
    }

    fn fetch(&self) -> Result<Inventory> {
        inventory::fetch_all(self.provider.as_ref())
    }
}

// === Setup ===

#[derive(Serialize)]
pub struct SetupResult {
    pub profile: TransportProfile,
}

impl Output for SetupResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let p = &self.profile;
        let mut lines = vec![format!("Registered transport profile '{}'", p.name)];
        lines.push(format!(
            "  login:  {} {}",
            p.login_program,
            p.login_args.join(" ")
        ));
        lines.push(format!(
            "  shell:  {} {} {}",
            p.remote_shell, p.login_shell_flag, p.command_flag
        ));
        lines.join("\n")
    }
}

/// Check the provider CLI and (re-)register the transport profile.
pub fn setup(ctx: &mut Context) -> Result<SetupResult> {
    let profile = transport::setup(
        &mut ctx.registry,
        ctx.config.profile_name(),
        ctx.config.gh_program(),
    )?;
    Ok(SetupResult { profile })
}

// === List ===

/// Which slice of the inventory `list` shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    All,
    Available,
    Unavailable,
}

#[derive(Serialize)]
pub struct ListEntry {
    pub label: String,
    #[serde(flatten)]
    pub codespace: Codespace,
}

#[derive(Serialize)]
pub struct ListResult {
    pub count: usize,
    pub codespaces: Vec<ListEntry>,
}

impl Output for ListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.codespaces.is_empty() {
            return "No codespaces.".to_string();
        }
        let width = self
            .codespaces
            .iter()
            .map(|e| e.label.chars().count())
            .max()
            .unwrap_or(0);
        self.codespaces
            .iter()
            .map(|e| {
                format!(
                    "{:<width$}{}",
                    e.label,
                    e.codespace.annotation(),
                    width = width
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn list(ctx: &Context, filter: ListFilter) -> Result<ListResult> {
    let all = ctx.fetch()?;
    let shown = match filter {
        ListFilter::All => all,
        ListFilter::Available => inventory::available(&all),
        ListFilter::Unavailable => inventory::unavailable(&all),
    };
    let codespaces: Vec<ListEntry> = shown
        .iter()
        .map(|(label, cs)| ListEntry {
            label: label.to_string(),
            codespace: cs.clone(),
        })
        .collect();
    Ok(ListResult {
        count: codespaces.len(),
        codespaces,
    })
}

// === Connect ===

#[derive(Debug, Serialize)]
pub struct ConnectResult {
    pub label: String,
    pub name: String,
    pub started: bool,
    #[serde(flatten)]
    pub session: Session,
}

impl Output for ConnectResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.session.interactive {
            format!("Disconnected from {}", self.session.remote_path)
        } else {
            format!(
                "{}\n  {}",
                self.session.remote_path,
                self.session.argv.join(" ")
            )
        }
    }
}

/// Pick any codespace, start it if needed, and open its workspace.
pub fn connect(
    ctx: &mut Context,
    selector: &dyn Selector,
    transport: &dyn Transport,
) -> Result<ConnectResult> {
    ctx.ensure_setup()?;
    let all = ctx.fetch()?;
    let codespace = selector::choose(selector, "Connect to codespace", &all)?;

    let target = ConnectTarget {
        profile: ctx.config.profile_name(),
        mount_root: ctx.config.mount_root(),
    };
    let connection = ctx
        .lifecycle()
        .connect(&codespace, transport, &ctx.registry, target)?;

    Ok(ConnectResult {
        label: codespace.readable_name().to_string(),
        name: codespace.name,
        started: connection.started,
        session: connection.session,
    })
}

// === Start ===

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StartResult {
    /// Start was launched; progress streams into `output`
    Background {
        label: String,
        name: String,
        pid: u32,
        output: PathBuf,
    },
    /// Start finished and the codespace answered
    Ready {
        label: String,
        name: String,
        output: PathBuf,
    },
}

impl Output for StartResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match self {
            StartResult::Background { label, output, .. } => format!(
                "Starting {} in the background. Output: {}",
                label,
                output.display()
            ),
            StartResult::Ready { label, .. } => format!("Codespace {} is ready.", label),
        }
    }
}

/// Pick a codespace that is not running and start it.
pub fn start(ctx: &mut Context, selector: &dyn Selector, wait: bool) -> Result<StartResult> {
    ctx.ensure_setup()?;
    let stopped = inventory::unavailable(&ctx.fetch()?);
    let codespace = selector::choose(selector, "Start codespace", &stopped)?;
    let label = codespace.readable_name().to_string();

    if wait {
        ctx.lifecycle().start_sync(&codespace)?;
        Ok(StartResult::Ready {
            label,
            name: codespace.name,
            output: ctx.surfaces.shared().path().to_path_buf(),
        })
    } else {
        let started = ctx.lifecycle().start_async(&codespace)?;
        Ok(StartResult::Background {
            label,
            name: codespace.name,
            pid: started.pid,
            output: started.output,
        })
    }
}

// === Stop ===

#[derive(Debug, Serialize)]
pub struct StopResult {
    pub label: String,
    pub name: String,
    pub stopped: bool,
}

impl Output for StopResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Stopped codespace {}", self.label)
    }
}

/// Pick a running codespace and stop it.
pub fn stop(ctx: &mut Context, selector: &dyn Selector) -> Result<StopResult> {
    ctx.ensure_setup()?;
    let running = inventory::available(&ctx.fetch()?);
    let codespace = selector::choose(selector, "Stop codespace", &running)?;
    ctx.lifecycle().stop(&codespace)?;

    Ok(StopResult {
        label: codespace.readable_name().to_string(),
        name: codespace.name,
        stopped: true,
    })
}

// === Config ===

#[derive(Serialize)]
pub struct ConfigShowResult {
    #[serde(flatten)]
    pub config: ResolvedConfig,
    pub data_dir: PathBuf,
}

impl Output for ConfigShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let c = &self.config;
        let file = c
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string());
        [
            format!("config file:   {}", file),
            format!("data dir:      {}", self.data_dir.display()),
            format!("gh-program:    {} ({})", c.gh_program.value, c.gh_program.source),
            format!("profile-name:  {} ({})", c.profile_name.value, c.profile_name.source),
            format!("mount-root:    {} ({})", c.mount_root.value, c.mount_root.source),
            format!(
                "output-format: {} ({})",
                c.output_format.value, c.output_format.source
            ),
        ]
        .join("\n")
    }
}

pub fn config_show(ctx: &Context) -> ConfigShowResult {
    ConfigShowResult {
        config: ctx.config.clone(),
        data_dir: ctx.data_dir.clone(),
    }
}
