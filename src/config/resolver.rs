//! Precedence resolution for berth configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment (`BERTH_GH` for the provider program)
//! 3. config.kdl (`$BERTH_CONFIG_DIR/config.kdl` or `~/.config/berth/config.kdl`)
//! 4. Built-in defaults

use std::path::PathBuf;

use serde::Serialize;

use crate::config::{BerthConfig, OutputFormat, load_config_file, system_config_path};
use crate::provider::DEFAULT_PROGRAM;
use crate::transport::{DEFAULT_MOUNT_ROOT, DEFAULT_PROFILE_NAME};
use crate::Result;

/// Environment variable overriding the provider program.
pub const GH_PROGRAM_ENV: &str = "BERTH_GH";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    ConfigFile,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, Serialize)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// config.kdl that was consulted, if it exists
    pub config_file: Option<PathBuf>,
    pub gh_program: Resolved<String>,
    pub profile_name: Resolved<String>,
    pub mount_root: Resolved<String>,
    pub output_format: Resolved<OutputFormat>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            gh_program: Resolved::new(DEFAULT_PROGRAM.to_string(), ValueSource::Default),
            profile_name: Resolved::new(DEFAULT_PROFILE_NAME.to_string(), ValueSource::Default),
            mount_root: Resolved::new(DEFAULT_MOUNT_ROOT.to_string(), ValueSource::Default),
            output_format: Resolved::new(OutputFormat::Json, ValueSource::Default),
        }
    }
}

impl ResolvedConfig {
    pub fn gh_program(&self) -> &str {
        &self.gh_program.value
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name.value
    }

    pub fn mount_root(&self) -> &str {
        &self.mount_root.value
    }

    pub fn output_format(&self) -> &OutputFormat {
        &self.output_format.value
    }

    pub fn human(&self) -> bool {
        self.output_format.value == OutputFormat::Human
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Provider program from `--gh`
    pub gh_program: Option<String>,
    /// Output format from `-H`
    pub output_format: Option<OutputFormat>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gh_program(mut self, program: impl Into<String>) -> Self {
        self.gh_program = Some(program.into());
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// Resolve configuration from the system config.kdl, the environment, and `overrides`.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let path = system_config_path();
    let file_config = match &path {
        Some(p) => load_config_file(p)?,
        None => BerthConfig::new(),
    };
    let env_program = std::env::var(GH_PROGRAM_ENV).ok().filter(|s| !s.is_empty());

    let mut resolved = resolve_with(&file_config, env_program, overrides);
    resolved.config_file = path.filter(|p| p.exists());
    Ok(resolved)
}

/// Pure precedence merge over already-loaded inputs.
pub fn resolve_with(
    file_config: &BerthConfig,
    env_program: Option<String>,
    overrides: &ConfigOverrides,
) -> ResolvedConfig {
    let mut result = ResolvedConfig::default();

    // Resolve gh_program
    if let Some(ref program) = overrides.gh_program {
        result.gh_program = Resolved::new(program.clone(), ValueSource::CliFlag);
    } else if let Some(program) = env_program {
        result.gh_program =
            Resolved::new(program, ValueSource::EnvVar(GH_PROGRAM_ENV.to_string()));
    } else if let Some(ref program) = file_config.gh_program {
        result.gh_program = Resolved::new(program.clone(), ValueSource::ConfigFile);
    }

    if let Some(ref name) = file_config.profile_name {
        result.profile_name = Resolved::new(name.clone(), ValueSource::ConfigFile);
    }

    if let Some(ref root) = file_config.mount_root {
        result.mount_root = Resolved::new(root.clone(), ValueSource::ConfigFile);
    }

    // Resolve output_format
    if let Some(ref format) = overrides.output_format {
        result.output_format = Resolved::new(format.clone(), ValueSource::CliFlag);
    } else if let Some(ref format) = file_config.output_format {
        result.output_format = Resolved::new(format.clone(), ValueSource::ConfigFile);
    }

    result
}
