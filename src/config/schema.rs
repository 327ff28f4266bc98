//! KDL schema for config.kdl.
//!
//! ```kdl
//! // berth preferences
//! gh-program "/usr/local/bin/gh"
//! profile-name "ghcs"
//! mount-root "/workspaces"
//! output-format "human"  // or "json"
//! ```

use kdl::KdlDocument;
use serde::{Deserialize, Serialize};

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User preferences stored in config.kdl. Every value is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BerthConfig {
    /// Provider CLI program name or path
    pub gh_program: Option<String>,

    /// Name the transport profile is registered under
    pub profile_name: Option<String>,

    /// Remote directory `connect` opens
    pub mount_root: Option<String>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,
}

impl BerthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref name) = self.profile_name {
            if name.is_empty() || name.contains(':') {
                return Err(format!(
                    "profile-name must be non-empty and must not contain ':', got {:?}",
                    name
                ));
            }
        }
        if let Some(ref root) = self.mount_root {
            if !root.starts_with('/') {
                return Err(format!("mount-root must be an absolute path, got {:?}", root));
            }
        }
        if let Some(ref program) = self.gh_program {
            if program.trim().is_empty() {
                return Err("gh-program must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document. Unknown nodes are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        Self {
            gh_program: string_node(doc, "gh-program"),
            profile_name: string_node(doc, "profile-name"),
            mount_root: string_node(doc, "mount-root"),
            output_format: string_node(doc, "output-format").and_then(|s| OutputFormat::parse(&s)),
        }
    }
}

/// First string argument of the node called `name`.
fn string_node(doc: &KdlDocument, name: &str) -> Option<String> {
    doc.get(name)
        .and_then(|node| node.entries().first())
        .and_then(|entry| entry.value().as_string())
        .map(|s| s.to_string())
}
