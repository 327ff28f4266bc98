//! Codespace records decoded from `gh codespace list --json` output.

use serde::{Deserialize, Serialize};

/// The only provider state berth interprets. Everything else is "not available".
pub const AVAILABLE_STATE: &str = "Available";

/// Snapshot of one codespace as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Codespace {
    /// Stable machine identifier, passed to every `gh codespace` subcommand
    pub name: String,
    /// Human label, possibly empty
    pub display_name: String,
    /// Provider lifecycle state (e.g. "Available", "Shutdown", "Starting")
    pub state: String,
    /// Owning repository, e.g. "octo/repo"
    pub repository: String,
    /// Branch from `gitStatus.ref`, empty when the provider omits it
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Raw `lastUsedAt` timestamp, shown in listings only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<String>,
}

impl Codespace {
    /// Label used for presentation and as the inventory key.
    ///
    /// Falls back to `name` when `display_name` is empty.
    pub fn readable_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    pub fn is_available(&self) -> bool {
        self.state == AVAILABLE_STATE
    }

    /// Supplementary text shown next to the label in the picker.
    ///
    /// # Example
    /// ```
    /// use berth::codespace::Codespace;
    /// let cs = Codespace {
    ///     name: "cs1".into(),
    ///     display_name: String::new(),
    ///     state: "Available".into(),
    ///     repository: "octo/repo".into(),
    ///     git_ref: "main".into(),
    ///     last_used_at: None,
    /// };
    /// assert_eq!(cs.annotation(), " | Available | octo/repo | main");
    /// ```
    pub fn annotation(&self) -> String {
        format!(" | {} | {} | {}", self.state, self.repository, self.git_ref)
    }
}

/// Wire shape of one element of the list output. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCodespace {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    repository: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    git_status: Option<RawGitStatus>,
    #[serde(default)]
    last_used_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGitStatus {
    #[serde(default, rename = "ref")]
    git_ref: Option<String>,
}

impl From<RawCodespace> for Codespace {
    fn from(raw: RawCodespace) -> Self {
        Self {
            name: raw.name,
            display_name: raw.display_name.unwrap_or_default(),
            state: raw.state.unwrap_or_default(),
            repository: raw.repository.unwrap_or_default(),
            git_ref: raw.git_status.and_then(|g| g.git_ref).unwrap_or_default(),
            last_used_at: raw.last_used_at.filter(|s| !s.is_empty()),
        }
    }
}

/// Decode a JSON array of codespace objects, preserving provider order.
pub fn parse_list(json: &str) -> serde_json::Result<Vec<Codespace>> {
    let raw: Vec<RawCodespace> = serde_json::from_str(json)?;
    Ok(raw.into_iter().map(Codespace::from).collect())
}
