//! Berth - discover, start, stop, and connect to GitHub codespaces.
//!
//! This library provides the core functionality for the `berth` CLI tool:
//! listing codespaces through the `gh` CLI, splitting them by availability,
//! choosing one interactively, driving its lifecycle, and handing it off to a
//! named remote-access transport profile.

pub mod action_log;
pub mod cli;
pub mod codespace;
pub mod commands;
pub mod config;
pub mod inventory;
pub mod lifecycle;
pub mod output;
pub mod provider;
pub mod selector;
pub mod transport;


/// Library-level error type for Berth operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// The host environment is missing something setup needs.
    #[error("{0}")]
    Environment(String),

    /// Listing codespaces failed; no partial inventory exists.
    #[error("Failed to list codespaces: {0}")]
    Fetch(String),

    /// The user cancelled selection or nothing matched.
    #[error("No codespace selected")]
    SelectionAborted,

    /// A provider command exited unsuccessfully.
    #[error("{command} failed: {stderr}")]
    SubprocessFailure { command: String, stderr: String },

    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias for Berth operations.
pub type Result<T> = std::result::Result<T, Error>;
