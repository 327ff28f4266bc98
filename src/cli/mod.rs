//! CLI argument definitions for Berth.

use clap::{Parser, Subcommand};

/// Version string with the commit and build time baked in by build.rs.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BERTH_GIT_COMMIT"),
    ", built ",
    env!("BERTH_BUILD_TIMESTAMP"),
    ")"
);

/// Berth - find, start, stop, and connect to GitHub codespaces.
///
/// Run `berth setup` once to check the GitHub CLI is installed, then
/// `berth connect` to pick a codespace and open its workspace.
#[derive(Parser, Debug)]
#[command(name = "berth")]
#[command(author, version, long_version = LONG_VERSION, about = "Find, start, stop, and connect to GitHub codespaces", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// GitHub CLI program to run (overrides BERTH_GH and config.kdl)
    #[arg(long = "gh", global = true, value_name = "PROGRAM")]
    pub gh_program: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the GitHub CLI is installed and register the transport profile
    Setup,

    /// Pick a codespace, start it if needed, and open its workspace
    Connect {
        /// Label to select instead of prompting (display name, or name if none)
        #[arg(short, long)]
        name: Option<String>,

        /// Open an interactive shell in the workspace on this terminal
        #[arg(long)]
        shell: bool,
    },

    /// Pick a stopped codespace and start it
    Start {
        /// Label to select instead of prompting
        #[arg(short, long)]
        name: Option<String>,

        /// Block until the codespace is reachable instead of starting in the background
        #[arg(short, long)]
        wait: bool,
    },

    /// Pick a running codespace and stop it
    Stop {
        /// Label to select instead of prompting
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List codespaces with their state, repository, and branch
    List {
        /// Only codespaces that are running
        #[arg(long, conflicts_with = "unavailable")]
        available: bool,

        /// Only codespaces that are not running
        #[arg(long)]
        unavailable: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration and where each value came from
    Show,
}

impl Commands {
    /// Command name and arguments as JSON, for the action log.
    pub fn describe(&self) -> (String, serde_json::Value) {
        match self {
            Commands::Setup => ("setup".to_string(), serde_json::json!({})),
            Commands::Connect { name, shell } => (
                "connect".to_string(),
                serde_json::json!({ "name": name, "shell": shell }),
            ),
            Commands::Start { name, wait } => (
                "start".to_string(),
                serde_json::json!({ "name": name, "wait": wait }),
            ),
            Commands::Stop { name } => ("stop".to_string(), serde_json::json!({ "name": name })),
            Commands::List {
                available,
                unavailable,
            } => (
                "list".to_string(),
                serde_json::json!({ "available": available, "unavailable": unavailable }),
            ),
            Commands::Config { command } => match command {
                ConfigCommands::Show => ("config show".to_string(), serde_json::json!({})),
            },
        }
    }
}
