//! CLI argument definitions for the Travel Buddy binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use travel_buddy_core::config::{BackendKind, BuddyConfig};

/// Session used when `--session` is not given.
pub const DEFAULT_SESSION: &str = "default";

/// Travel Buddy - a travel assistant for destinations, attractions and packing.
#[derive(Parser, Debug)]
#[command(name = "travel-buddy", version, about)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Model backend (ollama, huggingface, mock).
    #[arg(short = 'b', long = "backend", global = true)]
    pub backend: Option<BackendKind>,

    /// Model identifier passed to the backend.
    #[arg(short = 'm', long = "model", global = true)]
    pub model: Option<String>,

    /// Path of the JSON memory store.
    #[arg(long = "memory-path", global = true)]
    pub memory_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask a single question and print the answer.
    Query(QueryArgs),
    /// Start an interactive conversation.
    Interactive(InteractiveArgs),
    /// Inspect or manage stored conversations.
    Memory {
        #[command(subcommand)]
        action: MemoryCommand,
    },
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Conversation session identifier.
    #[arg(short = 's', long = "session", default_value = DEFAULT_SESSION)]
    pub session: String,

    /// Show the routing decision alongside the answer.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Print the full routing outcome as JSON.
    #[arg(long = "json")]
    pub json: bool,

    /// The question to ask.
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,
}

impl QueryArgs {
    pub fn text(&self) -> String {
        self.query.join(" ")
    }
}

#[derive(Args, Debug)]
pub struct InteractiveArgs {
    /// Conversation session identifier.
    #[arg(short = 's', long = "session", default_value = DEFAULT_SESSION)]
    pub session: String,
}

#[derive(Subcommand, Debug)]
pub enum MemoryCommand {
    /// List stored sessions.
    Sessions {
        #[arg(long)]
        json: bool,
    },
    /// Show one session's history and preferences.
    Session {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Show aggregate store statistics.
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Remove one session, or all sessions with --all.
    Clear {
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        id: Option<String>,
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// Summarize a session with the model and store the summary.
    Summarize {
        id: String,
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > TRAVEL_BUDDY_CONFIG env var > ~/.travel-buddy/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("TRAVEL_BUDDY_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Overlay command-line flags onto `config`.
    pub fn apply_overrides(&self, config: &mut BuddyConfig) {
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(backend) = self.backend {
            config.model.backend = backend;
        }
        if let Some(ref model) = self.model {
            config.model.model_id = model.clone();
        }
        if let Some(ref path) = self.memory_path {
            config.memory.storage_path = path.to_string_lossy().to_string();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".travel-buddy").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".travel-buddy").join("config.toml");
    }
    PathBuf::from("config.toml")
}
