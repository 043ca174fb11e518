//! Subcommand implementations and their terminal output.

use std::error::Error;
use std::fmt::Write as _;
use std::sync::Arc;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use serde::Serialize;
use tracing::{info, warn};

use travel_buddy_chat::{ChatError, ConversationManager, RouteOutcome, SessionSummary, SmartRouter};
use travel_buddy_core::config::BuddyConfig;
use travel_buddy_core::types::{Preference, Turn};
use travel_buddy_llm::{build_backend, GenerationParams};
use travel_buddy_storage::{InMemoryStore, JsonFileStore, StoreStats};

use crate::cli::{InteractiveArgs, MemoryCommand, QueryArgs};

pub type CommandResult = Result<(), Box<dyn Error>>;

// =============================================================================
// Wiring
// =============================================================================

fn open_conversations(config: &BuddyConfig) -> Result<ConversationManager, Box<dyn Error>> {
    let store = Arc::new(JsonFileStore::open(&config.memory.storage_path)?);
    Ok(ConversationManager::from_config(store, &config.memory))
}

/// Router for `query` and `interactive`. With memory disabled the store
/// file is never opened.
fn build_router(config: &BuddyConfig) -> Result<SmartRouter, Box<dyn Error>> {
    let conversations = if config.memory.enable_memory {
        open_conversations(config)?
    } else {
        info!("Memory disabled; store file not opened");
        ConversationManager::from_config(Arc::new(InMemoryStore::new()), &config.memory)
    };
    router_over(config, conversations)
}

fn router_over(
    config: &BuddyConfig,
    conversations: ConversationManager,
) -> Result<SmartRouter, Box<dyn Error>> {
    let backend = build_backend(&config.model)?;
    Ok(SmartRouter::new(conversations, backend)
        .with_params(GenerationParams::from(&config.generation))
        .with_memory_config(&config.memory))
}

fn print_json<T: Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// query / interactive
// =============================================================================

pub async fn run_query(config: &BuddyConfig, args: &QueryArgs) -> CommandResult {
    let router = build_router(config)?;
    let outcome = router.route(&args.session, &args.text()).await?;

    if args.json {
        return print_json(&outcome);
    }
    if args.verbose {
        eprintln!("{}", format_route_details(&outcome, &router));
    }
    println!("{}", outcome.response);
    Ok(())
}

fn format_route_details(outcome: &RouteOutcome, router: &SmartRouter) -> String {
    let trace: Vec<String> = outcome.trace.iter().map(|s| s.to_string()).collect();
    let mut out = format!(
        "[task: {} | trigger: {} | backend: {}/{}]",
        outcome.task_type,
        outcome.trigger.as_deref().unwrap_or("none"),
        router.backend().name(),
        router.backend().model_id(),
    );
    let _ = write!(out, "\n[stages: {}]", trace.join(" -> "));
    if !outcome.preferences_learned.is_empty() {
        let learned: Vec<String> = outcome
            .preferences_learned
            .iter()
            .map(|p| format!("{}={}", p.key, p.value))
            .collect();
        let _ = write!(out, "\n[learned: {}]", learned.join(", "));
    }
    out
}

const INTERACTIVE_HELP: &str = "Commands: /history, /prefs, /summary, /clear, /help, exit";

pub async fn run_interactive(config: &BuddyConfig, args: &InteractiveArgs) -> CommandResult {
    let router = build_router(config)?;
    let session = args.session.as_str();

    if let Err(e) = router.backend().health_check().await {
        warn!(error = %e, "Model backend is not reachable");
        eprintln!("Warning: {}", e);
    }

    let mut rl = DefaultEditor::new()?;
    println!("=== Travel Buddy (session: {}) ===", session);
    println!("Ask about destinations, attractions or packing. {}", INTERACTIVE_HELP);
    println!();

    loop {
        let line = match rl.readline("you> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("Type 'exit' to quit.");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        match input {
            "exit" | "quit" => break,
            "/help" => println!("{}", INTERACTIVE_HELP),
            "/history" => {
                let turns = router.conversations().history(session)?;
                println!("{}", format_history(&turns));
            }
            "/prefs" => {
                let ctx = router.conversations().context(session)?;
                println!("{}", format_preferences(&ctx.preferences));
            }
            "/clear" => {
                router.conversations().clear_session(session)?;
                println!("Session '{}' cleared.", session);
            }
            "/summary" => match router.summarize(session).await {
                Ok(Some(summary)) => println!("{}", summary),
                Ok(None) => println!("Nothing to summarize yet."),
                Err(e) if e.is_backend() => eprintln!("Error: {}", e),
                Err(e) => return Err(e.into()),
            },
            query => match router.route(session, query).await {
                Ok(outcome) => println!("buddy> {}\n", outcome.response),
                // The query is lost but the session is still usable.
                Err(ChatError::Backend(msg)) => eprintln!("Error: backend error: {}", msg),
                Err(e) => return Err(e.into()),
            },
        }
    }

    info!(session, "Interactive session ended");
    println!("Goodbye!");
    Ok(())
}

// =============================================================================
// memory
// =============================================================================

pub async fn run_memory(config: &BuddyConfig, action: &MemoryCommand) -> CommandResult {
    match action {
        MemoryCommand::Sessions { json } => {
            let conversations = open_conversations(config)?;
            let sessions = conversations.list_sessions()?;
            if *json {
                return print_json(&sessions);
            }
            println!("{}", format_session_list(&sessions));
        }
        MemoryCommand::Session { id, json } => {
            let conversations = open_conversations(config)?;
            let Some(summary) = conversations.session_summary(id)? else {
                return Err(format!("session not found: {}", id).into());
            };
            let turns = conversations.history(id)?;
            if *json {
                return print_json(&SessionDetail {
                    summary: &summary,
                    turns: &turns,
                });
            }
            println!("{}", format_session(&summary, &turns));
        }
        MemoryCommand::Stats { json } => {
            let stats = open_conversations(config)?.stats()?;
            if *json {
                return print_json(&stats);
            }
            println!("{}", format_stats(&stats));
        }
        MemoryCommand::Clear { id, all, json } => {
            let conversations = open_conversations(config)?;
            let removed = match (id, all) {
                (_, true) => conversations.clear_all()?,
                (Some(id), false) => usize::from(conversations.clear_session(id)?),
                (None, false) => 0,
            };
            if *json {
                return print_json(&serde_json::json!({ "removed": removed }));
            }
            println!("Removed {} session(s).", removed);
        }
        MemoryCommand::Summarize { id, json } => {
            let router = router_over(config, open_conversations(config)?)?;
            let summary = router.summarize(id).await?;
            if *json {
                return print_json(&serde_json::json!({ "session_id": id, "summary": summary }));
            }
            match summary {
                Some(text) => println!("{}", text),
                None => println!("Session '{}' has no turns to summarize.", id),
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct SessionDetail<'a> {
    #[serde(flatten)]
    summary: &'a SessionSummary,
    turns: &'a [Turn],
}

// =============================================================================
// Formatting
// =============================================================================

fn format_session_list(sessions: &[String]) -> String {
    if sessions.is_empty() {
        return "No stored sessions.".to_string();
    }
    let mut out = format!("{} session(s):", sessions.len());
    for id in sessions {
        let _ = write!(out, "\n  {}", id);
    }
    out
}

fn format_history(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "No conversation yet.".to_string();
    }
    turns
        .iter()
        .map(|t| {
            format!(
                "[{}] {}: {}",
                t.timestamp.format("%Y-%m-%d %H:%M"),
                t.role.label(),
                t.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_preferences(prefs: &[Preference]) -> String {
    if prefs.is_empty() {
        return "No preferences learned yet.".to_string();
    }
    prefs
        .iter()
        .map(|p| format!("  {}: {}", p.key, p.value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_session(summary: &SessionSummary, turns: &[Turn]) -> String {
    let mut out = format!(
        "Session: {}\nCreated: {}\nUpdated: {}\nTurns: {} ({} user, {} assistant)",
        summary.session_id,
        summary.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.turn_count,
        summary.user_turns,
        summary.assistant_turns,
    );
    if let Some(text) = &summary.summary {
        let _ = write!(out, "\nSummary: {}", text);
    }
    let _ = write!(
        out,
        "\n\nPreferences:\n{}\n\nHistory:\n{}",
        format_preferences(&summary.preferences),
        format_history(turns)
    );
    out
}

fn format_stats(stats: &StoreStats) -> String {
    let mut out = format!(
        "Sessions: {}\nTurns: {} ({} user, {} assistant)\nPreferences: {}",
        stats.total_sessions,
        stats.total_turns,
        stats.user_turns,
        stats.assistant_turns,
        stats.total_preferences,
    );
    for (key, count) in &stats.preference_keys {
        let _ = write!(out, "\n  {}: {}", key, count);
    }
    out
}
