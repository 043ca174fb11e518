//! Task handler trait and registry.
//!
//! Each [`TaskType`] has one handler that turns a query plus conversation
//! context into a prompt, and post-processes the model output. Handlers
//! never read or write the session store; the router passes context in
//! and records the result.

pub mod attractions;
pub mod destination;
pub mod general;
pub mod packing;
pub mod summary;

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use travel_buddy_core::types::TaskType;
use travel_buddy_llm::{GenerationParams, ModelBackend};

use crate::context::ConversationContext;
use crate::error::ChatError;

pub use attractions::AttractionsHandler;
pub use destination::DestinationHandler;
pub use general::GeneralHandler;
pub use packing::PackingHandler;
pub use summary::SummaryHandler;

#[async_trait]
pub trait TaskHandler: Send + Sync {
    fn task_type(&self) -> TaskType;

    /// One-line description shown by `describe()`.
    fn description(&self) -> &str;

    /// Role instructions placed at the top of every prompt.
    fn system_prompt(&self) -> &str;

    /// Task-specific framing line placed under the system prompt.
    fn focus(&self) -> &str;

    fn build_prompt(&self, query: &str, ctx: &ConversationContext) -> String {
        render_prompt(self.system_prompt(), self.focus(), query, ctx)
    }

    fn postprocess(&self, raw: &str) -> String {
        raw.trim().to_string()
    }

    /// Build the prompt, generate, and post-process. The router's generate
    /// stage runs every query through this.
    async fn handle(
        &self,
        query: &str,
        ctx: &ConversationContext,
        backend: &dyn ModelBackend,
        params: &GenerationParams,
    ) -> Result<String, ChatError> {
        let prompt = self.build_prompt(query, ctx);
        debug!(
            task_type = %self.task_type(),
            prompt_len = prompt.len(),
            "Prompt built"
        );
        let raw = backend.generate(&prompt, params).await?;
        Ok(self.postprocess(&raw))
    }
}

/// Render the chat-style prompt shared by all task handlers.
///
/// Sections without content are left out.
pub fn render_prompt(
    system_prompt: &str,
    focus: &str,
    query: &str,
    ctx: &ConversationContext,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "System: {}", system_prompt.trim());
    let _ = writeln!(out, "{}", focus);

    if !ctx.preferences.is_empty() || ctx.summary.is_some() {
        out.push('\n');
    }
    if !ctx.preferences.is_empty() {
        out.push_str("Known traveler preferences:\n");
        for pref in &ctx.preferences {
            let _ = writeln!(out, "- {}: {}", pref.key, pref.value);
        }
    }
    if let Some(summary) = &ctx.summary {
        let _ = writeln!(out, "Previous conversation summary: {}", summary.trim());
    }

    if !ctx.turns.is_empty() {
        out.push_str("\nConversation so far:\n");
        for turn in &ctx.turns {
            let _ = writeln!(out, "{}: {}", turn.role.label(), turn.text);
        }
    }

    let _ = write!(out, "\nUser: {}\n\nAssistant:", query.trim());
    out
}

/// Summary row for listing handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerInfo {
    pub task_type: TaskType,
    pub description: String,
}

/// Maps task types to handlers.
///
/// The general handler is always present and answers for any task type
/// without a registered handler.
pub struct HandlerRegistry {
    handlers: BTreeMap<TaskType, Arc<dyn TaskHandler>>,
    fallback: Arc<dyn TaskHandler>,
    fallback_overridden: bool,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    /// Registry holding only the general fallback.
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
            fallback: Arc::new(GeneralHandler),
            fallback_overridden: false,
        }
    }

    /// Registry with all four built-in handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let builtins: [Arc<dyn TaskHandler>; 3] = [
            Arc::new(DestinationHandler),
            Arc::new(AttractionsHandler),
            Arc::new(PackingHandler),
        ];
        for handler in builtins {
            // Fresh registry, so no duplicates are possible.
            registry
                .handlers
                .insert(handler.task_type(), handler);
        }
        registry
    }

    /// Register a handler for its task type.
    ///
    /// Fails if one is already registered. The built-in general handler may
    /// be replaced once.
    pub fn register(&mut self, handler: Arc<dyn TaskHandler>) -> Result<(), ChatError> {
        let task_type = handler.task_type();
        if task_type == TaskType::General {
            if self.fallback_overridden {
                return Err(ChatError::DuplicateHandler(task_type));
            }
            self.fallback = handler;
            self.fallback_overridden = true;
        } else {
            if self.handlers.contains_key(&task_type) {
                return Err(ChatError::DuplicateHandler(task_type));
            }
            self.handlers.insert(task_type, handler);
        }
        info!(task_type = %task_type, "Handler registered");
        Ok(())
    }

    /// Remove the handler for `task_type`; returns whether one was removed.
    pub fn unregister(&mut self, task_type: TaskType) -> Result<bool, ChatError> {
        if task_type == TaskType::General {
            return Err(ChatError::ProtectedHandler(task_type));
        }
        Ok(self.handlers.remove(&task_type).is_some())
    }

    /// The handler for `task_type`, or the general fallback.
    pub fn get(&self, task_type: TaskType) -> Arc<dyn TaskHandler> {
        self.handlers
            .get(&task_type)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn is_registered(&self, task_type: TaskType) -> bool {
        task_type == TaskType::General || self.handlers.contains_key(&task_type)
    }

    /// Registered task types in routing order, general last.
    pub fn list(&self) -> Vec<TaskType> {
        let mut types: Vec<TaskType> = self.handlers.keys().copied().collect();
        types.push(TaskType::General);
        types
    }

    pub fn describe(&self) -> Vec<HandlerInfo> {
        self.list()
            .into_iter()
            .map(|task_type| HandlerInfo {
                task_type,
                description: self.get(task_type).description().to_string(),
            })
            .collect()
    }
}
