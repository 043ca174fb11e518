//! Smart router: the query pipeline.
//!
//! A query moves through `Classify -> Dispatch -> Generate -> Record -> Done`.
//! Each step carries the data the next one needs, and [`SmartRouter::step`]
//! is the only transition function. A backend or store error ends the run
//! where it happened; nothing is retried.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use travel_buddy_core::config::MemoryConfig;
use travel_buddy_core::types::{Preference, TaskType};
use travel_buddy_llm::{GenerationParams, ModelBackend};

use crate::classifier::{Classification, TaskClassifier};
use crate::context::{ConversationContext, ConversationManager};
use crate::error::ChatError;
use crate::handler::{HandlerRegistry, SummaryHandler, TaskHandler};

/// Pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterStage {
    Classify,
    Dispatch,
    Generate,
    Record,
    Done,
}

impl fmt::Display for RouterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouterStage::Classify => "classify",
            RouterStage::Dispatch => "dispatch",
            RouterStage::Generate => "generate",
            RouterStage::Record => "record",
            RouterStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of routing one query.
#[derive(Debug, Clone, Serialize)]
pub struct RouteOutcome {
    pub session_id: String,
    pub task_type: TaskType,
    /// Text that triggered the classification rule, if any.
    pub trigger: Option<String>,
    pub response: String,
    /// Preferences extracted from the query and stored.
    pub preferences_learned: Vec<Preference>,
    /// Stages visited, ending with `Done`.
    pub trace: Vec<RouterStage>,
}

enum Step {
    Classify,
    Dispatch(Classification),
    Generate {
        classification: Classification,
        handler: Arc<dyn TaskHandler>,
        context: ConversationContext,
    },
    Record {
        classification: Classification,
        response: String,
    },
    Done {
        classification: Classification,
        response: String,
        preferences_learned: Vec<Preference>,
    },
}

impl Step {
    fn stage(&self) -> RouterStage {
        match self {
            Step::Classify => RouterStage::Classify,
            Step::Dispatch(_) => RouterStage::Dispatch,
            Step::Generate { .. } => RouterStage::Generate,
            Step::Record { .. } => RouterStage::Record,
            Step::Done { .. } => RouterStage::Done,
        }
    }
}

pub struct SmartRouter {
    classifier: TaskClassifier,
    registry: HandlerRegistry,
    conversations: ConversationManager,
    backend: Arc<dyn ModelBackend>,
    params: GenerationParams,
    memory_enabled: bool,
    conversation_mode: bool,
}

impl SmartRouter {
    /// Router with the default classifier and handlers, memory and
    /// conversation mode on.
    pub fn new(conversations: ConversationManager, backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            classifier: TaskClassifier::new(),
            registry: HandlerRegistry::with_defaults(),
            conversations,
            backend,
            params: GenerationParams::default(),
            memory_enabled: true,
            conversation_mode: true,
        }
    }

    pub fn with_classifier(mut self, classifier: TaskClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// When off, routing neither reads nor writes the store.
    pub fn with_memory(mut self, enabled: bool) -> Self {
        self.memory_enabled = enabled;
        self
    }

    /// When off, prompts carry preferences and summary but no prior turns.
    pub fn with_conversation_mode(mut self, enabled: bool) -> Self {
        self.conversation_mode = enabled;
        self
    }

    /// Apply the memory toggles from configuration.
    pub fn with_memory_config(self, config: &MemoryConfig) -> Self {
        self.with_memory(config.enable_memory)
            .with_conversation_mode(config.conversation_mode)
    }

    pub fn conversations(&self) -> &ConversationManager {
        &self.conversations
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn classifier(&self) -> &TaskClassifier {
        &self.classifier
    }

    pub fn backend(&self) -> &Arc<dyn ModelBackend> {
        &self.backend
    }

    pub fn memory_enabled(&self) -> bool {
        self.memory_enabled
    }

    /// Route one query through the full pipeline.
    pub async fn route(&self, session_id: &str, query: &str) -> Result<RouteOutcome, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyQuery);
        }

        let mut trace = Vec::with_capacity(5);
        let mut step = Step::Classify;
        loop {
            trace.push(step.stage());
            if let Step::Done {
                classification,
                response,
                preferences_learned,
            } = step
            {
                info!(
                    session_id,
                    task_type = %classification.task_type,
                    response_len = response.len(),
                    "Query routed"
                );
                return Ok(RouteOutcome {
                    session_id: session_id.to_string(),
                    task_type: classification.task_type,
                    trigger: classification.trigger,
                    response,
                    preferences_learned,
                    trace,
                });
            }
            let from = step.stage();
            step = self.step(step, session_id, query).await.inspect_err(|e| {
                warn!(session_id, stage = %from, error = %e, "Routing failed");
            })?;
            debug!(session_id, from = %from, to = %step.stage(), "Router transition");
        }
    }

    async fn step(&self, step: Step, session_id: &str, query: &str) -> Result<Step, ChatError> {
        match step {
            Step::Classify => Ok(Step::Dispatch(self.classifier.classify_detailed(query))),

            Step::Dispatch(classification) => {
                let handler = self.registry.get(classification.task_type);
                let context = self.load_context(session_id)?;
                Ok(Step::Generate {
                    classification,
                    handler,
                    context,
                })
            }

            Step::Generate {
                classification,
                handler,
                context,
            } => {
                let response = handler
                    .handle(query, &context, self.backend.as_ref(), &self.params)
                    .await?;
                Ok(Step::Record {
                    classification,
                    response,
                })
            }

            Step::Record {
                classification,
                response,
            } => {
                let preferences_learned = if self.memory_enabled {
                    self.conversations
                        .record_exchange(session_id, query, &response)?
                } else {
                    Vec::new()
                };
                Ok(Step::Done {
                    classification,
                    response,
                    preferences_learned,
                })
            }

            done @ Step::Done { .. } => Ok(done),
        }
    }

    fn load_context(&self, session_id: &str) -> Result<ConversationContext, ChatError> {
        if !self.memory_enabled {
            return Ok(ConversationContext::empty(session_id));
        }
        let mut context = self.conversations.context(session_id)?;
        if !self.conversation_mode {
            context.turns.clear();
        }
        Ok(context)
    }

    /// Summarize the latest turns of a session and store the summary.
    ///
    /// Returns `None` when the session has no turns.
    pub async fn summarize(&self, session_id: &str) -> Result<Option<String>, ChatError> {
        let turns = self.conversations.history(session_id)?;
        if turns.is_empty() {
            return Ok(None);
        }
        let summary = SummaryHandler
            .summarize(&turns, self.backend.as_ref(), &self.params)
            .await?;
        self.conversations.update_summary(session_id, &summary)?;
        info!(session_id, summary_len = summary.len(), "Session summarized");
        Ok(Some(summary))
    }
}
