//! Conversational core for Travel Buddy.
//!
//! Provides query classification, task handlers, conversation memory and
//! the router that ties them to a model backend.

pub mod classifier;
pub mod context;
pub mod error;
pub mod handler;
pub mod preferences;
pub mod router;

pub use classifier::{Classification, ClassificationRule, TaskClassifier};
pub use context::{ConversationContext, ConversationManager, SessionSummary};
pub use error::ChatError;
pub use handler::{
    AttractionsHandler, DestinationHandler, GeneralHandler, HandlerInfo, HandlerRegistry,
    PackingHandler, SummaryHandler, TaskHandler,
};
pub use preferences::{extract_preferences, ExtractedPreference};
pub use router::{RouteOutcome, RouterStage, SmartRouter};
