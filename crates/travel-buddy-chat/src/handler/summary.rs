//! Conversation summarizer.
//!
//! Not a routable task: the router calls it directly to condense the most
//! recent turns of a session into a recap stored on the session.

use std::fmt::Write as _;

use travel_buddy_core::types::Turn;
use travel_buddy_llm::{GenerationParams, ModelBackend};

use crate::error::ChatError;

/// How many trailing turns a summary covers.
pub const SUMMARY_TURNS: usize = 6;

const SYSTEM_PROMPT: &str = "You are a conversation summarizer for a travel assistant. Write a \
concise summary that captures the traveler's preferences and requirements, the destinations \
discussed, trip details such as dates, budget and type of trip, and anything useful for future \
conversations.";

#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryHandler;

impl SummaryHandler {
    pub fn build_prompt(&self, turns: &[Turn]) -> String {
        let start = turns.len().saturating_sub(SUMMARY_TURNS);
        let mut out = format!("System: {}\n\nConversation:\n", SYSTEM_PROMPT);
        for turn in &turns[start..] {
            let _ = writeln!(out, "{}: {}", turn.role.label(), turn.text);
        }
        out.push_str("\nSummary:");
        out
    }

    pub async fn summarize(
        &self,
        turns: &[Turn],
        backend: &dyn ModelBackend,
        params: &GenerationParams,
    ) -> Result<String, ChatError> {
        let raw = backend.generate(&self.build_prompt(turns), params).await?;
        Ok(raw.trim().to_string())
    }
}
