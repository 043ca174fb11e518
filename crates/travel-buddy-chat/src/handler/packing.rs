//! Packing handler: lists, clothing and documents.

use travel_buddy_core::types::TaskType;

use crate::handler::TaskHandler;

const SYSTEM_PROMPT: &str = "You are a travel packing expert. Help with packing lists and \
essentials, what to bring for different kinds of trips, weather-appropriate clothing and travel \
documents. Be practical and specific.";

pub struct PackingHandler;

impl TaskHandler for PackingHandler {
    fn task_type(&self) -> TaskType {
        TaskType::Packing
    }

    fn description(&self) -> &str {
        "Packing lists, clothing and travel essentials"
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn focus(&self) -> &str {
        "Focus on packing lists and travel essentials."
    }
}
