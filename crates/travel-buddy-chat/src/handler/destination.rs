//! Destination handler: where to go, when, and how to get there.

use travel_buddy_core::types::TaskType;

use crate::handler::TaskHandler;

const SYSTEM_PROMPT: &str = "You are a travel destination expert. Help with destination \
recommendations, the best times to visit, cultural insights and practical travel information. \
Be specific and helpful.";

pub struct DestinationHandler;

impl TaskHandler for DestinationHandler {
    fn task_type(&self) -> TaskType {
        TaskType::Destination
    }

    fn description(&self) -> &str {
        "Destination selection, information and recommendations"
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn focus(&self) -> &str {
        "Focus on destinations and logistics."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ConversationContext;

    #[test]
    fn test_prompt_has_destination_framing() {
        let prompt = DestinationHandler
            .build_prompt("Where should I go in May?", &ConversationContext::empty("s"));
        assert!(prompt.starts_with("System: You are a travel destination expert."));
        assert!(prompt.contains("Focus on destinations and logistics."));
        assert!(prompt.ends_with("User: Where should I go in May?\n\nAssistant:"));
    }
}
