//! Attractions handler: sights, activities and itineraries.

use travel_buddy_core::types::TaskType;

use crate::handler::TaskHandler;

const SYSTEM_PROMPT: &str = "You are a travel attractions expert. Help with attraction \
recommendations, activity suggestions, sightseeing itineraries and practical details such as \
opening hours and prices. Be specific and helpful.";

pub struct AttractionsHandler;

impl TaskHandler for AttractionsHandler {
    fn task_type(&self) -> TaskType {
        TaskType::Attractions
    }

    fn description(&self) -> &str {
        "Attractions, activities and sightseeing recommendations"
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn focus(&self) -> &str {
        "Focus on attractions, activities and sightseeing."
    }
}
