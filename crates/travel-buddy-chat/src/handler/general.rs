//! Fallback handler for queries outside the travel specialties.

use travel_buddy_core::types::TaskType;

use crate::handler::TaskHandler;

const SYSTEM_PROMPT: &str = "You are a travel assistant specialized in destinations, \
attractions and packing. When a question falls outside those areas, answer politely and \
honestly about your limits, and suggest how the traveler could ask about destination \
recommendations, attractions and activities, or packing and preparation.";

pub struct GeneralHandler;

impl TaskHandler for GeneralHandler {
    fn task_type(&self) -> TaskType {
        TaskType::General
    }

    fn description(&self) -> &str {
        "General travel questions and everything else"
    }

    fn system_prompt(&self) -> &str {
        SYSTEM_PROMPT
    }

    fn focus(&self) -> &str {
        "Keep the answer brief and steer the traveler toward destinations, attractions or packing."
    }
}
