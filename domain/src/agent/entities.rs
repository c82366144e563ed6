//! Agent definition entity

use serde::{Deserialize, Serialize};

/// Instruction given to the assistant when none is configured.
pub const DEFAULT_INSTRUCTION: &str = "\
You are Murlix, a helpful AI assistant. You can help users with:

- General questions and information
- Writing and editing text
- Problem solving and analysis
- Code explanation and debugging
- Creative tasks and brainstorming

Be friendly, helpful, and conversational in your responses.
";

/// The assistant: the author name on model events and the instruction sent
/// as the system prompt on every call. The model is chosen per turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    pub instruction: String,
}

impl AgentDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instruction: DEFAULT_INSTRUCTION.to_string(),
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }
}

impl Default for AgentDefinition {
    fn default() -> Self {
        Self::new("murlix_assistant")
    }
}
