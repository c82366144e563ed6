//! Agent configuration from TOML (`[agent]` section)

use murlix_application::config::DEFAULT_MAX_LLM_CALLS;
use murlix_domain::AgentDefinition;
use serde::{Deserialize, Serialize};

/// Raw agent configuration from TOML
///
/// # Example
///
/// ```toml
/// [agent]
/// name = "file_system_agent"
/// model = "gemini-2.0-pro"
/// instruction = "Help user accessing their file systems."
/// max_llm_calls = 20
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    /// Agent name, used as the author of model events
    pub name: String,
    /// Default model (overrides the `[[models]]` default flag)
    pub model: Option<String>,
    /// System instruction
    pub instruction: Option<String>,
    /// Maximum model calls per user turn
    pub max_llm_calls: usize,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            name: AgentDefinition::default().name,
            model: None,
            instruction: None,
            max_llm_calls: DEFAULT_MAX_LLM_CALLS,
        }
    }
}

impl FileAgentConfig {
    pub fn to_definition(&self) -> AgentDefinition {
        let mut agent = AgentDefinition::new(self.name.clone());
        if let Some(instruction) = self.instruction.as_deref().filter(|s| !s.trim().is_empty()) {
            agent = agent.with_instruction(instruction);
        }
        agent
    }
}
