//! Runner parameters: per-turn loop control.

use serde::{Deserialize, Serialize};

/// Default cap on model calls within one user turn.
pub const DEFAULT_MAX_LLM_CALLS: usize = 10;

/// Turn loop control parameters used by [`Runner`](crate::use_cases::runner::Runner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Maximum number of model calls for a single user message. Each tool
    /// round-trip costs one call.
    pub max_llm_calls: usize,
    /// Length of the session summary derived from the first message.
    pub summary_chars: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_llm_calls: DEFAULT_MAX_LLM_CALLS,
            summary_chars: 80,
        }
    }
}

impl RunnerConfig {
    pub fn with_max_llm_calls(mut self, max: usize) -> Self {
        self.max_llm_calls = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = RunnerConfig::default();
        assert_eq!(config.max_llm_calls, 10);
        assert_eq!(config.summary_chars, 80);
    }

    #[test]
    fn test_builder() {
        assert_eq!(RunnerConfig::default().with_max_llm_calls(3).max_llm_calls, 3);
    }
}
