//! Model catalog from TOML (`[[models]]` array)

use murlix_domain::{ModelCatalog, ModelConfig};
use serde::{Deserialize, Serialize};

/// One selectable model
///
/// # Example
///
/// ```toml
/// [[models]]
/// name = "gemini-2.0-flash"
/// display_name = "Gemini Flash"
/// description = "Fast responses"
/// default = true
///
/// [[models]]
/// name = "gemini-2.5-pro"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileModelConfig {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: bool,
}

impl FileModelConfig {
    pub fn to_model_config(&self) -> ModelConfig {
        let display = self.display_name.clone().unwrap_or_else(|| self.name.clone());
        let config = ModelConfig::new(
            self.name.trim(),
            display,
            self.description.clone().unwrap_or_default(),
        );
        if self.default { config.as_default() } else { config }
    }
}

/// Catalog from the configured entries; the builtin catalog when none are
/// configured. Entries with an empty name are skipped.
pub fn model_catalog(models: &[FileModelConfig]) -> ModelCatalog {
    ModelCatalog::new(
        models
            .iter()
            .filter(|m| !m.name.trim().is_empty())
            .map(FileModelConfig::to_model_config)
            .collect(),
    )
}
