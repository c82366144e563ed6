//! Model catalog: the models a user can switch between with `/model`.

use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// Configuration for one selectable model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Identifier sent to the model API (e.g. `gemini-2.0-flash`).
    pub name: String,
    /// Human-readable name shown in panels.
    pub display_name: String,
    /// One-line description.
    pub description: String,
    /// Whether this model is selected at startup.
    #[serde(default)]
    pub is_default: bool,
}

impl ModelConfig {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: description.into(),
            is_default: false,
        }
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// The model identifier as a [`Model`] value.
    pub fn model(&self) -> Model {
        Model::from(self.name.as_str())
    }
}

/// Ordered list of selectable models plus the current selection.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelConfig>,
    current: usize,
}

impl ModelCatalog {
    /// Build a catalog. The current model is the first one flagged
    /// `is_default`, or the first entry. An empty list yields the builtin
    /// catalog.
    pub fn new(models: Vec<ModelConfig>) -> Self {
        if models.is_empty() {
            return Self::builtin();
        }
        let current = models.iter().position(|m| m.is_default).unwrap_or(0);
        Self { models, current }
    }

    /// The catalog shipped with Murlix.
    pub fn builtin() -> Self {
        Self::new(vec![
            ModelConfig::new(
                Model::Gemini20Flash.as_str(),
                "Gemini Flash",
                "Fast responses, good for code completion",
            )
            .as_default(),
            ModelConfig::new(
                Model::Gemini20Pro.as_str(),
                "Gemini Pro",
                "More capable, better for complex tasks",
            ),
        ])
    }

    pub fn available_models(&self) -> &[ModelConfig] {
        &self.models
    }

    pub fn current_model(&self) -> &ModelConfig {
        &self.models[self.current]
    }

    /// Select a model by its exact `name`. Unknown names leave the current
    /// selection untouched.
    pub fn set_model(&mut self, name: &str) -> Option<&ModelConfig> {
        let idx = self.models.iter().position(|m| m.name == name)?;
        self.current = idx;
        Some(&self.models[idx])
    }

    /// Select `name`, appending it as an ad-hoc entry when the catalog does
    /// not know it (used for `--model` on the command line).
    pub fn select_or_insert(&mut self, name: &str) -> &ModelConfig {
        if self.set_model(name).is_none() {
            self.models
                .push(ModelConfig::new(name, name, "Selected on the command line"));
            self.current = self.models.len() - 1;
        }
        self.current_model()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults_to_flash() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(catalog.available_models().len(), 2);
        assert_eq!(catalog.current_model().name, "gemini-2.0-flash");
        assert_eq!(catalog.current_model().display_name, "Gemini Flash");
        assert!(catalog.current_model().is_default);
    }

    #[test]
    fn test_set_model_switches_on_known_name() {
        let mut catalog = ModelCatalog::builtin();
        let selected = catalog.set_model("gemini-2.0-pro").unwrap();
        assert_eq!(selected.display_name, "Gemini Pro");
        assert_eq!(catalog.current_model().name, "gemini-2.0-pro");
    }

    #[test]
    fn test_set_model_unknown_keeps_selection() {
        let mut catalog = ModelCatalog::builtin();
        assert!(catalog.set_model("gpt-4").is_none());
        assert_eq!(catalog.current_model().name, "gemini-2.0-flash");
    }

    #[test]
    fn test_set_model_requires_exact_name() {
        let mut catalog = ModelCatalog::builtin();
        assert!(catalog.set_model("Gemini Pro").is_none());
        assert!(catalog.set_model("GEMINI-2.0-PRO").is_none());
    }

    #[test]
    fn test_new_without_default_picks_first() {
        let catalog = ModelCatalog::new(vec![
            ModelConfig::new("a", "A", "first"),
            ModelConfig::new("b", "B", "second"),
        ]);
        assert_eq!(catalog.current_model().name, "a");
    }

    #[test]
    fn test_new_respects_default_flag() {
        let catalog = ModelCatalog::new(vec![
            ModelConfig::new("a", "A", "first"),
            ModelConfig::new("b", "B", "second").as_default(),
        ]);
        assert_eq!(catalog.current_model().name, "b");
    }

    #[test]
    fn test_empty_list_falls_back_to_builtin() {
        let catalog = ModelCatalog::new(Vec::new());
        assert_eq!(catalog.current_model().name, "gemini-2.0-flash");
    }

    #[test]
    fn test_select_or_insert_adds_unknown_model() {
        let mut catalog = ModelCatalog::builtin();
        let selected = catalog.select_or_insert("gemini-2.5-pro").name.clone();
        assert_eq!(selected, "gemini-2.5-pro");
        assert_eq!(catalog.available_models().len(), 3);
        assert_eq!(catalog.current_model().model(), Model::Gemini25Pro);

        catalog.select_or_insert("gemini-2.0-flash");
        assert_eq!(catalog.available_models().len(), 3);
        assert_eq!(catalog.current_model().name, "gemini-2.0-flash");
    }
}
