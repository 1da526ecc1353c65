//! # Configuração de Modelos
//!
//! Um [`ModelConfig`] diz ao registro qual modelo construir (`model_type`), que tipo
//! de exemplo ele consome (`example_type`), como os rótulos são codificados
//! (`label_type`) e quais extratores de features usar, com seus parâmetros.
//!
//! ```rust
//! use nlu_models::config::ModelConfig;
//!
//! let config = ModelConfig::from_json(r#"{
//!     "model_type": "text",
//!     "example_type": "query",
//!     "label_type": "class",
//!     "features": {"bag-of-words": {"lengths": [1, 2]}, "length": {}},
//!     "params": {"iterations": 10}
//! }"#).unwrap();
//!
//! assert_eq!(config.params.iterations, 10);
//! assert_eq!(config.features.len(), 2);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Parâmetros livres de um extrator de features.
pub type FeatureParams = serde_json::Map<String, serde_json::Value>;

fn default_iterations() -> usize {
    5
}

/// Hiperparâmetros de treino.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Número de passadas sobre os dados de treino.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
        }
    }
}

/// Configuração de um modelo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_type: String,
    pub example_type: String,
    pub label_type: String,
    /// Nome do extrator → parâmetros.
    #[serde(default)]
    pub features: BTreeMap<String, FeatureParams>,
    #[serde(default)]
    pub params: ModelParams,
}

impl ModelConfig {
    pub fn new(
        model_type: impl Into<String>,
        example_type: impl Into<String>,
        label_type: impl Into<String>,
    ) -> Self {
        Self {
            model_type: model_type.into(),
            example_type: example_type.into(),
            label_type: label_type.into(),
            features: BTreeMap::new(),
            params: ModelParams::default(),
        }
    }

    /// Adiciona um extrator com parâmetros padrão.
    pub fn with_feature(self, name: impl Into<String>) -> Self {
        self.with_feature_params(name, FeatureParams::new())
    }

    pub fn with_feature_params(mut self, name: impl Into<String>, params: FeatureParams) -> Self {
        self.features.insert(name.into(), params);
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.params.iterations = iterations;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = ModelConfig::from_json(
            r#"{"model_type": "tagger", "example_type": "query", "label_type": "entities"}"#,
        )
        .unwrap();

        assert!(config.features.is_empty());
        assert_eq!(config.params, ModelParams::default());
        assert_eq!(config.params.iterations, 5);
    }

    #[test]
    fn test_missing_model_type_is_error() {
        assert!(ModelConfig::from_json(r#"{"example_type": "query", "label_type": "class"}"#).is_err());
    }

    #[test]
    fn test_builder() {
        let config = ModelConfig::new("text", "query", "class")
            .with_feature("length")
            .with_iterations(3);
        assert!(config.features.contains_key("length"));
        assert_eq!(config.params.iterations, 3);
    }
}
