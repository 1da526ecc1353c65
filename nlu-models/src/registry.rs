//! # Registros
//!
//! O [`Registry`] guarda, por chave textual, as fábricas de modelos, as tabelas de
//! extratores de features (por tipo de exemplo) e as fábricas de label encoders.
//!
//! O registro é um valor comum, criado e preenchido pelo chamador na inicialização
//! e depois passado para quem constrói modelos. Cada chave só pode ser registrada
//! uma vez: registrar de novo é erro e a entrada original permanece.
//!
//! ```rust
//! use nlu_models::config::ModelConfig;
//! use nlu_models::registry::Registry;
//!
//! let registry = Registry::with_defaults();
//! let config = ModelConfig::new("text", "query", "class").with_feature("bag-of-words");
//! let model = registry.create_model(&config).unwrap();
//! assert_eq!(model.config().model_type, "text");
//! ```

use std::collections::HashMap;

use tracing::debug;

use crate::config::ModelConfig;
use crate::error::{NluError, Result};
use crate::features::{query_features, FeatureExtractor};
use crate::labels::{
    ClassLabelEncoder, EntityLabelEncoder, LabelEncoder, LabelEncoderFactory, CLASS_LABEL_TYPE,
    ENTITIES_LABEL_TYPE,
};
use crate::models::{Model, ModelFactory, TaggerModel, TextModel};

pub const QUERY_EXAMPLE_TYPE: &str = "query";
pub const ENTITY_EXAMPLE_TYPE: &str = "entity";

/// Registro de modelos, features e label encoders.
#[derive(Default)]
pub struct Registry {
    models: HashMap<String, ModelFactory>,
    features: HashMap<String, HashMap<String, FeatureExtractor>>,
    labels: HashMap<String, LabelEncoderFactory>,
}

impl Registry {
    /// Registro vazio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registro com os modelos, extratores e encoders embutidos.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register_defaults()
            .expect("registro vazio não tem chaves repetidas");
        registry
    }

    /// Adiciona os modelos, extratores e encoders embutidos.
    ///
    /// Falha na primeira chave que já estiver registrada; as entradas anteriores
    /// a ela permanecem.
    pub fn register_defaults(&mut self) -> Result<()> {
        self.register_model(TextModel::MODEL_TYPE, TextModel::create)?;
        self.register_model(TaggerModel::MODEL_TYPE, TaggerModel::create)?;
        self.register_features(QUERY_EXAMPLE_TYPE, query_features())?;
        self.register_label(CLASS_LABEL_TYPE, ClassLabelEncoder::create)?;
        self.register_label(ENTITIES_LABEL_TYPE, EntityLabelEncoder::create)
    }

    /// Constrói o modelo indicado por `config.model_type`.
    pub fn create_model(&self, config: &ModelConfig) -> Result<Box<dyn Model>> {
        let factory = self
            .models
            .get(&config.model_type)
            .ok_or_else(|| NluError::UnknownModelType(config.model_type.clone()))?;
        factory(config, self)
    }

    /// Busca um extrator pelo tipo de exemplo e pelo nome.
    pub fn get_feature_extractor(&self, example_type: &str, name: &str) -> Result<&FeatureExtractor> {
        self.features
            .get(example_type)
            .ok_or_else(|| NluError::KeyNotFound(example_type.to_string()))?
            .get(name)
            .ok_or_else(|| NluError::KeyNotFound(name.to_string()))
    }

    /// Constrói o label encoder indicado por `config.label_type`.
    pub fn get_label_encoder(&self, config: &ModelConfig) -> Result<Box<dyn LabelEncoder>> {
        let factory = self
            .labels
            .get(&config.label_type)
            .ok_or_else(|| NluError::KeyNotFound(config.label_type.clone()))?;
        Ok(factory(config))
    }

    pub fn register_model(&mut self, model_type: impl Into<String>, factory: ModelFactory) -> Result<()> {
        let model_type = model_type.into();
        if self.models.contains_key(&model_type) {
            return Err(NluError::ModelAlreadyRegistered(model_type));
        }
        debug!(model_type = %model_type, "model registered");
        self.models.insert(model_type, factory);
        Ok(())
    }

    /// Registra a tabela de extratores (nome → extrator) de um tipo de exemplo.
    pub fn register_features(
        &mut self,
        example_type: impl Into<String>,
        features: HashMap<String, FeatureExtractor>,
    ) -> Result<()> {
        let example_type = example_type.into();
        if self.features.contains_key(&example_type) {
            return Err(NluError::FeaturesAlreadyRegistered(example_type));
        }
        debug!(example_type = %example_type, count = features.len(), "features registered");
        self.features.insert(example_type, features);
        Ok(())
    }

    pub fn register_label(
        &mut self,
        label_type: impl Into<String>,
        factory: LabelEncoderFactory,
    ) -> Result<()> {
        let label_type = label_type.into();
        if self.labels.contains_key(&label_type) {
            return Err(NluError::LabelAlreadyRegistered(label_type));
        }
        debug!(label_type = %label_type, "label encoder registered");
        self.labels.insert(label_type, factory);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::GAZETTEER_RSC;

    #[test]
    fn test_register_model_twice() {
        let mut registry = Registry::new();
        registry.register_model("text", TextModel::create).unwrap();

        let err = registry.register_model("text", TaggerModel::create).unwrap_err();
        assert!(matches!(err, NluError::ModelAlreadyRegistered(ref t) if t == "text"));
        assert_eq!(err.to_string(), "Model \"text\" is already registered.");

        // A primeira entrada continua valendo
        registry.register_features("query", query_features()).unwrap();
        registry.register_label("class", ClassLabelEncoder::create).unwrap();
        let config = ModelConfig::new("text", "query", "class").with_feature("length");
        assert!(registry.create_model(&config).is_ok());
    }

    #[test]
    fn test_register_features_and_labels_twice() {
        let mut registry = Registry::with_defaults();
        assert!(matches!(
            registry.register_features("query", HashMap::new()),
            Err(NluError::FeaturesAlreadyRegistered(_))
        ));
        assert!(matches!(
            registry.register_label("entities", EntityLabelEncoder::create),
            Err(NluError::LabelAlreadyRegistered(_))
        ));
        // Nada foi sobrescrito
        assert!(registry.get_feature_extractor("query", "gaz-freq").is_ok());
    }

    #[test]
    fn test_register_defaults_keeps_custom_model() {
        let mut registry = Registry::new();
        registry.register_model("text", TaggerModel::create).unwrap();

        let err = registry.register_defaults().unwrap_err();
        assert!(matches!(err, NluError::ModelAlreadyRegistered(ref t) if t == "text"));

        // "text" continua apontando para a fábrica registrada antes
        registry.register_features(QUERY_EXAMPLE_TYPE, query_features()).unwrap();
        registry.register_label(CLASS_LABEL_TYPE, ClassLabelEncoder::create).unwrap();
        let config = ModelConfig::new("text", "query", "class").with_feature("length");
        assert!(matches!(
            registry.create_model(&config),
            Err(NluError::FeatureKindMismatch { expected: "sequence", .. })
        ));
    }

    #[test]
    fn test_register_defaults_twice() {
        let mut registry = Registry::with_defaults();
        assert!(matches!(
            registry.register_defaults(),
            Err(NluError::ModelAlreadyRegistered(_))
        ));
        assert!(registry.get_feature_extractor(QUERY_EXAMPLE_TYPE, "exact").is_ok());
    }

    #[test]
    fn test_unknown_model_type() {
        let registry = Registry::with_defaults();
        let config = ModelConfig::new("svm", "query", "class");
        let err = registry.create_model(&config).err().unwrap();
        assert_eq!(
            err.to_string(),
            "Invalid model configuration: Unknown model type \"svm\""
        );
    }

    #[test]
    fn test_get_feature_extractor() {
        let registry = Registry::with_defaults();
        let extractor = registry.get_feature_extractor("query", "in-gaz-span-seq").unwrap();
        assert!(extractor.requirements().contains(GAZETTEER_RSC));

        assert!(matches!(
            registry.get_feature_extractor(ENTITY_EXAMPLE_TYPE, "bag-of-words"),
            Err(NluError::KeyNotFound(k)) if k == ENTITY_EXAMPLE_TYPE
        ));
        assert!(matches!(
            registry.get_feature_extractor("query", "nope"),
            Err(NluError::KeyNotFound(k)) if k == "nope"
        ));
    }

    #[test]
    fn test_get_label_encoder() {
        let registry = Registry::with_defaults();
        assert!(registry
            .get_label_encoder(&ModelConfig::new("text", "query", "class"))
            .is_ok());
        assert!(matches!(
            registry.get_label_encoder(&ModelConfig::new("text", "query", "intents")),
            Err(NluError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_feature_propagates_from_create_model() {
        let registry = Registry::with_defaults();
        let config = ModelConfig::new("text", "query", "class").with_feature("embeddings");
        assert!(matches!(
            registry.create_model(&config),
            Err(NluError::KeyNotFound(_))
        ));
    }
}
