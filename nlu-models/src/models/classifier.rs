use std::collections::BTreeSet;

use tracing::info;

use super::{active_resources, check_lengths, FeatureSet, Model};
use crate::config::ModelConfig;
use crate::error::{NluError, Result};
use crate::features::{FeatureVector, QueryExtractorFn};
use crate::labels::{Label, LabelEncoder, CLASS_LABEL_TYPE, ENTITIES_LABEL_TYPE};
use crate::perceptron::AveragedPerceptron;
use crate::query::Query;
use crate::registry::Registry;
use crate::resources::{DynamicResources, Resources};

/// Classificador de queries (`model_type = "text"`).
///
/// Junta as features de todos os extratores num único vetor por query e treina um
/// [`AveragedPerceptron`] sobre as classes vistas no treino.
pub struct TextModel {
    config: ModelConfig,
    encoder: Box<dyn LabelEncoder>,
    extractors: Vec<QueryExtractorFn>,
    requirements: BTreeSet<String>,
    resources: Resources,
    perceptron: Option<AveragedPerceptron>,
}

impl TextModel {
    pub const MODEL_TYPE: &'static str = "text";

    pub fn new(config: &ModelConfig, registry: &Registry) -> Result<Self> {
        let (extractors, requirements) = FeatureSet::build(config, registry)?.into_query()?;
        Ok(Self {
            config: config.clone(),
            encoder: registry.get_label_encoder(config)?,
            extractors,
            requirements,
            resources: Resources::default(),
            perceptron: None,
        })
    }

    /// Fábrica para o registro.
    pub fn create(config: &ModelConfig, registry: &Registry) -> Result<Box<dyn Model>> {
        Ok(Box::new(Self::new(config, registry)?))
    }

    fn extract(&self, query: &Query, resources: &Resources) -> FeatureVector {
        let mut fv = FeatureVector::new();
        for extractor in &self.extractors {
            fv.merge(extractor(query, resources));
        }
        fv
    }
}

fn single_class(encoded: &[String]) -> Result<&str> {
    match encoded {
        [class] => Ok(class.as_str()),
        _ => Err(NluError::LabelMismatch {
            expected: CLASS_LABEL_TYPE,
            found: ENTITIES_LABEL_TYPE,
        }),
    }
}

impl Model for TextModel {
    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn requirements(&self) -> &BTreeSet<String> {
        &self.requirements
    }

    fn label_encoder(&self) -> &dyn LabelEncoder {
        self.encoder.as_ref()
    }

    fn fit(&mut self, examples: &[Query], labels: &[Label], mut resources: Resources) -> Result<()> {
        check_lengths(examples.len(), labels.len())?;
        let requirements: Vec<&String> = self.requirements.iter().collect();
        resources.initialize(&requirements, examples)?;
        self.resources = resources;

        let encoded = self.encoder.encode(labels, examples)?;
        let gold = encoded
            .iter()
            .map(|enc| single_class(enc))
            .collect::<Result<Vec<_>>>()?;
        let vectors: Vec<FeatureVector> = examples
            .iter()
            .map(|query| self.extract(query, &self.resources))
            .collect();

        let classes = gold.iter().map(|class| class.to_string()).collect();
        let mut perceptron = AveragedPerceptron::new(classes);
        for _ in 0..self.config.params.iterations {
            for (fv, class) in vectors.iter().zip(&gold) {
                perceptron.train_step(fv, class);
            }
        }
        perceptron.finalize();

        info!(
            model_type = Self::MODEL_TYPE,
            examples = examples.len(),
            classes = perceptron.classes().len(),
            "model fit"
        );
        self.perceptron = Some(perceptron);
        Ok(())
    }

    fn predict(&self, example: &Query, dynamic_resource: Option<&DynamicResources>) -> Result<Label> {
        let not_fitted = || NluError::NotFitted(Self::MODEL_TYPE.to_string());
        let perceptron = self.perceptron.as_ref().ok_or_else(not_fitted)?;

        let resources = active_resources(&self.resources, dynamic_resource);
        let fv = self.extract(example, &resources);
        let class = perceptron.predict(&fv).ok_or_else(not_fitted)?;

        let mut decoded = self
            .encoder
            .decode(&[vec![class.to_string()]], std::slice::from_ref(example))?;
        decoded.pop().ok_or_else(not_fitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::Gazetteer;

    fn config() -> ModelConfig {
        ModelConfig::new("text", "query", "class")
            .with_feature("bag-of-words")
            .with_feature("gaz-freq")
    }

    fn training_data() -> (Vec<Query>, Vec<Label>) {
        let data = [
            ("vai chover hoje", "weather"),
            ("previsão do tempo amanhã", "weather"),
            ("toque samba", "music"),
            ("toque uma música do caetano", "music"),
        ];
        let queries = data.iter().map(|(text, _)| Query::new(*text)).collect();
        let labels = data.iter().map(|(_, c)| Label::Class(c.to_string())).collect();
        (queries, labels)
    }

    #[test]
    fn test_fit_and_predict() {
        let registry = Registry::with_defaults();
        let mut model = TextModel::new(&config(), &registry).unwrap();
        let (queries, labels) = training_data();

        model.fit(&queries, &labels, Resources::default()).unwrap();

        assert_eq!(
            model.predict(&Query::new("vai chover"), None).unwrap(),
            Label::Class("weather".to_string())
        );
        assert_eq!(
            model.predict(&Query::new("toque samba"), None).unwrap(),
            Label::Class("music".to_string())
        );
    }

    #[test]
    fn test_requirements_union() {
        let registry = Registry::with_defaults();
        let model = TextModel::new(&config(), &registry).unwrap();
        let reqs: Vec<&str> = model.requirements().iter().map(String::as_str).collect();
        assert_eq!(reqs, ["gazetteers", "w_freq"]);
    }

    #[test]
    fn test_predict_before_fit() {
        let registry = Registry::with_defaults();
        let model = TextModel::new(&config(), &registry).unwrap();
        assert!(matches!(
            model.predict(&Query::new("oi"), None),
            Err(NluError::NotFitted(_))
        ));
    }

    #[test]
    fn test_sequence_feature_rejected() {
        let registry = Registry::with_defaults();
        let config = ModelConfig::new("text", "query", "class").with_feature("bag-of-words-seq");
        let err = TextModel::new(&config, &registry).err().unwrap();
        assert!(matches!(
            err,
            NluError::FeatureKindMismatch { expected: "query", found: "sequence", .. }
        ));
        assert_eq!(
            err.to_string(),
            "feature \"bag-of-words-seq\" is a sequence extractor, expected query"
        );
    }

    #[test]
    fn test_dynamic_gazetteer_changes_features() {
        let registry = Registry::with_defaults();
        let config = ModelConfig::new("text", "query", "class").with_feature("gaz-freq");
        let mut model = TextModel::new(&config, &registry).unwrap();

        let mut gaz = Gazetteer::new("artist");
        gaz.update_entity("caetano", 1.0, true);
        let mut resources = Resources::default();
        resources.gazetteers.insert("artist".to_string(), gaz.to_data());

        let queries = vec![Query::new("toque caetano"), Query::new("vai chover")];
        let labels = vec![
            Label::Class("play".to_string()),
            Label::Class("forecast".to_string()),
        ];
        model.fit(&queries, &labels, resources).unwrap();

        // "gal" só é conhecida pelo gazetteer dinâmico
        let query = Query::new("toque gal");
        assert_eq!(
            model.predict(&query, None).unwrap(),
            Label::Class("forecast".to_string())
        );

        let mut entries = std::collections::BTreeMap::new();
        entries.insert("gal".to_string(), 1.0);
        let dynamic = DynamicResources {
            gazetteers: Some([("artist".to_string(), entries)].into_iter().collect()),
        };
        assert_eq!(
            model.predict(&query, Some(&dynamic)).unwrap(),
            Label::Class("play".to_string())
        );
    }

    #[test]
    fn test_length_mismatch() {
        let registry = Registry::with_defaults();
        let mut model = TextModel::new(&config(), &registry).unwrap();
        let err = model
            .fit(&[Query::new("oi")], &[], Resources::default())
            .unwrap_err();
        assert!(matches!(err, NluError::LengthMismatch { .. }));
    }
}
