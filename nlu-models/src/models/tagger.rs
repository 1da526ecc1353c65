use std::collections::BTreeSet;

use tracing::info;

use super::{active_resources, check_lengths, FeatureSet, Model};
use crate::config::ModelConfig;
use crate::error::{NluError, Result};
use crate::features::{FeatureVector, SequenceExtractorFn};
use crate::labels::{Label, LabelEncoder, OUTSIDE_TAG};
use crate::perceptron::AveragedPerceptron;
use crate::query::Query;
use crate::registry::Registry;
use crate::resources::{DynamicResources, Resources};
use crate::text::OUT_OF_BOUNDS_TOKEN;

/// Tagger de entidades (`model_type = "tagger"`).
///
/// Classifica os tokens da esquerda para a direita com um [`AveragedPerceptron`].
/// Além das features dos extratores, cada token recebe a tag do token anterior
/// (a correta no treino, a predita na inferência), como num MEMM guloso.
pub struct TaggerModel {
    config: ModelConfig,
    encoder: Box<dyn LabelEncoder>,
    extractors: Vec<SequenceExtractorFn>,
    requirements: BTreeSet<String>,
    resources: Resources,
    perceptron: Option<AveragedPerceptron>,
}

impl TaggerModel {
    pub const MODEL_TYPE: &'static str = "tagger";

    pub fn new(config: &ModelConfig, registry: &Registry) -> Result<Self> {
        let (extractors, requirements) = FeatureSet::build(config, registry)?.into_sequence()?;
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

    /// Um vetor por token, juntando a saída de todos os extratores.
    fn extract(&self, query: &Query, resources: &Resources) -> Vec<FeatureVector> {
        let mut vectors = vec![FeatureVector::new(); query.len()];
        for extractor in &self.extractors {
            for (fv, token_fv) in vectors.iter_mut().zip(extractor(query, resources)) {
                fv.merge(token_fv);
            }
        }
        vectors
    }
}

fn with_prev_tag(fv: &FeatureVector, prev: &str) -> FeatureVector {
    let mut fv = fv.clone();
    fv.insert(format!("prev_tag|{prev}"), 1.0);
    fv
}

impl Model for TaggerModel {
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
        let sequences: Vec<Vec<FeatureVector>> = examples
            .iter()
            .map(|query| self.extract(query, &self.resources))
            .collect();

        let mut classes = vec![OUTSIDE_TAG.to_string()];
        classes.extend(encoded.iter().flatten().cloned());
        let mut perceptron = AveragedPerceptron::new(classes);

        for _ in 0..self.config.params.iterations {
            for (vectors, tags) in sequences.iter().zip(&encoded) {
                let mut prev = OUT_OF_BOUNDS_TOKEN;
                for (fv, tag) in vectors.iter().zip(tags) {
                    perceptron.train_step(&with_prev_tag(fv, prev), tag);
                    prev = tag.as_str();
                }
            }
        }
        perceptron.finalize();

        info!(
            model_type = Self::MODEL_TYPE,
            examples = examples.len(),
            tags = perceptron.classes().len(),
            "model fit"
        );
        self.perceptron = Some(perceptron);
        Ok(())
    }

    fn predict(&self, example: &Query, dynamic_resource: Option<&DynamicResources>) -> Result<Label> {
        let not_fitted = || NluError::NotFitted(Self::MODEL_TYPE.to_string());
        let perceptron = self.perceptron.as_ref().ok_or_else(not_fitted)?;

        let resources = active_resources(&self.resources, dynamic_resource);
        let mut tags: Vec<String> = Vec::with_capacity(example.len());
        for fv in self.extract(example, &resources) {
            let prev = tags.last().map_or(OUT_OF_BOUNDS_TOKEN, String::as_str);
            let tag = perceptron.predict(&with_prev_tag(&fv, prev)).unwrap_or(OUTSIDE_TAG);
            tags.push(tag.to_string());
        }

        let mut decoded = self.encoder.decode(&[tags], std::slice::from_ref(example))?;
        decoded.pop().ok_or_else(not_fitted)
    }
}
