//! # Modelos
//!
//! Todo modelo registrado implementa [`Model`]. O registro constrói o modelo a partir
//! de um [`ModelConfig`]; o modelo resolve seus extratores de features e seu label
//! encoder pelo mesmo registro.
//!
//! | `model_type` | Struct          | Features     | Rótulos          |
//! |--------------|-----------------|--------------|------------------|
//! | `text`       | [`TextModel`]   | Query        | `class`          |
//! | `tagger`     | [`TaggerModel`] | Sequence     | `entities`       |

mod classifier;
mod tagger;

use std::borrow::Cow;
use std::collections::BTreeSet;

pub use classifier::TextModel;
pub use tagger::TaggerModel;

use crate::config::ModelConfig;
use crate::error::{NluError, Result};
use crate::features::{Extractor, QueryExtractorFn, SequenceExtractorFn};
use crate::labels::{Label, LabelEncoder};
use crate::query::Query;
use crate::registry::Registry;
use crate::resources::{ingest_dynamic_gazetteer, DynamicResources, Resources};

/// Interface comum dos modelos.
pub trait Model: Send + Sync {
    fn config(&self) -> &ModelConfig;

    /// União dos recursos exigidos pelos extratores do modelo.
    fn requirements(&self) -> &BTreeSet<String>;

    fn label_encoder(&self) -> &dyn LabelEncoder;

    /// Treina o modelo.
    ///
    /// `resources` traz o que vem de fora (gazetteers); as tabelas de frequência
    /// exigidas pelos extratores são calculadas aqui a partir de `examples`.
    fn fit(&mut self, examples: &[Query], labels: &[Label], resources: Resources) -> Result<()>;

    /// Prediz o rótulo de uma query, opcionalmente com gazetteers dinâmicos.
    fn predict(&self, example: &Query, dynamic_resource: Option<&DynamicResources>) -> Result<Label>;
}

/// Fábrica registrada para um `model_type`.
pub type ModelFactory = fn(&ModelConfig, &Registry) -> Result<Box<dyn Model>>;

/// Extratores parametrizados de um modelo e seus requisitos.
struct FeatureSet {
    extractors: Vec<(String, Extractor)>,
    requirements: BTreeSet<String>,
}

impl FeatureSet {
    fn build(config: &ModelConfig, registry: &Registry) -> Result<Self> {
        let mut extractors = Vec::with_capacity(config.features.len());
        let mut requirements = BTreeSet::new();

        for (name, params) in &config.features {
            let feature = registry.get_feature_extractor(&config.example_type, name)?;
            requirements.extend(feature.requirements().iter().cloned());
            extractors.push((name.clone(), feature.build(params)?));
        }

        Ok(Self {
            extractors,
            requirements,
        })
    }

    fn into_query(self) -> Result<(Vec<QueryExtractorFn>, BTreeSet<String>)> {
        let extractors = self
            .extractors
            .into_iter()
            .map(|(name, extractor)| match extractor {
                Extractor::Query(f) => Ok(f),
                other => Err(NluError::FeatureKindMismatch {
                    name,
                    expected: "query",
                    found: other.kind(),
                }),
            })
            .collect::<Result<_>>()?;
        Ok((extractors, self.requirements))
    }

    fn into_sequence(self) -> Result<(Vec<SequenceExtractorFn>, BTreeSet<String>)> {
        let extractors = self
            .extractors
            .into_iter()
            .map(|(name, extractor)| match extractor {
                Extractor::Sequence(f) => Ok(f),
                other => Err(NluError::FeatureKindMismatch {
                    name,
                    expected: "sequence",
                    found: other.kind(),
                }),
            })
            .collect::<Result<_>>()?;
        Ok((extractors, self.requirements))
    }
}

/// Recursos usados na predição: os do treino, ou uma cópia com os gazetteers dinâmicos.
fn active_resources<'a>(
    resources: &'a Resources,
    dynamic_resource: Option<&DynamicResources>,
) -> Cow<'a, Resources> {
    match dynamic_resource {
        Some(dynamic) => Cow::Owned(ingest_dynamic_gazetteer(resources, Some(dynamic))),
        None => Cow::Borrowed(resources),
    }
}

fn check_lengths(examples: usize, labels: usize) -> Result<()> {
    if examples != labels {
        return Err(NluError::LengthMismatch { examples, labels });
    }
    Ok(())
}
