//! # Rótulos e Label Encoders
//!
//! Os modelos trabalham com rótulos codificados como sequências de strings
//! ([`EncodedLabel`]); o [`LabelEncoder`] registrado para o `label_type` da
//! configuração faz a ponte com os rótulos de domínio ([`Label`]).
//!
//! - `class` ([`ClassLabelEncoder`]): a classe da query, `Class("weather")` ↔ `["weather"]`.
//! - `entities` ([`EntityLabelEncoder`]): entidades da query ↔ uma tag BIO por token.
//!
//! ## Esquema BIO
//!
//! - `B-TIPO`: primeiro token de uma entidade
//! - `I-TIPO`: tokens seguintes da mesma entidade
//! - `O`: fora de entidade

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::entity::{QueryEntity, Span};
use crate::error::{NluError, Result};
use crate::query::Query;

pub const CLASS_LABEL_TYPE: &str = "class";
pub const ENTITIES_LABEL_TYPE: &str = "entities";

/// Tag "fora de entidade".
pub const OUTSIDE_TAG: &str = "O";

/// Rótulo de um exemplo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Classe da query inteira.
    Class(String),
    /// Entidades anotadas na query.
    Entities(Vec<QueryEntity>),
}

impl Label {
    pub fn kind(&self) -> &'static str {
        match self {
            Label::Class(_) => CLASS_LABEL_TYPE,
            Label::Entities(_) => ENTITIES_LABEL_TYPE,
        }
    }
}

/// Forma codificada de um rótulo.
pub type EncodedLabel = Vec<String>;

/// Converte rótulos de domínio em sequências de strings e vice-versa.
pub trait LabelEncoder: Send + Sync {
    fn encode(&self, labels: &[Label], examples: &[Query]) -> Result<Vec<EncodedLabel>>;
    fn decode(&self, encoded: &[EncodedLabel], examples: &[Query]) -> Result<Vec<Label>>;
}

/// Fábrica registrada para um `label_type`.
pub type LabelEncoderFactory = fn(&ModelConfig) -> Box<dyn LabelEncoder>;

fn check_lengths(examples: usize, labels: usize) -> Result<()> {
    if examples != labels {
        return Err(NluError::LengthMismatch { examples, labels });
    }
    Ok(())
}

/// Encoder identidade para rótulos de classe.
#[derive(Debug, Clone, Default)]
pub struct ClassLabelEncoder;

impl ClassLabelEncoder {
    pub fn create(_config: &ModelConfig) -> Box<dyn LabelEncoder> {
        Box::new(ClassLabelEncoder)
    }
}

impl LabelEncoder for ClassLabelEncoder {
    fn encode(&self, labels: &[Label], examples: &[Query]) -> Result<Vec<EncodedLabel>> {
        check_lengths(examples.len(), labels.len())?;
        labels
            .iter()
            .map(|label| match label {
                Label::Class(class) => Ok(vec![class.clone()]),
                other => Err(NluError::LabelMismatch {
                    expected: CLASS_LABEL_TYPE,
                    found: other.kind(),
                }),
            })
            .collect()
    }

    fn decode(&self, encoded: &[EncodedLabel], examples: &[Query]) -> Result<Vec<Label>> {
        check_lengths(examples.len(), encoded.len())?;
        encoded
            .iter()
            .map(|enc| match enc.as_slice() {
                [class] => Ok(Label::Class(class.clone())),
                _ => Err(NluError::LabelMismatch {
                    expected: CLASS_LABEL_TYPE,
                    found: ENTITIES_LABEL_TYPE,
                }),
            })
            .collect()
    }
}

/// Encoder BIO para entidades.
#[derive(Debug, Clone, Default)]
pub struct EntityLabelEncoder;

impl EntityLabelEncoder {
    pub fn create(_config: &ModelConfig) -> Box<dyn LabelEncoder> {
        Box::new(EntityLabelEncoder)
    }
}

impl LabelEncoder for EntityLabelEncoder {
    fn encode(&self, labels: &[Label], examples: &[Query]) -> Result<Vec<EncodedLabel>> {
        check_lengths(examples.len(), labels.len())?;
        labels
            .iter()
            .zip(examples)
            .map(|(label, query)| match label {
                Label::Entities(entities) => entities_to_tags(entities, query.len()),
                other => Err(NluError::LabelMismatch {
                    expected: ENTITIES_LABEL_TYPE,
                    found: other.kind(),
                }),
            })
            .collect()
    }

    fn decode(&self, encoded: &[EncodedLabel], examples: &[Query]) -> Result<Vec<Label>> {
        check_lengths(examples.len(), encoded.len())?;
        encoded
            .iter()
            .zip(examples)
            .map(|(tags, query)| {
                bio_to_spans(tags)
                    .into_iter()
                    .map(|(span, entity_type)| QueryEntity::from_token_span(query, entity_type, span))
                    .collect::<Result<Vec<_>>>()
                    .map(Label::Entities)
            })
            .collect()
    }
}

/// Gera uma tag BIO por token a partir das entidades.
pub fn entities_to_tags(entities: &[QueryEntity], n_tokens: usize) -> Result<Vec<String>> {
    let mut tags = vec![OUTSIDE_TAG.to_string(); n_tokens];

    for entity in entities {
        let span = entity.token_span;
        if span.is_empty() || span.end > n_tokens {
            return Err(NluError::SpanOutOfRange {
                start: span.start,
                end: span.end,
                len: n_tokens,
            });
        }
        tags[span.start] = format!("B-{}", entity.entity_type);
        for tag in &mut tags[span.start + 1..span.end] {
            *tag = format!("I-{}", entity.entity_type);
        }
    }
    Ok(tags)
}

/// Converte tags BIO em spans de tokens com o tipo da entidade.
///
/// Um `I-X` sem `B-X` antes (ou depois de uma entidade de outro tipo) abre uma entidade nova.
pub fn bio_to_spans<S: AsRef<str>>(tags: &[S]) -> Vec<(Span, String)> {
    let mut spans = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (i, tag) in tags.iter().enumerate() {
        let tag = tag.as_ref();
        if let Some(label) = tag.strip_prefix("B-") {
            if let Some((start, open)) = current.take() {
                spans.push((Span::new(start, i), open));
            }
            current = Some((i, label.to_string()));
        } else if let Some(label) = tag.strip_prefix("I-") {
            match current.take() {
                Some((start, open)) if open == label => current = Some((start, open)),
                Some((start, open)) => {
                    spans.push((Span::new(start, i), open));
                    current = Some((i, label.to_string()));
                }
                None => current = Some((i, label.to_string())),
            }
        } else if let Some((start, open)) = current.take() {
            spans.push((Span::new(start, i), open));
        }
    }

    // Fecha a última entidade, se aberta
    if let Some((start, open)) = current {
        spans.push((Span::new(start, tags.len()), open));
    }

    spans
}
