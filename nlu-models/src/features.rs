//! # Extratores de Features
//!
//! Cada extrator é registrado por nome como um [`FeatureExtractor`]: um *template*
//! que recebe os parâmetros da configuração e devolve a função de extração, mais o
//! conjunto de recursos que essa função precisa (ver [`requires`]).
//!
//! Há dois tipos de extrator:
//!
//! - **Query**: um vetor de features para a query inteira (classificadores).
//! - **Sequence**: um vetor por token (taggers). Os nomes terminam em `-seq`.
//!
//! ## Extratores Implementados
//!
//! | Nome               | Tipo     | Requer       |
//! |--------------------|----------|--------------|
//! | `bag-of-words`     | Query    | `w_freq`     |
//! | `length`           | Query    | —            |
//! | `exact`            | Query    | `q_freq`     |
//! | `gaz-freq`         | Query    | `gazetteers` |
//! | `bag-of-words-seq` | Sequence | —            |
//! | `in-gaz-span-seq`  | Sequence | `gazetteers` |

use std::collections::{BTreeSet, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::FeatureParams;
use crate::error::{NluError, Result};
use crate::gazetteer::MAX_NGRAM;
use crate::query::Query;
use crate::resources::{Resources, GAZETTEER_RSC, QUERY_FREQ_RSC, WORD_FREQ_RSC};
use crate::text::{get_ngram, iterate_ngrams, mask_numerics};

/// Token usado para palavras abaixo do limiar de frequência.
pub const OOV_TOKEN: &str = "OOV";

/// Vetor esparso de features.
///
/// O espaço de features é aberto (ex: "bag_of_words|length:1|ngram:recife"), mas cada
/// exemplo ativa só um punhado delas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub features: HashMap<String, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define o valor de uma feature, sobrescrevendo o anterior.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.features.insert(key.into(), value);
    }

    /// Soma `value` ao valor atual da feature.
    pub fn add(&mut self, key: impl Into<String>, value: f64) {
        *self.features.entry(key.into()).or_insert(0.0) += value;
    }

    /// Mantém o maior valor entre o atual e `value`.
    pub fn max(&mut self, key: impl Into<String>, value: f64) {
        let entry = self.features.entry(key.into()).or_insert(value);
        *entry = entry.max(value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.features.get(key).copied()
    }

    /// Incorpora as features de outro vetor (somando colisões).
    pub fn merge(&mut self, other: FeatureVector) {
        for (key, value) in other.features {
            self.add(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

pub type QueryExtractorFn = Box<dyn Fn(&Query, &Resources) -> FeatureVector + Send + Sync>;
pub type SequenceExtractorFn = Box<dyn Fn(&Query, &Resources) -> Vec<FeatureVector> + Send + Sync>;

/// Função de extração já parametrizada.
pub enum Extractor {
    /// Um vetor por query.
    Query(QueryExtractorFn),
    /// Um vetor por token da query.
    Sequence(SequenceExtractorFn),
}

impl Extractor {
    pub fn kind(&self) -> &'static str {
        match self {
            Extractor::Query(_) => "query",
            Extractor::Sequence(_) => "sequence",
        }
    }
}

/// Constrói um [`Extractor`] a partir dos parâmetros da configuração.
pub type ExtractorTemplate = fn(&FeatureParams) -> Result<Extractor>;

/// Um template de extrator com os recursos que ele exige.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    template: ExtractorTemplate,
    requirements: BTreeSet<String>,
}

impl FeatureExtractor {
    pub fn new(template: ExtractorTemplate) -> Self {
        Self {
            template,
            requirements: BTreeSet::new(),
        }
    }

    /// Declara que o extrator depende do recurso `resource`.
    ///
    /// Chamadas encadeadas acumulam no mesmo conjunto.
    pub fn requires(mut self, resource: impl Into<String>) -> Self {
        self.requirements.insert(resource.into());
        self
    }

    pub fn requirements(&self) -> &BTreeSet<String> {
        &self.requirements
    }

    /// Instancia a função de extração com os parâmetros dados.
    pub fn build(&self, params: &FeatureParams) -> Result<Extractor> {
        (self.template)(params)
    }
}

/// Versão funcional de [`FeatureExtractor::requires`], para compor declarações:
///
/// ```rust
/// use nlu_models::features::{requires, FeatureExtractor, Extractor, FeatureVector};
///
/// let extractor = requires("gazetteers")(requires("w_freq")(FeatureExtractor::new(|_| {
///     Ok(Extractor::Query(Box::new(|_, _| FeatureVector::new())))
/// })));
/// assert!(extractor.requirements().contains("gazetteers"));
/// assert!(extractor.requirements().contains("w_freq"));
/// ```
pub fn requires(resource: impl Into<String>) -> impl FnOnce(FeatureExtractor) -> FeatureExtractor {
    let resource = resource.into();
    move |extractor| extractor.requires(resource)
}

/// Extratores para o tipo de exemplo `query`.
pub fn query_features() -> HashMap<String, FeatureExtractor> {
    HashMap::from([
        (
            "bag-of-words".to_string(),
            FeatureExtractor::new(extract_bag_of_words).requires(WORD_FREQ_RSC),
        ),
        ("length".to_string(), FeatureExtractor::new(extract_length)),
        (
            "exact".to_string(),
            FeatureExtractor::new(extract_exact).requires(QUERY_FREQ_RSC),
        ),
        (
            "gaz-freq".to_string(),
            requires(GAZETTEER_RSC)(FeatureExtractor::new(extract_gaz_freq)),
        ),
        (
            "bag-of-words-seq".to_string(),
            FeatureExtractor::new(extract_bag_of_words_seq),
        ),
        (
            "in-gaz-span-seq".to_string(),
            requires(GAZETTEER_RSC)(FeatureExtractor::new(extract_in_gaz_span_seq)),
        ),
    ])
}

fn parse_params<P: DeserializeOwned>(name: &str, params: &FeatureParams) -> Result<P> {
    serde_json::from_value(serde_json::Value::Object(params.clone())).map_err(|e| {
        NluError::InvalidFeatureParams {
            name: name.to_string(),
            reason: e.to_string(),
        }
    })
}

fn check_lengths(name: &str, lengths: &[usize]) -> Result<()> {
    if lengths.is_empty() || lengths.contains(&0) {
        return Err(NluError::InvalidFeatureParams {
            name: name.to_string(),
            reason: "lengths must be non-empty and positive".to_string(),
        });
    }
    Ok(())
}

fn default_query_lengths() -> Vec<usize> {
    vec![1]
}

fn default_seq_lengths() -> Vec<usize> {
    vec![1, 2]
}

fn default_window() -> usize {
    2
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BagOfWordsParams {
    #[serde(default = "default_query_lengths")]
    lengths: Vec<usize>,
    /// Tokens com frequência abaixo deste valor viram `OOV`.
    #[serde(default)]
    threshold: u64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BagOfWordsSeqParams {
    #[serde(default = "default_seq_lengths")]
    lengths: Vec<usize>,
    /// Distância máxima (em tokens) entre o token atual e o início do n-grama.
    #[serde(default = "default_window")]
    window: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParams {}

/// N-gramas de palavras mascaradas, contando ocorrências.
fn extract_bag_of_words(params: &FeatureParams) -> Result<Extractor> {
    let BagOfWordsParams { lengths, threshold } = parse_params("bag-of-words", params)?;
    check_lengths("bag-of-words", &lengths)?;

    Ok(Extractor::Query(Box::new(move |query, resources| {
        let tokens: Vec<String> = query
            .tokens()
            .iter()
            .map(|token| {
                let masked = mask_numerics(token);
                let freq = resources.word_freq.get(&masked).copied().unwrap_or(0);
                if freq < threshold {
                    OOV_TOKEN.to_string()
                } else {
                    masked
                }
            })
            .collect();

        let mut fv = FeatureVector::new();
        for &length in &lengths {
            if tokens.len() < length {
                continue;
            }
            for start in 0..=tokens.len() - length {
                let ngram = get_ngram(&tokens, start as isize, length);
                fv.add(format!("bag_of_words|length:{length}|ngram:{ngram}"), 1.0);
            }
        }
        fv
    })))
}

fn extract_length(params: &FeatureParams) -> Result<Extractor> {
    let NoParams {} = parse_params("length", params)?;

    Ok(Extractor::Query(Box::new(|query, _| {
        let mut fv = FeatureVector::new();
        fv.insert("tokens", query.len() as f64);
        fv.insert("chars", query.text().chars().count() as f64);
        fv
    })))
}

/// A query normalizada inteira, se ela apareceu no treino.
fn extract_exact(params: &FeatureParams) -> Result<Extractor> {
    let NoParams {} = parse_params("exact", params)?;

    Ok(Extractor::Query(Box::new(|query, resources| {
        let text = query.normalized_text();
        let mut fv = FeatureVector::new();
        if resources.query_freq.contains_key(&text) {
            fv.insert(format!("exact|query:{text}"), 1.0);
        } else {
            fv.insert("exact|query:<OOV>", 1.0);
        }
        fv
    })))
}

/// Quantos n-gramas da query estão em cada gazetteer, e a maior popularidade.
fn extract_gaz_freq(params: &FeatureParams) -> Result<Extractor> {
    let NoParams {} = parse_params("gaz-freq", params)?;

    Ok(Extractor::Query(Box::new(|query, resources| {
        let ngrams = iterate_ngrams(query.tokens(), MAX_NGRAM);
        let mut fv = FeatureVector::new();

        for (entity_type, gaz) in &resources.gazetteers {
            for ngram in &ngrams {
                if let Some(&pop) = gaz.pop_dict.get(ngram) {
                    fv.add(format!("in_gaz|type:{entity_type}|count"), 1.0);
                    fv.max(format!("in_gaz|type:{entity_type}|pop"), pop);
                }
            }
        }
        fv
    })))
}

/// Para cada token, os n-gramas em volta dele (posições relativas de `-window` a `window`).
fn extract_bag_of_words_seq(params: &FeatureParams) -> Result<Extractor> {
    let BagOfWordsSeqParams { lengths, window } = parse_params("bag-of-words-seq", params)?;
    check_lengths("bag-of-words-seq", &lengths)?;
    let window = window as isize;

    Ok(Extractor::Sequence(Box::new(move |query, _| {
        let tokens: Vec<String> = query.tokens().iter().map(|t| mask_numerics(t)).collect();

        (0..tokens.len())
            .map(|i| {
                let mut fv = FeatureVector::new();
                for &length in &lengths {
                    for offset in -window..=window {
                        let ngram = get_ngram(&tokens, i as isize + offset, length);
                        fv.insert(
                            format!("bag_of_words|length:{length}|pos:{offset}|ngram:{ngram}"),
                            1.0,
                        );
                    }
                }
                fv
            })
            .collect()
    })))
}

/// Marca os tokens cobertos por uma entrada de gazetteer (início ou continuação).
fn extract_in_gaz_span_seq(params: &FeatureParams) -> Result<Extractor> {
    let NoParams {} = parse_params("in-gaz-span-seq", params)?;

    Ok(Extractor::Sequence(Box::new(|query, resources| {
        let tokens = query.tokens();
        let mut vectors = vec![FeatureVector::new(); tokens.len()];

        for (entity_type, gaz) in &resources.gazetteers {
            for start in 0..tokens.len() {
                for end in start + 1..=tokens.len().min(start + MAX_NGRAM) {
                    let ngram = tokens[start..end].join(" ");
                    let Some(&pop) = gaz.pop_dict.get(&ngram) else {
                        continue;
                    };

                    vectors[start].insert(format!("in_gaz|type:{entity_type}|pos:start"), 1.0);
                    for fv in &mut vectors[start + 1..end] {
                        fv.insert(format!("in_gaz|type:{entity_type}|pos:cont"), 1.0);
                    }
                    for fv in &mut vectors[start..end] {
                        fv.max(format!("in_gaz|type:{entity_type}|pop"), pop);
                    }
                }
            }
        }
        vectors
    })))
}
