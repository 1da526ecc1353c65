//! # Recursos dos Classificadores
//!
//! Os extratores de features podem depender de recursos compartilhados: gazetteers
//! e tabelas de frequência calculadas sobre as queries de treino. Cada extrator
//! declara seus requisitos pelo nome (ver [`crate::features::requires`]) e o modelo
//! chama [`Resources::initialize`] com a união desses nomes antes do treino.
//!
//! Os gazetteers vêm de fora; em tempo de execução podem ser enriquecidos com
//! gazetteers dinâmicos via [`ingest_dynamic_gazetteer`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{NluError, Result};
use crate::gazetteer::{Gazetteer, GazetteerData};
use crate::query::Query;
use crate::text::{get_ngram, mask_numerics};

pub const GAZETTEER_RSC: &str = "gazetteers";
pub const QUERY_FREQ_RSC: &str = "q_freq";
pub const SYS_TYPES_RSC: &str = "sys_types";
pub const WORD_FREQ_RSC: &str = "w_freq";
pub const WORD_NGRAM_FREQ_RSC: &str = "w_ngram_freq";
pub const CHAR_NGRAM_FREQ_RSC: &str = "c_ngram_freq";

/// Tabela de contagens.
pub type FreqTable = HashMap<String, u64>;

/// Dicionário de recursos de um classificador.
///
/// Os nomes dos campos serializados são os próprios nomes dos recursos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    /// Tipo de entidade → gazetteer serializado.
    #[serde(default, rename = "gazetteers")]
    pub gazetteers: BTreeMap<String, GazetteerData>,
    /// Frequência das queries normalizadas.
    #[serde(default, rename = "q_freq")]
    pub query_freq: FreqTable,
    #[serde(default, rename = "sys_types")]
    pub sys_types: BTreeSet<String>,
    /// Frequência dos tokens mascarados.
    #[serde(default, rename = "w_freq")]
    pub word_freq: FreqTable,
    /// Frequência de uni e bigramas de tokens mascarados.
    #[serde(default, rename = "w_ngram_freq")]
    pub word_ngram_freq: FreqTable,
    /// Frequência de n-gramas de caracteres (1 a 3).
    #[serde(default, rename = "c_ngram_freq")]
    pub char_ngram_freq: FreqTable,
}

impl Resources {
    /// Lê recursos serializados em JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Constrói as tabelas exigidas por `requirements` a partir das queries de treino.
    ///
    /// Gazetteers e tipos de sistema são fornecidos pelo chamador: aqui só verificamos
    /// se estão presentes. Um nome desconhecido é erro.
    pub fn initialize<S: AsRef<str>>(&mut self, requirements: &[S], queries: &[Query]) -> Result<()> {
        for requirement in requirements {
            match requirement.as_ref() {
                GAZETTEER_RSC => {
                    if self.gazetteers.is_empty() {
                        warn!("feature requires gazetteers but none were loaded");
                    }
                }
                SYS_TYPES_RSC => {
                    if self.sys_types.is_empty() {
                        warn!("feature requires system entity types but none were loaded");
                    }
                }
                QUERY_FREQ_RSC => self.query_freq = query_freq(queries),
                WORD_FREQ_RSC => self.word_freq = word_freq(queries),
                WORD_NGRAM_FREQ_RSC => self.word_ngram_freq = word_ngram_freq(queries),
                CHAR_NGRAM_FREQ_RSC => self.char_ngram_freq = char_ngram_freq(queries),
                other => return Err(NluError::UnknownResource(other.to_string())),
            }
            debug!(resource = requirement.as_ref(), queries = queries.len(), "resource initialized");
        }
        Ok(())
    }

    /// Reconstrói o gazetteer de um tipo de entidade, se existir.
    pub fn gazetteer(&self, entity_type: &str) -> Option<Gazetteer> {
        self.gazetteers
            .get(entity_type)
            .map(|data| Gazetteer::from_data(entity_type, data.clone()))
    }
}

/// Sobreposição parcial de gazetteers enviada pela aplicação em tempo de execução.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicResources {
    /// Tipo de entidade → (entidade → popularidade).
    #[serde(default, rename = "gazetteers")]
    pub gazetteers: Option<BTreeMap<String, BTreeMap<String, f64>>>,
}

/// Incorpora gazetteers dinâmicos a uma cópia dos recursos.
///
/// Para cada tipo de entidade presente nos dois lados, o gazetteer é reconstruído
/// da cópia e, se já tiver alguma entidade (`total_entities > 0`), recebe cada par
/// entidade/popularidade do recurso dinâmico. Tipos ausentes nos recursos base são
/// ignorados. `resource` nunca é alterado.
pub fn ingest_dynamic_gazetteer(
    resource: &Resources,
    dynamic_resource: Option<&DynamicResources>,
) -> Resources {
    let mut workspace_resource = resource.clone();

    let Some(dynamic_gazetteers) = dynamic_resource.and_then(|d| d.gazetteers.as_ref()) else {
        return workspace_resource;
    };

    for (entity_type, entries) in dynamic_gazetteers {
        let Some(data) = workspace_resource.gazetteers.get_mut(entity_type) else {
            debug!(entity_type = %entity_type, "dynamic gazetteer skipped: unknown entity type");
            continue;
        };

        let mut gazetteer = Gazetteer::from_data(entity_type.as_str(), std::mem::take(data));
        if gazetteer.entity_count() > 0 {
            for (key, popularity) in entries {
                gazetteer.update_entity(key, *popularity, true);
            }
            debug!(entity_type = %entity_type, entries = entries.len(), "dynamic gazetteer merged");
        }
        *data = gazetteer.to_data();
    }

    workspace_resource
}

fn query_freq(queries: &[Query]) -> FreqTable {
    let mut freq = FreqTable::new();
    for query in queries {
        *freq.entry(query.normalized_text()).or_insert(0) += 1;
    }
    freq
}

fn word_freq(queries: &[Query]) -> FreqTable {
    let mut freq = FreqTable::new();
    for token in queries.iter().flat_map(Query::tokens) {
        *freq.entry(mask_numerics(token)).or_insert(0) += 1;
    }
    freq
}

fn word_ngram_freq(queries: &[Query]) -> FreqTable {
    let mut freq = FreqTable::new();
    for query in queries {
        let masked: Vec<String> = query.tokens().iter().map(|t| mask_numerics(t)).collect();
        for length in 1..=2 {
            for start in 0..masked.len() {
                *freq.entry(get_ngram(&masked, start as isize, length)).or_insert(0) += 1;
            }
        }
    }
    freq
}

fn char_ngram_freq(queries: &[Query]) -> FreqTable {
    let mut freq = FreqTable::new();
    for token in queries.iter().flat_map(Query::tokens) {
        let chars: Vec<char> = token.chars().collect();
        for length in 1..=3 {
            for window in chars.windows(length) {
                *freq.entry(window.iter().collect()).or_insert(0) += 1;
            }
        }
    }
    freq
}
