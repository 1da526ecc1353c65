//! # Gazetteers
//!
//! Um gazetteer é um léxico pré-computado de um tipo de entidade: para cada forma
//! de superfície conhecida guarda a sua popularidade, e mantém um índice invertido
//! de n-gramas de palavras para acelerar buscas parciais.
//!
//! ## Formato serializado
//!
//! Dentro dos recursos de um classificador os gazetteers ficam na forma de
//! [`GazetteerData`]:
//!
//! | Campo            | Conteúdo                                          |
//! |------------------|---------------------------------------------------|
//! | `name`           | Tipo de entidade                                  |
//! | `total_entities` | Quantidade de entidades distintas                 |
//! | `pop_dict`       | Entidade → popularidade                           |
//! | `index`          | N-grama → entidades que o contêm                  |
//! | `entities`       | Entidades em ordem de inserção                    |
//! | `sys_types`      | Tipos de sistema associados                       |
//!
//! [`Gazetteer`] é a forma "viva", com a operação de atualização por entidade.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::text::iterate_ngrams;

/// Tamanho máximo dos n-gramas indexados.
pub const MAX_NGRAM: usize = 6;

/// Forma serializada de um gazetteer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GazetteerData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub total_entities: u64,
    #[serde(default)]
    pub pop_dict: BTreeMap<String, f64>,
    #[serde(default)]
    pub index: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub sys_types: BTreeSet<String>,
}

/// Gazetteer de um tipo de entidade.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    name: String,
    /// Se verdadeiro, não mantém o índice de n-gramas.
    exclude_ngrams: bool,
    max_ngram: usize,
    entity_count: u64,
    pop_dict: BTreeMap<String, f64>,
    index: BTreeMap<String, BTreeSet<String>>,
    entities: Vec<String>,
    sys_types: BTreeSet<String>,
}

impl Gazetteer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exclude_ngrams: false,
            max_ngram: MAX_NGRAM,
            entity_count: 0,
            pop_dict: BTreeMap::new(),
            index: BTreeMap::new(),
            entities: Vec::new(),
            sys_types: BTreeSet::new(),
        }
    }

    /// Desliga a manutenção do índice de n-gramas.
    pub fn without_ngrams(mut self) -> Self {
        self.exclude_ngrams = true;
        self
    }

    /// Reconstrói um gazetteer a partir da forma serializada.
    ///
    /// O nome vem do chamador, não de `data.name`.
    pub fn from_data(name: impl Into<String>, data: GazetteerData) -> Self {
        Self {
            entity_count: data.total_entities,
            pop_dict: data.pop_dict,
            index: data.index,
            entities: data.entities,
            sys_types: data.sys_types,
            ..Self::new(name)
        }
    }

    /// Serializa o gazetteer.
    pub fn to_data(&self) -> GazetteerData {
        GazetteerData {
            name: self.name.clone(),
            total_entities: self.entity_count,
            pop_dict: self.pop_dict.clone(),
            index: self.index.clone(),
            entities: self.entities.clone(),
            sys_types: self.sys_types.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity_count(&self) -> u64 {
        self.entity_count
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Popularidade da entidade, se ela for conhecida.
    pub fn popularity(&self, entity: &str) -> Option<f64> {
        self.pop_dict.get(entity).copied()
    }

    /// Entidades que contêm o n-grama dado.
    pub fn entities_with_ngram(&self, ngram: &str) -> Option<&BTreeSet<String>> {
        self.index.get(ngram)
    }

    /// Atualiza uma entidade e sua popularidade.
    ///
    /// Uma entidade nova é anexada à lista, conta para `total_entities` e entra no
    /// índice de n-gramas. A popularidade é sempre atualizada: com `keep_max` fica
    /// o maior valor entre o antigo e o novo, senão o novo sobrescreve.
    pub fn update_entity(&mut self, entity: &str, popularity: f64, keep_max: bool) {
        let old = self.pop_dict.get(entity).copied();

        if old.is_none() {
            self.entities.push(entity.to_string());
            self.entity_count += 1;
            if !self.exclude_ngrams {
                let words: Vec<&str> = entity.split_whitespace().collect();
                for ngram in iterate_ngrams(&words, self.max_ngram) {
                    self.index.entry(ngram).or_default().insert(entity.to_string());
                }
            }
        }

        let new = match old {
            Some(old) if keep_max => old.max(popularity),
            _ => popularity,
        };
        if old != Some(new) {
            trace!(gazetteer = %self.name, entity, ?old, new, "popularity updated");
        }
        self.pop_dict.insert(entity.to_string(), new);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_new_entity() {
        let mut gaz = Gazetteer::new("city");
        gaz.update_entity("rio de janeiro", 0.8, true);

        assert_eq!(gaz.entity_count(), 1);
        assert_eq!(gaz.popularity("rio de janeiro"), Some(0.8));
        assert!(gaz.entities_with_ngram("janeiro").unwrap().contains("rio de janeiro"));
        assert!(gaz.entities_with_ngram("rio de").is_some());
    }

    #[test]
    fn test_keep_max_popularity() {
        let mut gaz = Gazetteer::new("city");
        gaz.update_entity("recife", 0.9, true);
        gaz.update_entity("recife", 0.3, true);
        assert_eq!(gaz.popularity("recife"), Some(0.9));
        assert_eq!(gaz.entity_count(), 1);

        gaz.update_entity("recife", 0.3, false);
        assert_eq!(gaz.popularity("recife"), Some(0.3));
    }

    #[test]
    fn test_without_ngrams() {
        let mut gaz = Gazetteer::new("city").without_ngrams();
        gaz.update_entity("belo horizonte", 1.0, true);
        assert!(gaz.entities_with_ngram("belo").is_none());
        assert_eq!(gaz.entities(), ["belo horizonte"]);
    }

    #[test]
    fn test_data_round_trip() {
        let mut gaz = Gazetteer::new("artist");
        gaz.update_entity("caetano veloso", 0.7, true);

        let data = gaz.to_data();
        assert_eq!(data.name, "artist");
        assert_eq!(data.total_entities, 1);

        let rebuilt = Gazetteer::from_data("artist", data.clone());
        assert_eq!(rebuilt.to_data(), data);
    }
}
