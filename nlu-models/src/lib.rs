//! # nlu-models — Modelos de Classificação e Tagging para NLU
//!
//! Este crate reúne a infraestrutura de treino e predição de modelos de linguagem
//! natural sobre queries curtas: classificação de texto e reconhecimento de entidades.
//!
//! ## Arquitetura
//!
//! 1.  **Configuração** ([`config`]): um [`ModelConfig`] diz qual modelo, quais features e qual rótulo usar.
//! 2.  **Registro** ([`registry`]): resolve nomes em fábricas de modelos, extratores e label encoders.
//! 3.  **Recursos** ([`resources`]): gazetteers e tabelas de frequência calculadas a partir do treino.
//! 4.  **Features** ([`features`]): extratores por query ou por token, com requisitos declarados.
//! 5.  **Rótulos** ([`labels`]): codificação de classes e de entidades (BIO).
//! 6.  **Modelos** ([`models`]): [`TextModel`] e [`TaggerModel`], ambos sobre um perceptron médio.
//! 7.  **Métricas** ([`scoring`]): acurácia de sequência e de tag para busca de hiperparâmetros.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use nlu_models::{Label, ModelConfig, Query, Registry, Resources};
//!
//! let registry = Registry::with_defaults();
//! let config = ModelConfig::new("text", "query", "class").with_feature("bag-of-words");
//! let mut model = registry.create_model(&config).unwrap();
//!
//! let queries = vec![Query::new("vai chover hoje"), Query::new("toque samba")];
//! let labels = vec![
//!     Label::Class("weather".to_string()),
//!     Label::Class("music".to_string()),
//! ];
//! model.fit(&queries, &labels, Resources::default()).unwrap();
//!
//! let label = model.predict(&Query::new("toque samba"), None).unwrap();
//! assert_eq!(label, Label::Class("music".to_string()));
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod features;
pub mod gazetteer;
pub mod labels;
pub mod models;
pub mod perceptron;
pub mod query;
pub mod registry;
pub mod resources;
pub mod scoring;
pub mod text;

pub use config::ModelConfig;
pub use entity::{QueryEntity, Span};
pub use error::{NluError, Result};
pub use labels::Label;
pub use models::{Model, TaggerModel, TextModel};
pub use query::Query;
pub use registry::Registry;
pub use resources::{DynamicResources, Resources};
pub use scoring::{get_seq_accuracy_scorer, get_seq_tag_accuracy_scorer, Scorer};
