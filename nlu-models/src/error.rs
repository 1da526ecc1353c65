//! # Tipos de Erro
//!
//! Todos os módulos do crate reportam falhas por meio de [`NluError`].
//! Note que a busca por chave desconhecida tem duas formas: o registro de modelos
//! devolve um erro descritivo de configuração, enquanto features e label encoders
//! devolvem apenas [`NluError::KeyNotFound`] com a chave ausente.

/// Erros das operações de registro, configuração, recursos e modelos.
#[derive(Debug, thiserror::Error)]
pub enum NluError {
    /// O `model_type` da configuração não está registrado.
    #[error("Invalid model configuration: Unknown model type {0:?}")]
    UnknownModelType(String),

    /// Chave ausente em um dos registros de features ou label encoders.
    #[error("key not found: {0:?}")]
    KeyNotFound(String),

    #[error("Model {0:?} is already registered.")]
    ModelAlreadyRegistered(String),

    #[error("Features for example type {0:?} are already registered.")]
    FeaturesAlreadyRegistered(String),

    #[error("Label encoder for label type {0:?} is already registered.")]
    LabelAlreadyRegistered(String),

    /// Nome de recurso que não sabemos construir.
    #[error("unknown resource {0:?}")]
    UnknownResource(String),

    /// Parâmetros inválidos para um extrator de features.
    #[error("invalid parameters for feature {name:?}: {reason}")]
    InvalidFeatureParams {
        /// Nome do extrator.
        name: String,
        /// Descrição do problema.
        reason: String,
    },

    /// O extrator produz um tipo de feature que o modelo não consome.
    #[error("feature {name:?} is a {found} extractor, expected {expected}")]
    FeatureKindMismatch {
        /// Nome do extrator.
        name: String,
        /// Tipo esperado pelo modelo ("query" ou "sequence").
        expected: &'static str,
        /// Tipo produzido pelo extrator.
        found: &'static str,
    },

    /// O rótulo não corresponde ao tipo tratado pelo encoder.
    #[error("expected a {expected} label, got {found}")]
    LabelMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Span de tokens fora dos limites da query.
    #[error("token span {start}..{end} out of range for query with {len} tokens")]
    SpanOutOfRange { start: usize, end: usize, len: usize },

    /// Número de exemplos e rótulos diferente no treino ou na avaliação.
    #[error("got {examples} examples but {labels} labels")]
    LengthMismatch { examples: usize, labels: usize },

    /// `predict` chamado antes de `fit`.
    #[error("model {0:?} has not been fit")]
    NotFitted(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Resultado padrão das operações do crate.
pub type Result<T> = std::result::Result<T, NluError>;
