//! # Anotações de Entidade
//!
//! Uma [`QueryEntity`] marca um trecho de uma [`Query`] com um tipo de entidade.
//! Ela guarda dois intervalos:
//!
//! - `span`: posição de byte no texto original (fim exclusivo).
//! - `token_span`: índices dos tokens cobertos (fim exclusivo), usado pelo encoder BIO.
//!
//! Para comparar sequências de entidades importam o tipo, o `span` e o texto.

use serde::{Deserialize, Serialize};

use crate::error::{NluError, Result};
use crate::query::Query;

/// Intervalo semiaberto `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Uma entidade anotada (ou predita) dentro de uma query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryEntity {
    /// Texto da entidade, como aparece na query original.
    pub text: String,
    /// Tipo da entidade (ex: "city", "artist").
    pub entity_type: String,
    /// Posição de byte no texto original.
    pub span: Span,
    /// Índices dos tokens cobertos.
    pub token_span: Span,
}

impl QueryEntity {
    /// Cria a entidade que cobre os tokens `token_span` da query.
    ///
    /// O texto e o span de bytes são derivados das posições dos tokens.
    pub fn from_token_span(
        query: &Query,
        entity_type: impl Into<String>,
        token_span: Span,
    ) -> Result<Self> {
        if token_span.is_empty() || token_span.end > query.len() {
            return Err(NluError::SpanOutOfRange {
                start: token_span.start,
                end: token_span.end,
                len: query.len(),
            });
        }

        let spans = query.spans();
        let span = Span::new(spans[token_span.start].start, spans[token_span.end - 1].end);

        Ok(Self {
            text: query.text()[span.start..span.end].to_string(),
            entity_type: entity_type.into(),
            span,
            token_span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_token_span() {
        let query = Query::new("Toque Chico Buarque agora");
        let entity = QueryEntity::from_token_span(&query, "artist", Span::new(1, 3)).unwrap();

        assert_eq!(entity.text, "Chico Buarque");
        assert_eq!(entity.span, Span::new(6, 19));
        assert_eq!(entity.entity_type, "artist");
    }

    #[test]
    fn test_from_token_span_out_of_range() {
        let query = Query::new("oi");
        assert!(matches!(
            QueryEntity::from_token_span(&query, "x", Span::new(0, 2)),
            Err(NluError::SpanOutOfRange { len: 1, .. })
        ));
        assert!(QueryEntity::from_token_span(&query, "x", Span::new(1, 1)).is_err());
    }
}
