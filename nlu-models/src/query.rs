//! # Queries Tokenizadas
//!
//! Uma [`Query`] é a unidade de exemplo do pipeline: o texto bruto, os tokens
//! normalizados (minúsculos) e a posição de cada token no texto original.
//!
//! A segmentação usa as fronteiras de palavra do Unicode (UAX #29) via
//! `unicode-segmentation`, descartando os segmentos que são só espaço.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use nlu_models::query::Query;
//!
//! let query = Query::new("Toque Chico Buarque às 8h");
//! assert_eq!(query.tokens(), ["toque", "chico", "buarque", "às", "8h"]);
//! assert_eq!(query.normalized_text(), "toque chico buarque às 8h");
//! ```

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::entity::Span;

/// Uma query tokenizada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Texto original, sem alterações.
    text: String,
    /// Tokens normalizados (lowercase).
    tokens: Vec<String>,
    /// Posição de byte de cada token em `text` (fim exclusivo).
    spans: Vec<Span>,
}

impl Query {
    /// Tokeniza o texto bruto.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut tokens = Vec::new();
        let mut spans = Vec::new();

        for (start, segment) in text.split_word_bound_indices() {
            if segment.trim().is_empty() {
                continue;
            }
            tokens.push(segment.to_lowercase());
            spans.push(Span::new(start, start + segment.len()));
        }

        Self { text, tokens, spans }
    }

    /// Constrói a query a partir de tokens já segmentados, unindo-os com espaço.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut text = String::new();
        let mut spans = Vec::with_capacity(tokens.len());

        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                text.push(' ');
            }
            let start = text.len();
            text.push_str(token.as_ref());
            spans.push(Span::new(start, text.len()));
        }

        let tokens = tokens.iter().map(|t| t.as_ref().to_lowercase()).collect();
        Self { text, tokens, spans }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Posições de byte dos tokens no texto original.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens normalizados unidos por espaço.
    pub fn normalized_text(&self) -> String {
        self.tokens.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_preserves_offsets() {
        let query = Query::new("Onde fica  São Paulo?");
        assert_eq!(query.tokens(), ["onde", "fica", "são", "paulo", "?"]);

        let sao = query.spans()[2];
        assert_eq!(&query.text()[sao.start..sao.end], "São");
    }

    #[test]
    fn test_empty_query() {
        let query = Query::new("   ");
        assert!(query.is_empty());
        assert_eq!(query.normalized_text(), "");
    }

    #[test]
    fn test_from_tokens() {
        let query = Query::from_tokens(&["Play", "Jazz"]);
        assert_eq!(query.text(), "Play Jazz");
        assert_eq!(query.tokens(), ["play", "jazz"]);
        assert_eq!(query.spans()[1], Span::new(5, 9));
    }
}
