//! # Métricas de Sequência
//!
//! Métricas de acurácia para saídas sequenciais, na convenção de busca de
//! hiperparâmetros: **maior é melhor**, sem inversão de sinal.
//!
//! - [`sequence_accuracy_scoring`]: uma sequência só conta se **todas** as tags baterem.
//! - [`sequence_tag_accuracy_scoring`]: conta tag a tag, sobre as sequências achatadas.
//! - [`entity_seqs_equal`]: compara listas de entidades (tipo, span e texto).
//!
//! Entradas vazias valem `0.0` em vez de dividir por zero.

use rayon::prelude::*;

use crate::entity::QueryEntity;
use crate::error::{NluError, Result};
use crate::labels::{EncodedLabel, Label};
use crate::models::Model;
use crate::query::Query;

/// Fração de sequências preditas idênticas à sequência verdadeira.
///
/// Os pares são formados por posição até o menor dos dois tamanhos, mas o
/// denominador é sempre `y_true.len()`.
pub fn sequence_accuracy_scoring<T: PartialEq>(y_true: &[T], y_pred: &[T]) -> f64 {
    let total = y_true.len();
    if total == 0 {
        return 0.0;
    }

    let matches = y_true
        .iter()
        .zip(y_pred)
        .filter(|(yseq_true, yseq_pred)| yseq_true == yseq_pred)
        .count();

    matches as f64 / total as f64
}

/// Fração de tags corretas, depois de achatar as duas listas de sequências.
pub fn sequence_tag_accuracy_scoring<S, T>(y_true: &[S], y_pred: &[S]) -> f64
where
    S: AsRef<[T]>,
    T: PartialEq,
{
    let y_true_flat = y_true.iter().flat_map(|seq| seq.as_ref());
    let y_pred_flat = y_pred.iter().flat_map(|seq| seq.as_ref());

    let total: usize = y_true.iter().map(|seq| seq.as_ref().len()).sum();
    if total == 0 {
        return 0.0;
    }

    let matches = y_true_flat
        .zip(y_pred_flat)
        .filter(|(true_tag, pred_tag)| true_tag == pred_tag)
        .count();

    matches as f64 / total as f64
}

/// Verdadeiro se as duas listas têm o mesmo tamanho e cada par alinhado tem
/// o mesmo tipo, span e texto.
pub fn entity_seqs_equal(expected: &[QueryEntity], predicted: &[QueryEntity]) -> bool {
    if expected.len() != predicted.len() {
        return false;
    }
    expected.iter().zip(predicted).all(|(e, p)| {
        e.entity_type == p.entity_type && e.span == p.span && e.text == p.text
    })
}

pub type ScoreFn = fn(&[EncodedLabel], &[EncodedLabel]) -> f64;

/// Métrica para busca de hiperparâmetros.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    name: &'static str,
    score_func: ScoreFn,
}

impl Scorer {
    pub fn new(name: &'static str, score_func: ScoreFn) -> Self {
        Self { name, score_func }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Sempre verdadeiro: as métricas daqui não invertem o sinal.
    pub fn greater_is_better(&self) -> bool {
        true
    }

    pub fn score(&self, y_true: &[EncodedLabel], y_pred: &[EncodedLabel]) -> f64 {
        (self.score_func)(y_true, y_pred)
    }

    /// Avalia um modelo treinado sobre exemplos rotulados.
    ///
    /// As predições rodam em paralelo; rótulos verdadeiros e preditos passam pelo
    /// label encoder do modelo antes da métrica.
    pub fn score_model(&self, model: &dyn Model, examples: &[Query], labels: &[Label]) -> Result<f64> {
        if examples.len() != labels.len() {
            return Err(NluError::LengthMismatch {
                examples: examples.len(),
                labels: labels.len(),
            });
        }

        let predicted = examples
            .par_iter()
            .map(|query| model.predict(query, None))
            .collect::<Result<Vec<_>>>()?;

        let encoder = model.label_encoder();
        let y_true = encoder.encode(labels, examples)?;
        let y_pred = encoder.encode(&predicted, examples)?;
        Ok(self.score(&y_true, &y_pred))
    }
}

/// Scorer baseado em [`sequence_accuracy_scoring`].
pub fn get_seq_accuracy_scorer() -> Scorer {
    Scorer::new("seq_accuracy", sequence_accuracy_scoring::<EncodedLabel>)
}

/// Scorer baseado em [`sequence_tag_accuracy_scoring`].
pub fn get_seq_tag_accuracy_scorer() -> Scorer {
    Scorer::new("seq_tag_accuracy", sequence_tag_accuracy_scoring::<EncodedLabel, String>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Span;

    fn seqs(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|seq| seq.iter().map(|t| t.to_string()).collect())
            .collect()
    }

    fn entity(entity_type: &str, start: usize, end: usize, text: &str) -> QueryEntity {
        QueryEntity {
            text: text.to_string(),
            entity_type: entity_type.to_string(),
            span: Span::new(start, end),
            token_span: Span::new(0, 1),
        }
    }

    #[test]
    fn test_sequence_accuracy_identical() {
        let y = seqs(&[&["B-city", "O"], &["O"]]);
        assert_eq!(sequence_accuracy_scoring(&y, &y), 1.0);
    }

    #[test]
    fn test_sequence_accuracy_no_matches() {
        let y_true = seqs(&[&["B-city", "O"], &["O"]]);
        let y_pred = seqs(&[&["O", "O"], &["B-city"]]);
        assert_eq!(sequence_accuracy_scoring(&y_true, &y_pred), 0.0);
    }

    #[test]
    fn test_sequence_accuracy_whole_sequence() {
        // Uma tag errada invalida a sequência inteira
        let y_true = seqs(&[&["B-city", "O"], &["O"]]);
        let y_pred = seqs(&[&["B-city", "B-city"], &["O"]]);
        assert_eq!(sequence_accuracy_scoring(&y_true, &y_pred), 0.5);
    }

    #[test]
    fn test_sequence_accuracy_empty() {
        let empty: Vec<Vec<String>> = vec![];
        assert_eq!(sequence_accuracy_scoring(&empty, &empty), 0.0);
    }

    #[test]
    fn test_sequence_accuracy_length_mismatch() {
        // Pares só até o menor tamanho, denominador é y_true
        let y_true = seqs(&[&["O"], &["O"]]);
        let y_pred = seqs(&[&["O"]]);
        assert_eq!(sequence_accuracy_scoring(&y_true, &y_pred), 0.5);

        let y_pred = seqs(&[&["O"], &["O"], &["B-city"]]);
        assert_eq!(sequence_accuracy_scoring(&y_true, &y_pred), 1.0);
    }

    #[test]
    fn test_sequence_tag_accuracy() {
        let y_true = seqs(&[&["B-city", "O"], &["O", "O"]]);
        let y_pred = seqs(&[&["B-city", "B-city"], &["O", "O"]]);
        assert_eq!(sequence_tag_accuracy_scoring(&y_true, &y_pred), 0.75);
    }

    #[test]
    fn test_sequence_tag_accuracy_empty() {
        let y_true = seqs(&[&[], &[]]);
        let y_pred = seqs(&[&["O"]]);
        assert_eq!(sequence_tag_accuracy_scoring(&y_true, &y_pred), 0.0);
    }

    #[test]
    fn test_entity_seqs_equal() {
        let a = vec![entity("city", 9, 15, "recife")];
        assert!(entity_seqs_equal(&a, &a.clone()));
        assert!(entity_seqs_equal(&[], &[]));

        assert!(!entity_seqs_equal(&a, &[]));
        assert!(!entity_seqs_equal(&a, &[entity("state", 9, 15, "recife")]));
        assert!(!entity_seqs_equal(&a, &[entity("city", 9, 14, "recife")]));
        assert!(!entity_seqs_equal(&a, &[entity("city", 9, 15, "Recife")]));
    }

    #[test]
    fn test_scorers() {
        let y_true = seqs(&[&["B-city", "O"], &["O"]]);
        let y_pred = seqs(&[&["B-city", "B-city"], &["O"]]);

        let seq = get_seq_accuracy_scorer();
        assert_eq!(seq.name(), "seq_accuracy");
        assert!(seq.greater_is_better());
        assert_eq!(seq.score(&y_true, &y_pred), 0.5);

        let tag = get_seq_tag_accuracy_scorer();
        assert!((tag.score(&y_true, &y_pred) - 2.0 / 3.0).abs() < 1e-9);
    }
}
