//! # Utilitários de Texto
//!
//! Funções puras sobre sequências de tokens, usadas pelos extratores de features
//! e pelos gazetteers:
//!
//! - [`mask_numerics`]: normaliza dígitos para que "2023" e "1999" virem a mesma feature.
//! - [`get_ngram`]: janela de tokens com sentinela para posições fora da sequência.
//! - [`iterate_ngrams`]: todos os n-gramas contíguos até um tamanho máximo.

use std::sync::LazyLock;

use regex::Regex;

/// Token sentinela para posições fora dos limites da sequência.
pub const OUT_OF_BOUNDS_TOKEN: &str = "<$>";

/// Token que substitui palavras formadas apenas por dígitos.
pub const NUMERIC_TOKEN: &str = "#NUM";

// `\d` no crate regex cobre toda a categoria Unicode Nd, não só ASCII.
static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").unwrap());

// Nd mais os dígitos de categoria No (Numeric_Type=Digit): sobrescritos,
// subscritos, dígitos circulados, parentesados e afins.
static ALL_DIGITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[\d\x{B2}\x{B3}\x{B9}\x{1369}-\x{1371}\x{19DA}\x{2070}\x{2074}-\x{2079}",
        r"\x{2080}-\x{2089}\x{2460}-\x{2468}\x{2474}-\x{247C}\x{2488}-\x{2490}",
        r"\x{24EA}\x{24F5}-\x{24FD}\x{24FF}\x{2776}-\x{277E}\x{2780}-\x{2788}",
        r"\x{278A}-\x{2792}\x{10A40}-\x{10A43}\x{10E60}-\x{10E68}\x{11052}-\x{1105A}",
        r"\x{1F100}-\x{1F10A}]+$",
    ))
    .unwrap()
});

/// Mascara os dígitos de um token.
///
/// - Token composto só de dígitos → `#NUM`. Contam também dígitos sobrescritos
///   e circulados como `²` e `①`.
/// - Caso contrário, cada dígito decimal (Nd) vira `8` e o resto fica intacto.
///
/// # Exemplo
/// ```rust
/// use nlu_models::text::mask_numerics;
///
/// assert_eq!(mask_numerics("123"), "#NUM");
/// assert_eq!(mask_numerics("a1b2"), "a8b8");
/// assert_eq!(mask_numerics("12:30"), "88:88");
/// ```
pub fn mask_numerics(token: &str) -> String {
    if ALL_DIGITS.is_match(token) {
        NUMERIC_TOKEN.to_string()
    } else {
        DIGIT.replace_all(token, "8").into_owned()
    }
}

/// Monta um n-grama de `length` tokens a partir de `start`, unidos por espaço.
///
/// Qualquer índice fora de `[0, tokens.len())` é substituído por [`OUT_OF_BOUNDS_TOKEN`],
/// então `start` pode ser negativo e a janela pode passar do fim da sequência.
///
/// # Exemplo
/// ```rust
/// use nlu_models::text::get_ngram;
///
/// let tokens = ["a", "b", "c"];
/// assert_eq!(get_ngram(&tokens, -1, 2), "<$> a");
/// assert_eq!(get_ngram(&tokens, 2, 2), "c <$>");
/// ```
pub fn get_ngram<S: AsRef<str>>(tokens: &[S], start: isize, length: usize) -> String {
    (start..start + length as isize)
        .map(|index| {
            usize::try_from(index)
                .ok()
                .and_then(|i| tokens.get(i))
                .map(AsRef::as_ref)
                .unwrap_or(OUT_OF_BOUNDS_TOKEN)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Gera todos os n-gramas contíguos de tamanho 1 até `max_length` (inclusive).
///
/// A ordem é por tamanho e depois por posição: para `["a", "b", "c"]` com
/// `max_length = 2` o resultado é `["a", "b", "c", "a b", "b c"]`.
pub fn iterate_ngrams<S: AsRef<str>>(tokens: &[S], max_length: usize) -> Vec<String> {
    let mut ngrams = Vec::new();
    for length in 1..=max_length.min(tokens.len()) {
        for window in tokens.windows(length) {
            let ngram: Vec<&str> = window.iter().map(AsRef::as_ref).collect();
            ngrams.push(ngram.join(" "));
        }
    }
    ngrams
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_all_digits() {
        assert_eq!(mask_numerics("123"), "#NUM");
        assert_eq!(mask_numerics("0"), "#NUM");
    }

    #[test]
    fn test_mask_mixed_tokens() {
        assert_eq!(mask_numerics("a1b2"), "a8b8");
        assert_eq!(mask_numerics("abc"), "abc");
        assert_eq!(mask_numerics("3.14"), "8.88");
        assert_eq!(mask_numerics("-5"), "-8");
    }

    #[test]
    fn test_mask_empty_token() {
        assert_eq!(mask_numerics(""), "");
    }

    #[test]
    fn test_mask_unicode_digits() {
        // Dígitos arábico-índicos também são Nd
        assert_eq!(mask_numerics("٣٤"), "#NUM");
        assert_eq!(mask_numerics("x٣"), "x8");
    }

    #[test]
    fn test_mask_superscript_and_circled_digits() {
        assert_eq!(mask_numerics("²"), "#NUM");
        assert_eq!(mask_numerics("①"), "#NUM");
        assert_eq!(mask_numerics("1²"), "#NUM");
        assert_eq!(mask_numerics("₀₉"), "#NUM");
        // Fora de Nd: não são trocados por 8
        assert_eq!(mask_numerics("x²"), "x²");
        // Frações não são dígitos
        assert_eq!(mask_numerics("½"), "½");
    }

    #[test]
    fn test_ngram_out_of_bounds() {
        let tokens = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(get_ngram(&tokens, -1, 2), "<$> a");
        assert_eq!(get_ngram(&tokens, 2, 2), "c <$>");
        assert_eq!(get_ngram(&tokens, 0, 3), "a b c");
        assert_eq!(get_ngram(&tokens, -5, 2), "<$> <$>");
    }

    #[test]
    fn test_ngram_zero_length() {
        let tokens = ["a"];
        assert_eq!(get_ngram(&tokens, 0, 0), "");
    }

    #[test]
    fn test_iterate_ngrams() {
        let tokens = ["a", "b", "c"];
        assert_eq!(iterate_ngrams(&tokens, 2), vec!["a", "b", "c", "a b", "b c"]);
        assert_eq!(iterate_ngrams(&tokens, 10).len(), 6);
        assert!(iterate_ngrams(&tokens, 0).is_empty());
    }
}
