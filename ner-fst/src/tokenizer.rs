//! # Tokenizador
//!
//! Divide o texto bruto em tokens separados por espaço em branco. Cada token é
//! aparado da pontuação de frase que o envolve (ponto final, vírgula,
//! parênteses, aspas...), mas a pontuação **interna** é preservada: o
//! transdutor precisa ver `"2024.12.10"`, `"3,14"` e `"06-30/123-4567"` inteiros.
//!
//! Como os offsets apontam para o texto original, o pipeline recupera a
//! pontuação interna de uma entidade de vários tokens
//! (`"1051 Budapest, Fő utca 12"`).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use ner_fst::tokenizer::tokenize;
//!
//! let tokens = tokenize("Kovács János (kj@example.com) lakik.");
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, vec!["Kovács", "János", "kj@example.com", "lakik"]);
//! ```

use serde::{Deserialize, Serialize};

/// Um token extraído do texto original.
///
/// Mantém a posição exata no texto (`start`/`end`), usada para destacar as
/// entidades na interface sem alterar a formatação original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// O texto do token, já aparado
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
}

/// Pontuação removida das bordas de cada token
fn is_edge_punctuation(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | '!' | '?' | ';' | ':' | '(' | ')' | '[' | ']' | '"' | '\'' | '„' | '”' | '“' | '«' | '»'
    )
}

/// Tokeniza um texto por espaços em branco.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;

    for (pos, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = word_start.take() {
                push_trimmed(&mut tokens, text, start, pos);
            }
        } else if word_start.is_none() {
            word_start = Some(pos);
        }
    }
    if let Some(start) = word_start {
        push_trimmed(&mut tokens, text, start, text.len());
    }

    tokens
}

/// Apara a pontuação das bordas e adiciona o token (se sobrar algo)
fn push_trimmed(tokens: &mut Vec<Token>, text: &str, start: usize, end: usize) {
    let raw = &text[start..end];
    let trimmed_front = raw.trim_start_matches(is_edge_punctuation);
    let trimmed = trimmed_front.trim_end_matches(is_edge_punctuation);
    if trimmed.is_empty() {
        return;
    }
    let token_start = start + (raw.len() - trimmed_front.len());
    tokens.push(Token {
        text: trimmed.to_string(),
        start: token_start,
        end: token_start + trimmed.len(),
        index: tokens.len(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_whitespace() {
        let tokens = tokenize("  Kovács   János\tlakik\n");
        assert_eq!(texts(&tokens), vec!["Kovács", "János", "lakik"]);
        assert_eq!(tokens[2].index, 2);
    }

    #[test]
    fn test_trailing_dot_stripped() {
        let tokens = tokenize("Dátum: 2024.12.10.");
        assert_eq!(texts(&tokens), vec!["Dátum", "2024.12.10"]);
    }

    #[test]
    fn test_internal_punctuation_kept() {
        let tokens = tokenize("hívj: 06-30/123-4567, vagy írj kovacs.janos@example.com!");
        assert_eq!(
            texts(&tokens),
            vec!["hívj", "06-30/123-4567", "vagy", "írj", "kovacs.janos@example.com"]
        );
    }

    #[test]
    fn test_decimal_comma_kept() {
        let tokens = tokenize("pi értéke 3,14, nem 3.");
        assert_eq!(texts(&tokens), vec!["pi", "értéke", "3,14", "nem", "3"]);
    }

    #[test]
    fn test_offsets_point_into_original() {
        let text = "(Nagy Éva) él.";
        let tokens = tokenize(text);
        assert_eq!(texts(&tokens), vec!["Nagy", "Éva", "él"]);
        for token in &tokens {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn test_punctuation_only_dropped() {
        let tokens = tokenize("... ! ?");
        assert!(tokens.is_empty());
        assert!(tokenize("").is_empty());
    }
}
