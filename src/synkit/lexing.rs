//! Lexer
//!
//! This module turns source text into the flat token stream every later stage works on.
//!
//! Structure:
//!     The tokenizer is a hand-written scanner driven by a runtime [`LexerConfig`], so one
//!     engine serves every DSL built on the toolkit. The config is compiled into match tables
//!     once per call; the scanner then walks the source a single time.
//!
//!     - `config`: the [`LexerConfig`] data, presets, loading and validation
//!     - `scanner`: the main rules loop, whitespace, comments, identifiers and keywords
//!     - `strings`: string and char literals, including `$name` and `${…}` interpolation
//!     - `numbers`: integer and floating point literals
//!
//! Contract
//!
//!     `tokenize` is total, terminating, deterministic and pure:
//!
//!     - Tokens are contiguous and non-overlapping. With trivia retained, concatenating the
//!       token texts reproduces the scanned text exactly.
//!     - The last token is always exactly one zero-width `Eof`.
//!     - Nothing the scanner cannot classify is lost: it becomes an `Error` token covering
//!       the offending text, and scanning continues.
//!
//! Rule Priority
//!
//!     At each position, in order: whitespace and linebreaks, comments, string and char
//!     delimiters, numbers (prefixed bases before decimal), punctuation (longest match),
//!     operators (longest match), identifier or keyword, and finally a one-character `Error`.

mod config;
mod numbers;
mod scanner;
mod strings;

pub use config::{BlockComment, ConfigError, LexerConfig};

use crate::synkit::token::Token;
use scanner::Scanner;
use std::ops::Range;

/// Tokenize `source`, or only the `range` window of it.
///
/// Tokens always carry absolute offsets into `source`. A window is clamped to the source
/// and its ends are moved back onto character boundaries; the `Eof` token sits at the
/// window's end.
pub fn tokenize(source: &str, config: &LexerConfig, range: Option<Range<usize>>) -> Vec<Token> {
    let (start, end) = match range {
        Some(range) => {
            let end = floor_char_boundary(source, range.end);
            let start = floor_char_boundary(source, range.start).min(end);
            (start, end)
        }
        None => (0, source.len()),
    };
    Scanner::new(source, config, start, end).run()
}

fn floor_char_boundary(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synkit::token::TokenType;

    #[test]
    fn test_empty_source_is_just_eof() {
        let tokens = tokenize("", &LexerConfig::c_like(), None);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenType::Eof);
        assert!(tokens[0].range.is_empty());
    }

    #[test]
    fn test_sub_range_uses_absolute_offsets() {
        let source = "val a = 1\nval b = 2\n";
        let tokens = tokenize(source, &LexerConfig::c_like(), Some(10..19));

        assert_eq!(tokens[0].text, "val");
        assert_eq!(tokens[0].range.start, 10);
        assert_eq!(tokens[2].text, "b");
        assert_eq!(tokens[2].range.start, 14);

        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind, TokenType::Eof);
        assert_eq!(eof.range.start, 19);
    }

    #[test]
    fn test_sub_range_is_clamped() {
        let source = "ab";
        let tokens = tokenize(source, &LexerConfig::c_like(), Some(1..100));
        assert_eq!(tokens[0].text, "b");
        assert_eq!(tokens[1].range.start, 2);

        // Reversed window collapses to empty
        let tokens = tokenize(source, &LexerConfig::c_like(), Some(2..1));
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].range.start, 1);
    }

    #[test]
    fn test_sub_range_snaps_to_char_boundaries() {
        // 'é' occupies bytes 1..3
        let source = "aéb";
        let tokens = tokenize(source, &LexerConfig::c_like(), Some(2..4));
        assert_eq!(tokens[0].text, "éb");
        assert_eq!(tokens[0].range.start, 1);
    }

    #[test]
    fn test_greedy_operator_and_keyword_case() {
        let tokens = tokenize("x += Fun fun", &LexerConfig::c_like(), None);
        assert_eq!(tokens[2].kind, TokenType::Operator);
        assert_eq!(tokens[2].text, "+=");
        assert_eq!(tokens[4].kind, TokenType::Identifier);
        assert_eq!(tokens[6].kind, TokenType::Keyword);
    }

    #[test]
    fn test_dropping_trivia() {
        let config = LexerConfig::c_like().with_trivia(false, false);
        let tokens = tokenize("a  // c\n b", &config, None);
        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::Identifier,
                TokenType::Linebreak,
                TokenType::Identifier,
                TokenType::Eof
            ]
        );
    }
}
