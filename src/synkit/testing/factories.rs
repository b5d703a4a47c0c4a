//! Test factories for creating tokens, markers and errors succinctly

use crate::synkit::parsing::{CompletedMarker, ElementKind, ParseError};
use crate::synkit::range::TextRange;
use crate::synkit::token::{Token, TokenType};

/// Make a single token
pub fn mk_token(kind: TokenType, text: &str, start: usize) -> Token {
    Token::new(kind, text, TextRange::new(start, start + text.len()))
}

/// Make a contiguous token stream from `(type, text)` pairs, terminated by `Eof`
pub fn mk_tokens(specs: &[(TokenType, &str)]) -> Vec<Token> {
    let mut offset = 0;
    let mut tokens: Vec<Token> = specs
        .iter()
        .map(|(kind, text)| {
            let token = mk_token(*kind, text, offset);
            offset = token.range.end;
            token
        })
        .collect();
    tokens.push(Token::eof(offset));
    tokens
}

/// Make a completed marker over token indices `[start, end)`
pub fn mk_marker<K: ElementKind>(id: usize, start: usize, end: usize, kind: K) -> CompletedMarker<K> {
    CompletedMarker::new(id, start, end, kind)
}

/// Make a parse error at a token index (with a zero-width range at that index)
pub fn mk_error(token_index: usize, message: &str) -> ParseError {
    ParseError::new(token_index, message, TextRange::empty(token_index))
}
