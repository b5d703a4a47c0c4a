//! Detokenizer
//!
//! Converts a token stream back into source text. Every token carries its exact text, so with
//! trivia retained the output is the tokenized source (or window) byte for byte. This is the
//! round-trip check behind the lexer's coverage tests:
//!
//! ```ignore
//! let tokens = tokenize(source, &config, None);
//! assert_eq!(detokenize(&tokens), source);
//! ```

use crate::synkit::token::Token;

/// Concatenate the text of `tokens`
pub fn detokenize(tokens: &[Token]) -> String {
    let mut result = String::with_capacity(tokens.iter().map(|t| t.text.len()).sum());
    for token in tokens {
        result.push_str(&token.text);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synkit::lexing::{tokenize, LexerConfig};

    #[test]
    fn test_detokenize_round_trip() {
        let source = "val s = \"sum: ${ a + b }\" // done\r\n\tx = 0x1F\n";
        let tokens = tokenize(source, &LexerConfig::c_like(), None);
        assert_eq!(detokenize(&tokens), source);
    }

    #[test]
    fn test_detokenize_with_errors() {
        let source = "a @ \"open\n/* never";
        let tokens = tokenize(source, &LexerConfig::c_like(), None);
        assert_eq!(detokenize(&tokens), source);
    }

    #[test]
    fn test_detokenize_without_trivia() {
        let config = LexerConfig::c_like().with_trivia(false, false);
        let tokens = tokenize("a + b // c", &config, None);
        assert_eq!(detokenize(&tokens), "a+b");
    }
}
