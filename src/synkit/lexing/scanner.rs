//! The scanner state machine
//!
//! A [`Scanner`] walks the source once, left to right, and appends tokens. At every position
//! the rules are tried in a fixed priority order (see [`Scanner::scan_token`]); each rule
//! consumes at least one character, so scanning always terminates. String and numeric
//! literals have their own sub-machines in the sibling `strings` and `numbers` modules.

use crate::synkit::lexing::config::{LexerConfig, Rules};
use crate::synkit::range::TextRange;
use crate::synkit::token::{Token, TokenType};

/// Nesting limit for `${…}` blocks; deeper openers are scanned as plain string content
pub(crate) const MAX_INTERPOLATION_DEPTH: usize = 128;

pub(crate) struct Scanner<'s, 'c> {
    pub(crate) source: &'s str,
    pub(crate) pos: usize,
    pub(crate) end: usize,
    pub(crate) rules: Rules<'c>,
    pub(crate) tokens: Vec<Token>,
    /// Current `${…}` nesting
    pub(crate) interpolation_depth: usize,
}

impl<'s, 'c> Scanner<'s, 'c> {
    pub(crate) fn new(source: &'s str, config: &'c LexerConfig, start: usize, end: usize) -> Self {
        Self {
            source,
            pos: start,
            end,
            rules: Rules::compile(config),
            tokens: Vec::new(),
            interpolation_depth: 0,
        }
    }

    pub(crate) fn config(&self) -> &'c LexerConfig {
        self.rules.config
    }

    /// Scan everything up to the end of the window and terminate with `Eof`
    pub(crate) fn run(mut self) -> Vec<Token> {
        self.scan_code(false, false);
        self.tokens.push(Token::eof(self.end));
        self.tokens
    }

    /// The unscanned remainder of the window
    pub(crate) fn rest(&self) -> &'s str {
        &self.source[self.pos..self.end]
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub(crate) fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub(crate) fn at_linebreak(&self) -> bool {
        matches!(self.peek(), Some('\n') | Some('\r'))
    }

    /// Append a token covering `start..end`, honoring the trivia retention flags
    pub(crate) fn push(&mut self, kind: TokenType, start: usize, end: usize) {
        let config = self.config();
        let dropped = match kind {
            TokenType::Whitespace => !config.retain_whitespace,
            TokenType::Comment => !config.retain_comments,
            _ => false,
        };
        if dropped {
            return;
        }
        self.tokens.push(Token::new(
            kind,
            &self.source[start..end],
            TextRange::new(start, end),
        ));
    }

    /// Main rules loop.
    ///
    /// Outside strings this runs to the end of the window. Inside a `${…}` block it stops in
    /// front of the `}` that balances the block and returns true. Reaching the end of the
    /// window first returns false, and so does a linebreak when `line_bound` is set (a block
    /// inside a single-line string), leaving the cursor on the linebreak.
    pub(crate) fn scan_code(&mut self, in_block: bool, line_bound: bool) -> bool {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            if in_block {
                match c {
                    '}' if depth == 0 => return true,
                    '}' => depth -= 1,
                    '{' => depth += 1,
                    '\n' | '\r' if line_bound => return false,
                    _ => {}
                }
            }
            self.scan_token(c);
        }
        false
    }

    /// Scan one token starting with `c`. Rule priority:
    ///
    /// 1. whitespace / linebreak
    /// 2. comments
    /// 3. string and char literals
    /// 4. numbers
    /// 5. punctuation (longest match)
    /// 6. operators (longest match)
    /// 7. identifiers and keywords
    /// 8. a one-character `Error`
    fn scan_token(&mut self, c: char) {
        let start = self.pos;

        if c == '\n' || c == '\r' {
            self.bump();
            if c == '\r' && self.peek() == Some('\n') {
                self.bump();
            }
            self.push(TokenType::Linebreak, start, self.pos);
            return;
        }
        if c.is_whitespace() {
            while matches!(self.peek(), Some(w) if w.is_whitespace() && w != '\n' && w != '\r') {
                self.bump();
            }
            self.push(TokenType::Whitespace, start, self.pos);
            return;
        }

        if self.scan_comment() {
            return;
        }

        if self.scan_string_start() {
            return;
        }

        if c.is_ascii_digit() {
            self.scan_number();
            return;
        }

        let rest = self.rest();
        if let Some(punct) = self.rules.match_punctuation(rest) {
            self.pos += punct.len();
            self.push(TokenType::Punctuation, start, self.pos);
            return;
        }
        if let Some(op) = self.rules.match_operator(rest) {
            self.pos += op.len();
            self.push(TokenType::Operator, start, self.pos);
            return;
        }

        if self.rules.is_identifier_start(c) {
            self.scan_identifier();
            return;
        }

        self.bump();
        self.push(TokenType::Error, start, self.pos);
    }

    /// Scan a line or block comment if one starts here
    fn scan_comment(&mut self) -> bool {
        let start = self.pos;
        let rest = self.rest();
        let config = self.config();

        let line = config
            .line_comments
            .iter()
            .filter(|opener| !opener.is_empty() && rest.starts_with(opener.as_str()))
            .max_by_key(|opener| opener.len());
        let block = config
            .block_comments
            .iter()
            .filter(|c| !c.start.is_empty() && rest.starts_with(c.start.as_str()))
            .max_by_key(|c| c.start.len());

        match (line, block) {
            (Some(line), Some(block)) if block.start.len() > line.len() => {
                self.scan_block_comment(&block.start, &block.end)
            }
            (Some(_), _) => {
                while self.peek().is_some() && !self.at_linebreak() {
                    self.bump();
                }
                self.push(TokenType::Comment, start, self.pos);
            }
            (None, Some(block)) => self.scan_block_comment(&block.start, &block.end),
            (None, None) => return false,
        }
        true
    }

    fn scan_block_comment(&mut self, opener: &str, closer: &str) {
        let start = self.pos;
        self.pos += opener.len();
        match self.rest().find(closer) {
            Some(offset) => {
                self.pos += offset + closer.len();
                self.push(TokenType::Comment, start, self.pos);
            }
            None => {
                // Unterminated: the rest of the window is one error
                self.pos = self.end;
                self.push(TokenType::Error, start, self.pos);
            }
        }
    }

    /// Scan an identifier run and classify it against the keyword sets
    pub(crate) fn scan_identifier(&mut self) {
        let start = self.pos;
        self.bump();
        while matches!(self.peek(), Some(c) if self.rules.is_identifier_part(c)) {
            self.bump();
        }
        let word = &self.source[start..self.pos];
        let kind = if self.rules.is_keyword(word) {
            TokenType::Keyword
        } else {
            TokenType::Identifier
        };
        self.push(kind, start, self.pos);
    }
}
