//! The parse session
//!
//!     A [`ParserSession`] owns the token stream, a cursor into it, the marker arena and the
//!     error list. Every operation is total: moving past `Eof` is a no-op, and a failed
//!     expectation records an error instead of failing.
//!
//!     The cursor never skips trivia on its own. Operations that look for a significant token
//!     ([`ParserSession::expect`], [`ParserSession::eat`], [`ParserSession::at`],
//!     [`ParserSession::nth`]) say so in their docs; everything else sees the raw stream.

use crate::synkit::lexing::{tokenize, LexerConfig};
use crate::synkit::parsing::error::ParseError;
use crate::synkit::parsing::marker::{CompletedMarker, Marker};
use crate::synkit::parsing::ElementKind;
use crate::synkit::token::{Token, TokenType};
use crate::synkit::trace::{NoopTracer, TraceEvent, Tracer};
use std::fmt;

/// What happens to errors reported during an attempt that is rolled back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollbackPolicy {
    /// Errors stay reported
    #[default]
    KeepErrors,
    /// Errors reported since the marker was opened are removed
    RetractErrors,
}

/// Default for [`SessionOptions::max_expression_depth`]
pub const DEFAULT_MAX_EXPRESSION_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub rollback_policy: RollbackPolicy,
    /// How many expressions may be open inside one another. Deeper input is reported as
    /// an error instead of growing the call stack.
    pub max_expression_depth: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            rollback_policy: RollbackPolicy::default(),
            max_expression_depth: DEFAULT_MAX_EXPRESSION_DEPTH,
        }
    }
}

/// A token a grammar expects: by text (`"let"`, `"+="`) or by type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected<'a> {
    Text(&'a str),
    Kind(TokenType),
}

impl Expected<'_> {
    /// Text matches only keywords, identifiers, operators and punctuation, never the
    /// inside of a literal
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            Expected::Text(text) => {
                matches!(
                    token.kind,
                    TokenType::Keyword
                        | TokenType::Identifier
                        | TokenType::Operator
                        | TokenType::Punctuation
                ) && token.text == *text
            }
            Expected::Kind(kind) => token.kind == *kind,
        }
    }
}

impl<'a> From<&'a str> for Expected<'a> {
    fn from(text: &'a str) -> Self {
        Expected::Text(text)
    }
}

impl From<TokenType> for Expected<'_> {
    fn from(kind: TokenType) -> Self {
        Expected::Kind(kind)
    }
}

impl fmt::Display for Expected<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Text(text) => write!(f, "'{}'", text),
            Expected::Kind(kind) => write!(f, "{}", kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Open,
    Completed,
    Dropped,
    RolledBack,
}

/// Everything a session produced: the input to the tree builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult<K> {
    pub tokens: Vec<Token>,
    pub completed_markers: Vec<CompletedMarker<K>>,
    pub errors: Vec<ParseError>,
}

/// Cursor, marker arena and error list for one parse
pub struct ParserSession<K> {
    tokens: Vec<Token>,
    pos: usize,
    slots: Vec<SlotState>,
    completed: Vec<CompletedMarker<K>>,
    errors: Vec<ParseError>,
    options: SessionOptions,
    expression_depth: usize,
    tracer: Box<dyn Tracer>,
}

impl<K: ElementKind> ParserSession<K> {
    /// Start a session over `tokens`. An `Eof` token is appended if the stream lacks one.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_options(tokens, SessionOptions::default())
    }

    pub fn with_options(mut tokens: Vec<Token>, options: SessionOptions) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenType::Eof) {
            let end = tokens.last().map_or(0, |t| t.range.end);
            tokens.push(Token::eof(end));
        }
        Self {
            tokens,
            pos: 0,
            slots: Vec::new(),
            completed: Vec::new(),
            errors: Vec::new(),
            options,
            expression_depth: 0,
            tracer: Box::new(NoopTracer),
        }
    }

    /// Tokenize `source` and start a session over the result
    pub fn from_source(source: &str, config: &LexerConfig) -> Self {
        Self::new(tokenize(source, config, None))
    }

    pub fn with_tracer(mut self, tracer: Box<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    fn trace(&mut self, event: impl FnOnce() -> TraceEvent) {
        if self.tracer.enabled() {
            self.tracer.event(event());
        }
    }

    // ----- Cursor -----

    /// Index of the current token
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The current token, trivia included
    pub fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub fn current_kind(&self) -> TokenType {
        self.peek().kind
    }

    pub fn current_text(&self) -> &str {
        &self.peek().text
    }

    /// Move to the next token. A no-op at `Eof`.
    pub fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Advance over whitespace and comments
    pub fn skip_trivia(&mut self) {
        while self.peek().is_trivia() {
            self.advance();
        }
    }

    /// The `n`th significant token at or after the cursor, without moving
    pub fn nth(&self, n: usize) -> &Token {
        self.tokens[self.pos..]
            .iter()
            .filter(|t| !t.is_trivia())
            .nth(n)
            .unwrap_or_else(|| self.eof())
    }

    fn eof(&self) -> &Token {
        // The constructor guarantees a trailing `Eof`
        &self.tokens[self.tokens.len() - 1]
    }

    /// Whether the next significant token matches
    pub fn at<'e>(&self, expected: impl Into<Expected<'e>>) -> bool {
        expected.into().matches(self.nth(0))
    }

    /// Skip trivia and consume the next token if it matches
    pub fn eat<'e>(&mut self, expected: impl Into<Expected<'e>>) -> bool {
        let expected = expected.into();
        self.skip_trivia();
        if expected.matches(self.peek()) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip trivia and consume the next token if it matches; otherwise report
    /// `expected …` at the cursor and consume nothing
    pub fn expect<'e>(&mut self, expected: impl Into<Expected<'e>>) -> bool {
        let expected = expected.into();
        if self.eat(expected) {
            return true;
        }
        self.error(format!("expected {}", expected));
        false
    }

    /// Whether only trivia remains
    pub fn is_at_end(&self) -> bool {
        self.nth(0).kind == TokenType::Eof
    }

    /// Report an error at the current token
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        let token_index = self.pos;
        let range = self.peek().range;
        self.trace(|| TraceEvent::ErrorReported {
            token_index,
            message: message.clone(),
        });
        self.errors.push(ParseError::new(token_index, message, range));
    }

    /// Statement-grain recovery: wrap everything up to the next linebreak (or `Eof`) in a
    /// marker of `error_kind`. Returns `None` if the cursor is already at a line end.
    pub fn recover_to_line_end(&mut self, error_kind: K) -> Option<CompletedMarker<K>> {
        if matches!(self.current_kind(), TokenType::Linebreak | TokenType::Eof) {
            return None;
        }
        let m = self.mark();
        while !matches!(self.current_kind(), TokenType::Linebreak | TokenType::Eof) {
            self.advance();
        }
        Some(m.done(self, error_kind))
    }

    // ----- Nesting -----

    /// Open one level of expression nesting. Returns false, leaving the depth unchanged,
    /// once `max_expression_depth` levels are open.
    pub fn enter_expression(&mut self) -> bool {
        if self.expression_depth >= self.options.max_expression_depth {
            return false;
        }
        self.expression_depth += 1;
        true
    }

    /// Close a level opened by [`ParserSession::enter_expression`]
    pub fn exit_expression(&mut self) {
        self.expression_depth = self.expression_depth.saturating_sub(1);
    }

    pub fn expression_depth(&self) -> usize {
        self.expression_depth
    }

    // ----- Markers -----

    /// Open a marker at the cursor
    pub fn mark(&mut self) -> Marker {
        let start = self.pos;
        self.open(start, None)
    }

    fn open(&mut self, start: usize, precedes: Option<usize>) -> Marker {
        let id = self.slots.len();
        self.slots.push(SlotState::Open);
        self.trace(|| TraceEvent::MarkerOpened {
            id,
            token_index: start,
        });
        Marker {
            id,
            start,
            cursor: self.pos,
            completed_len: self.completed.len(),
            errors_len: self.errors.len(),
            precedes,
        }
    }

    pub(crate) fn open_preceding(&mut self, inner: &CompletedMarker<K>) -> Marker {
        self.open(inner.start, Some(inner.id))
    }

    pub(crate) fn complete(&mut self, marker: Marker, kind: K) -> CompletedMarker<K> {
        debug_assert_eq!(
            self.slots.get(marker.id),
            Some(&SlotState::Open),
            "marker #{} is not open in this session",
            marker.id
        );
        if let Some(slot) = self.slots.get_mut(marker.id) {
            *slot = SlotState::Completed;
        }

        // A rollback of an enclosing marker may have moved the cursor before our start
        let end = self.pos.max(marker.start);
        let completed = CompletedMarker {
            id: marker.id,
            start: marker.start,
            end,
            kind,
            precedes: marker.precedes,
        };
        self.trace(|| TraceEvent::MarkerCompleted {
            id: completed.id,
            kind: format!("{:?}", kind),
            start: completed.start,
            end: completed.end,
            precedes: completed.precedes,
        });
        self.completed.push(completed);
        completed
    }

    pub(crate) fn abandon(&mut self, marker: Marker) {
        if let Some(slot) = self.slots.get_mut(marker.id) {
            *slot = SlotState::Dropped;
        }
        self.trace(|| TraceEvent::MarkerDropped { id: marker.id });
    }

    pub(crate) fn rollback(&mut self, marker: Marker) {
        if let Some(slot) = self.slots.get_mut(marker.id) {
            *slot = SlotState::RolledBack;
        }

        let keep = marker.completed_len.min(self.completed.len());
        let discarded: Vec<usize> = self
            .completed
            .drain(keep..)
            .map(|c| c.id)
            .collect();
        for id in &discarded {
            if let Some(slot) = self.slots.get_mut(*id) {
                *slot = SlotState::RolledBack;
            }
        }

        let retracted = match self.options.rollback_policy {
            RollbackPolicy::KeepErrors => 0,
            RollbackPolicy::RetractErrors => {
                let keep = marker.errors_len.min(self.errors.len());
                let retracted = self.errors.len() - keep;
                self.errors.truncate(keep);
                retracted
            }
        };

        self.pos = marker.cursor;
        self.trace(|| TraceEvent::RolledBack {
            id: marker.id,
            token_index: marker.cursor,
            markers_discarded: discarded.len(),
            errors_retracted: retracted,
        });
    }

    /// Markers opened but not yet completed, dropped or rolled back
    pub fn open_marker_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| **s == SlotState::Open)
            .count()
    }

    // ----- Results -----

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn completed_markers(&self) -> &[CompletedMarker<K>] {
        &self.completed
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// End the session. Markers still open are discarded.
    pub fn finish(self) -> ParseResult<K> {
        ParseResult {
            tokens: self.tokens,
            completed_markers: self.completed,
            errors: self.errors,
        }
    }
}
