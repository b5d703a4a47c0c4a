//! Token types
//!
//!     A token is the minimal lexical unit: a type from a fixed taxonomy, the exact source
//!     text it covers and its range. The taxonomy is shared by every grammar built on this
//!     toolkit; grammars distinguish their own keywords, operators and punctuation by text.
//!
//!     Types print in dotted form, e.g. `Literal.Integer.Hex` or
//!     `Literal.String.Interp.BlockStart`.

use crate::synkit::range::TextRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    Whitespace,
    Linebreak,
    Comment,
    Identifier,
    Keyword,
    Punctuation,
    Operator,
    Literal(LiteralKind),
    Error,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralKind {
    Integer(IntegerBase),
    FloatingPoint(FloatKind),
    Char,
    String(StringPart),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegerBase {
    Dec,
    Hex,
    Bin,
    Oct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatKind {
    Float,
    Double,
}

/// The pieces a string literal is split into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringPart {
    /// Opening delimiter of a single-line string
    SlStart,
    /// Closing delimiter of a single-line string
    SlEnd,
    /// Opening delimiter of a multi-line string
    MlStart,
    /// Closing delimiter of a multi-line string
    MlEnd,
    ContentBasic,
    /// An escape character and the character it escapes
    ContentEscaped,
    /// The `$` of a `$name` interpolation
    InterpSingle,
    /// `${`
    InterpBlockStart,
    /// The `}` closing an interpolation block
    InterpBlockEnd,
}

impl TokenType {
    /// Whitespace and comments: semantically insignificant but kept for exact reconstruction.
    ///
    /// Linebreaks are not trivia; line-oriented grammars use them as statement boundaries.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenType::Whitespace | TokenType::Comment)
    }

    pub fn is_literal(self) -> bool {
        matches!(self, TokenType::Literal(_))
    }

    /// True for the pieces of a string literal, including interpolation markers
    pub fn is_string_part(self) -> bool {
        matches!(self, TokenType::Literal(LiteralKind::String(_)))
    }

    pub fn is_number(self) -> bool {
        matches!(
            self,
            TokenType::Literal(LiteralKind::Integer(_) | LiteralKind::FloatingPoint(_))
        )
    }

    // Shorthands used heavily by configs and tests
    pub const DEC: TokenType = TokenType::Literal(LiteralKind::Integer(IntegerBase::Dec));
    pub const HEX: TokenType = TokenType::Literal(LiteralKind::Integer(IntegerBase::Hex));
    pub const BIN: TokenType = TokenType::Literal(LiteralKind::Integer(IntegerBase::Bin));
    pub const OCT: TokenType = TokenType::Literal(LiteralKind::Integer(IntegerBase::Oct));
    pub const FLOAT: TokenType = TokenType::Literal(LiteralKind::FloatingPoint(FloatKind::Float));
    pub const DOUBLE: TokenType =
        TokenType::Literal(LiteralKind::FloatingPoint(FloatKind::Double));
    pub const CHAR: TokenType = TokenType::Literal(LiteralKind::Char);

    pub const fn string(part: StringPart) -> TokenType {
        TokenType::Literal(LiteralKind::String(part))
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Whitespace => write!(f, "Whitespace"),
            TokenType::Linebreak => write!(f, "Linebreak"),
            TokenType::Comment => write!(f, "Comment"),
            TokenType::Identifier => write!(f, "Identifier"),
            TokenType::Keyword => write!(f, "Keyword"),
            TokenType::Punctuation => write!(f, "Punctuation"),
            TokenType::Operator => write!(f, "Operator"),
            TokenType::Literal(kind) => write!(f, "Literal.{}", kind),
            TokenType::Error => write!(f, "Error"),
            TokenType::Eof => write!(f, "Eof"),
        }
    }
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralKind::Integer(base) => write!(f, "Integer.{:?}", base),
            LiteralKind::FloatingPoint(kind) => write!(f, "FloatingPoint.{:?}", kind),
            LiteralKind::Char => write!(f, "Char"),
            LiteralKind::String(part) => {
                let name = match part {
                    StringPart::SlStart => "SlStart",
                    StringPart::SlEnd => "SlEnd",
                    StringPart::MlStart => "MlStart",
                    StringPart::MlEnd => "MlEnd",
                    StringPart::ContentBasic => "Content.Basic",
                    StringPart::ContentEscaped => "Content.Escaped",
                    StringPart::InterpSingle => "Interp.Single",
                    StringPart::InterpBlockStart => "Interp.BlockStart",
                    StringPart::InterpBlockEnd => "Interp.BlockEnd",
                };
                write!(f, "String.{}", name)
            }
        }
    }
}

/// A token: type, source text and range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenType,
    pub text: String,
    pub range: TextRange,
}

impl Token {
    pub fn new(kind: TokenType, text: impl Into<String>, range: TextRange) -> Self {
        Self {
            kind,
            text: text.into(),
            range,
        }
    }

    /// The zero-width end-of-input token
    pub fn eof(offset: usize) -> Self {
        Self::new(TokenType::Eof, "", TextRange::empty(offset))
    }

    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}@{}", self.kind, self.text, self.range)
    }
}
