//! Main module for synkit library functionality
//!
//! The pipeline runs one way:
//!
//! ```text
//! text ──tokenize──▶ tokens ──grammar + ParserSession──▶ ParseResult ──TreeBuilder──▶ SyntaxNode
//! ```
//!
//! - [`lexing`]: the configurable tokenizer
//! - [`parsing`]: the marker session grammars are written against, and the Pratt engine
//! - [`building`]: syntax tree types, the element registry and the tree builder
//! - [`diagnostics`], [`formats`], [`trace`]: reporting, rendering and tracing
//! - [`testing`]: factories, fluent tree assertions and a reference grammar

pub mod building;
pub mod diagnostics;
pub mod formats;
pub mod lexing;
pub mod parsing;
pub mod range;
pub mod testing;
pub mod token;
pub mod trace;

pub use building::{
    build, BuildAnomaly, BuildOptions, BuildOutput, ElementRegistry, NodeKind, SyntaxElement,
    SyntaxNode, TreeBuilder,
};
pub use lexing::{tokenize, LexerConfig};
pub use parsing::{
    CompletedMarker, ElementKind, Marker, ParseError, ParseResult, ParserSession,
    RollbackPolicy, SessionOptions,
};
pub use range::TextRange;
pub use token::{Token, TokenType};
