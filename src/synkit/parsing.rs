//! Parsing
//!
//! Grammars do not build trees. They walk the token stream with a [`ParserSession`] and
//! record *markers*: a marker is opened at the cursor, and later completed with an element
//! kind (covering every token consumed in between), dropped, or rolled back. Errors are
//! reported on the side, independent of markers. The session's output, a [`ParseResult`], is
//! plain data that the [building](crate::synkit::building) stage turns into a tree.
//!
//! ```rust,ignore
//! let m = s.mark();
//! s.expect("let");
//! s.expect(TokenType::Identifier);
//! s.expect("=");
//! grammar.parse_expression(&mut s, 0);
//! m.done(&mut s, Kind::Let);
//! ```
//!
//! Wrapping after the fact
//!
//!     A completed marker can be *preceded*: [`CompletedMarker::precede`] opens a new marker
//!     that starts where the completed one starts. This is how binary expressions wrap an
//!     already parsed left operand. The wrapper records the id of the marker it precedes, so
//!     the builder can nest the two even when their ranges are identical.
//!
//! Speculation
//!
//!     [`Marker::rollback_to`] resets the cursor to where the marker was opened and discards
//!     every marker completed since. Errors reported during the attempt are kept by default;
//!     see [`RollbackPolicy`].
//!
//! Expressions
//!
//!     The [`pratt`] module layers an operator-precedence expression parser on the marker API.

mod error;
mod marker;
pub mod pratt;
mod session;

pub use error::ParseError;
pub use marker::{CompletedMarker, Marker};
pub use session::{
    Expected, ParseResult, ParserSession, RollbackPolicy, SessionOptions,
    DEFAULT_MAX_EXPRESSION_DEPTH,
};

use std::fmt::Debug;
use std::hash::Hash;

/// The element kinds of a grammar, usually a fieldless enum.
///
/// Implemented for every type with the required bounds.
pub trait ElementKind: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> ElementKind for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}
