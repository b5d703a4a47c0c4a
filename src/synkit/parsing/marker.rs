//! Markers
//!
//!     A [`Marker`] is a handle to an open slot in the session's marker arena. It is not
//!     `Copy`, and every way of closing it consumes it, so a marker cannot be completed twice.
//!     Completing it yields a [`CompletedMarker`], a plain record of the element kind and the
//!     half-open token range `[start, end)` it covers.
//!
//!     Ids are arena indices: unique within a session and increasing in the order markers
//!     were opened.

use crate::synkit::parsing::session::ParserSession;
use crate::synkit::parsing::ElementKind;

/// An open marker
#[derive(Debug)]
#[must_use = "a marker must be completed with `done`, dropped or rolled back"]
pub struct Marker {
    pub(crate) id: usize,
    /// First token index covered
    pub(crate) start: usize,
    /// Cursor when the marker was opened; where `rollback_to` returns
    pub(crate) cursor: usize,
    /// Completed marker count when opened
    pub(crate) completed_len: usize,
    /// Error count when opened
    pub(crate) errors_len: usize,
    pub(crate) precedes: Option<usize>,
}

impl Marker {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Close the marker with `kind`, covering everything up to the cursor
    pub fn done<K: ElementKind>(self, s: &mut ParserSession<K>, kind: K) -> CompletedMarker<K> {
        s.complete(self, kind)
    }

    /// Forget the marker. Tokens consumed since it was opened stay consumed.
    pub fn drop<K: ElementKind>(self, s: &mut ParserSession<K>) {
        s.abandon(self)
    }

    /// Reset the cursor to where the marker was opened and discard everything completed since
    pub fn rollback_to<K: ElementKind>(self, s: &mut ParserSession<K>) {
        s.rollback(self)
    }
}

/// A completed marker: an element kind over the token range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompletedMarker<K> {
    pub id: usize,
    pub start: usize,
    pub end: usize,
    pub kind: K,
    /// Id of the marker this one was opened to wrap, see [`CompletedMarker::precede`]
    pub precedes: Option<usize>,
}

impl<K: ElementKind> CompletedMarker<K> {
    pub fn new(id: usize, start: usize, end: usize, kind: K) -> Self {
        Self {
            id,
            start,
            end,
            kind,
            precedes: None,
        }
    }

    pub fn with_precedes(mut self, inner: usize) -> Self {
        self.precedes = Some(inner);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Open a new marker starting where this one starts, to become its parent
    pub fn precede(&self, s: &mut ParserSession<K>) -> Marker {
        s.open_preceding(self)
    }
}
