//! Building
//!
//!     The last stage of the pipeline: a [`ParseResult`] (tokens, completed markers, errors)
//!     becomes a concrete syntax tree.
//!
//!     - `tree`: [`SyntaxNode`], [`SyntaxElement`] and [`NodeKind`]
//!     - `registry`: [`ElementRegistry`], the per-kind node constructors a grammar supplies
//!     - `tree_builder`: [`TreeBuilder`] and the [`build`] entry point
//!
//!     Building never fails. Structural problems in the marker list are returned as
//!     [`BuildAnomaly`]s, and [`BuildOutput::valid`] tells whether the input parsed cleanly.

mod registry;
mod tree;
mod tree_builder;

pub use registry::{Constructor, ElementRegistry};
pub use tree::{Children, Descendants, NodeKind, SyntaxElement, SyntaxNode};
pub use tree_builder::{build, BuildAnomaly, BuildOptions, BuildOutput, TreeBuilder};

use crate::synkit::parsing::{ElementKind, ParseResult};

impl<K: ElementKind> ParseResult<K> {
    /// Build the tree for this result with default options
    pub fn build(&self, registry: &ElementRegistry<K>) -> BuildOutput<K> {
        build(
            &self.tokens,
            &self.completed_markers,
            &self.errors,
            registry,
        )
    }
}
