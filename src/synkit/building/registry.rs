//! Element registry
//!
//!     Maps a grammar's element kinds to node constructors. A constructor receives the
//!     completed marker, the already built children and the node's source range, and either
//!     returns the node or rejects the shape with a message. Kinds without a constructor get
//!     a plain element node.
//!
//!     Constructors are where a grammar enforces shape invariants the marker API cannot
//!     express ("a group must end with `)`"). A rejection, or a panic inside the constructor,
//!     never aborts the build: the builder wraps the same children in an error node instead.

use crate::synkit::building::tree::{Children, SyntaxNode};
use crate::synkit::parsing::{CompletedMarker, ElementKind};
use crate::synkit::range::TextRange;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Builds the node for one completed marker
pub type Constructor<K> = Box<
    dyn Fn(&CompletedMarker<K>, Children<K>, TextRange) -> Result<SyntaxNode<K>, String>
        + Send
        + Sync,
>;

/// Constructors keyed by element kind
pub struct ElementRegistry<K> {
    constructors: HashMap<K, Constructor<K>>,
}

impl<K: ElementKind> Default for ElementRegistry<K> {
    fn default() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }
}

impl<K: ElementKind> fmt::Debug for ElementRegistry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

impl<K: ElementKind> ElementRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the constructor for `kind`
    pub fn register<F>(&mut self, kind: K, constructor: F) -> &mut Self
    where
        F: Fn(&CompletedMarker<K>, Children<K>, TextRange) -> Result<SyntaxNode<K>, String>
            + Send
            + Sync
            + 'static,
    {
        self.constructors.insert(kind, Box::new(constructor));
        self
    }

    /// Builder-style [`ElementRegistry::register`]
    pub fn with<F>(mut self, kind: K, constructor: F) -> Self
    where
        F: Fn(&CompletedMarker<K>, Children<K>, TextRange) -> Result<SyntaxNode<K>, String>
            + Send
            + Sync
            + 'static,
    {
        self.register(kind, constructor);
        self
    }

    pub fn contains(&self, kind: K) -> bool {
        self.constructors.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Run the constructor for `marker`. Panics are caught and returned as rejections.
    pub fn construct(
        &self,
        marker: &CompletedMarker<K>,
        children: Children<K>,
        range: TextRange,
    ) -> Result<SyntaxNode<K>, String> {
        let Some(constructor) = self.constructors.get(&marker.kind) else {
            return Ok(SyntaxNode::element(marker.kind, range, children));
        };
        match catch_unwind(AssertUnwindSafe(|| {
            constructor(marker, Arc::clone(&children), range)
        })) {
            Ok(result) => result,
            Err(payload) => Err(format!(
                "constructor for {:?} panicked: {}",
                marker.kind,
                panic_message(payload.as_ref())
            )),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
