//! Fluent assertion API for syntax trees
//!
//!     Tests that walk a tree by hand are verbose and tend to check only counts. This API
//!     verifies shape and content together and reads like the tree it describes:
//!
//!     ```rust,ignore
//!     assert_tree(&out.root)
//!         .is_root()
//!         .child_count(1)
//!         .child(0, |stmt| {
//!             stmt.element(CalcKind::ExprStmt).child(0, |add| {
//!                 add.element(CalcKind::Add)
//!                     .text("a + b")
//!                     .leaf_texts(&["+"])
//!                     .child(1, |b| b.element(CalcKind::Name).text("b"))
//!             })
//!         });
//!     ```
//!
//!     `child_count` and `child` look at child *nodes* only; token leaves are checked with
//!     `leaf_texts` (significant tokens) or `text` (everything below the node).

use crate::synkit::building::{NodeKind, SyntaxNode};
use crate::synkit::parsing::ElementKind;

/// Create an assertion builder for a tree (or any subtree)
pub fn assert_tree<K: ElementKind>(node: &SyntaxNode<K>) -> NodeAssertion<'_, K> {
    NodeAssertion {
        node,
        context: node.kind().to_string(),
    }
}

pub struct NodeAssertion<'a, K> {
    node: &'a SyntaxNode<K>,
    context: String,
}

impl<'a, K: ElementKind> NodeAssertion<'a, K> {
    pub fn is_root(self) -> Self {
        assert!(
            matches!(self.node.kind(), NodeKind::Root),
            "{}: Expected Root, found {}",
            self.context,
            self.node.kind()
        );
        self
    }

    pub fn element(self, kind: K) -> Self {
        assert_eq!(
            self.node.element_kind(),
            Some(kind),
            "{}: Expected element {:?}, found {}",
            self.context,
            kind,
            self.node.kind()
        );
        self
    }

    pub fn is_error(self) -> Self {
        assert!(
            self.node.is_error(),
            "{}: Expected an error node, found {}",
            self.context,
            self.node.kind()
        );
        self
    }

    pub fn error_message(self, expected: &str) -> Self {
        assert_eq!(
            self.node.error_message(),
            Some(expected),
            "{}: Error message mismatch",
            self.context
        );
        self
    }

    pub fn range(self, start: usize, end: usize) -> Self {
        let range = self.node.range();
        assert_eq!(
            (range.start, range.end),
            (start, end),
            "{}: Expected range {}..{}, found {}",
            self.context,
            start,
            end,
            range
        );
        self
    }

    /// The concatenated text of every token below the node
    pub fn text(self, expected: &str) -> Self {
        let actual = self.node.text();
        assert_eq!(actual, expected, "{}: Text mismatch", self.context);
        self
    }

    /// The texts of the node's own significant token leaves
    pub fn leaf_texts(self, expected: &[&str]) -> Self {
        let actual: Vec<&str> = self
            .node
            .children()
            .iter()
            .filter_map(|c| c.as_token())
            .filter(|t| !t.is_trivia())
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(actual, expected, "{}: Leaf token mismatch", self.context);
        self
    }

    pub fn valid(self) -> Self {
        let errors: Vec<String> = self
            .node
            .errors()
            .iter()
            .map(|e| format!("{}@{}", e.kind(), e.range()))
            .collect();
        assert!(
            errors.is_empty(),
            "{}: Expected no error nodes, found [{}]",
            self.context,
            errors.join(", ")
        );
        self
    }

    pub fn invalid(self) -> Self {
        assert!(
            self.node.contains_error(),
            "{}: Expected at least one error node",
            self.context
        );
        self
    }

    /// Number of child nodes
    pub fn child_count(self, expected: usize) -> Self {
        let kinds: Vec<String> = self.node.child_nodes().map(|n| n.kind().to_string()).collect();
        assert_eq!(
            kinds.len(),
            expected,
            "{}: Expected {} child nodes, found {}: [{}]",
            self.context,
            expected,
            kinds.len(),
            kinds.join(", ")
        );
        self
    }

    /// Run assertions on the `index`th child node
    pub fn child<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a, K>) -> NodeAssertion<'a, K>,
    {
        let count = self.node.child_nodes().count();
        let Some(child) = self.node.child_nodes().nth(index) else {
            panic!(
                "{}: Child index {} out of bounds ({} child nodes)",
                self.context, index, count
            );
        };
        assertion(NodeAssertion {
            node: child,
            context: format!("{}[{}]:{}", self.context, index, child.kind()),
        });
        self
    }

    /// Assert that some descendant of `kind` exists and run assertions on the first one
    pub fn find<F>(self, kind: K, assertion: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a, K>) -> NodeAssertion<'a, K>,
    {
        let node: &'a SyntaxNode<K> = self.node;
        let Some(found) = node.find_all(kind).into_iter().next() else {
            panic!("{}: No descendant of kind {:?}", self.context, kind);
        };
        assertion(NodeAssertion {
            node: found,
            context: format!("{}/..{:?}", self.context, kind),
        });
        self
    }
}
