//! Syntax tree types
//!
//!     The tree is a lossless concrete syntax tree: internal [`SyntaxNode`]s and [`Token`]
//!     leaves, wrapped together as [`SyntaxElement`]s. Nodes are immutable once built and
//!     share their child lists through `Arc`, so cloning a subtree is cheap and every tree is
//!     `Send + Sync`.
//!
//!     Error nodes are ordinary nodes with [`NodeKind::Error`]. They appear where a
//!     constructor rejected its children, where the builder hit a structural problem, and as
//!     leaves for every reported parse error. A tree is valid when it contains none.

use crate::synkit::parsing::ElementKind;
use crate::synkit::range::TextRange;
use crate::synkit::token::Token;
use std::fmt;
use std::mem;
use std::sync::Arc;

/// Shared child list of a node
pub type Children<K> = Arc<[SyntaxElement<K>]>;

/// The kind of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind<K> {
    /// The single root covering the whole token stream
    Root,
    /// A grammar element
    Element(K),
    /// A diagnostic; `token_index` is set for reported parse errors
    Error {
        message: String,
        token_index: Option<usize>,
    },
}

impl<K: fmt::Debug> fmt::Display for NodeKind<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Root => write!(f, "Root"),
            NodeKind::Element(kind) => write!(f, "{:?}", kind),
            NodeKind::Error { message, .. } => write!(f, "Error({:?})", message),
        }
    }
}

/// A node or a token leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxElement<K> {
    Node(SyntaxNode<K>),
    Token(Token),
}

impl<K> SyntaxElement<K> {
    pub fn range(&self) -> TextRange {
        match self {
            SyntaxElement::Node(node) => node.range,
            SyntaxElement::Token(token) => token.range,
        }
    }

    pub fn as_node(&self) -> Option<&SyntaxNode<K>> {
        match self {
            SyntaxElement::Node(node) => Some(node),
            SyntaxElement::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            SyntaxElement::Node(_) => None,
            SyntaxElement::Token(token) => Some(token),
        }
    }
}

/// An internal node of the syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode<K> {
    kind: NodeKind<K>,
    range: TextRange,
    children: Children<K>,
}

impl<K: ElementKind> SyntaxNode<K> {
    pub fn new(kind: NodeKind<K>, range: TextRange, children: impl Into<Children<K>>) -> Self {
        Self {
            kind,
            range,
            children: children.into(),
        }
    }

    /// A grammar element node
    pub fn element(kind: K, range: TextRange, children: impl Into<Children<K>>) -> Self {
        Self::new(NodeKind::Element(kind), range, children)
    }

    /// An error node wrapping `children`
    pub fn error(
        message: impl Into<String>,
        range: TextRange,
        children: impl Into<Children<K>>,
    ) -> Self {
        Self::new(
            NodeKind::Error {
                message: message.into(),
                token_index: None,
            },
            range,
            children,
        )
    }

    pub fn kind(&self) -> &NodeKind<K> {
        &self.kind
    }

    /// The grammar kind, for element nodes
    pub fn element_kind(&self) -> Option<K> {
        match self.kind {
            NodeKind::Element(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn children(&self) -> &[SyntaxElement<K>] {
        &self.children
    }

    /// Another handle on the child list
    pub fn children_shared(&self) -> Children<K> {
        Arc::clone(&self.children)
    }

    /// Child nodes, skipping token leaves
    pub fn child_nodes(&self) -> impl DoubleEndedIterator<Item = &SyntaxNode<K>> {
        self.children.iter().filter_map(SyntaxElement::as_node)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, NodeKind::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// The text of every token leaf below this node, concatenated
    pub fn text(&self) -> String {
        self.tokens().map(|t| t.text.as_str()).collect()
    }

    /// The slice of `source` this node covers
    pub fn source_text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.range.as_byte_range()).unwrap_or("")
    }

    /// This node and every node below it, in pre-order
    pub fn descendants(&self) -> Descendants<'_, K> {
        Descendants { stack: vec![self] }
    }

    /// Every token leaf below this node, in source order
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        let mut tokens = Vec::new();
        collect_tokens(self, &mut tokens);
        tokens.into_iter()
    }

    /// Every element node of `kind`, in pre-order
    pub fn find_all(&self, kind: K) -> Vec<&SyntaxNode<K>> {
        self.descendants()
            .filter(|node| node.element_kind() == Some(kind))
            .collect()
    }

    /// The deepest node whose range contains `offset`
    pub fn node_at_offset(&self, offset: usize) -> Option<&SyntaxNode<K>> {
        if !self.range.contains(offset) {
            return None;
        }
        let mut current = self;
        'descend: loop {
            for child in current.child_nodes() {
                if child.range.contains(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Every error node in this subtree, in pre-order
    pub fn errors(&self) -> Vec<&SyntaxNode<K>> {
        self.descendants().filter(|node| node.is_error()).collect()
    }

    pub fn contains_error(&self) -> bool {
        self.descendants().any(|node| node.is_error())
    }

    /// Whether the subtree is free of error nodes
    pub fn is_valid(&self) -> bool {
        !self.contains_error()
    }
}

/// Pre-order iterator over a subtree's nodes
pub struct Descendants<'a, K> {
    stack: Vec<&'a SyntaxNode<K>>,
}

impl<'a, K: ElementKind> Iterator for Descendants<'a, K> {
    type Item = &'a SyntaxNode<K>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.child_nodes().rev());
        Some(node)
    }
}

fn collect_tokens<'a, K>(node: &'a SyntaxNode<K>, out: &mut Vec<&'a Token>) {
    let mut stack = vec![node.children.iter()];
    while let Some(children) = stack.last_mut() {
        match children.next() {
            Some(SyntaxElement::Node(inner)) => stack.push(inner.children.iter()),
            Some(SyntaxElement::Token(token)) => out.push(token),
            None => {
                stack.pop();
            }
        }
    }
}

/// Takes the tree apart level by level, so dropping a deep tree does not recurse
impl<K> Drop for SyntaxNode<K> {
    fn drop(&mut self) {
        let shallow = self.children.iter().all(|child| match child {
            SyntaxElement::Node(node) => node.children.is_empty(),
            SyntaxElement::Token(_) => true,
        });
        if shallow {
            return;
        }

        let mut pending = vec![mem::replace(&mut self.children, Arc::from(Vec::new()))];
        while let Some(mut children) = pending.pop() {
            // A shared list is only released here; its last owner takes it apart
            if let Some(elements) = Arc::get_mut(&mut children) {
                for element in elements.iter_mut() {
                    if let SyntaxElement::Node(node) = element {
                        if !node.children.is_empty() {
                            pending.push(mem::replace(&mut node.children, Arc::from(Vec::new())));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synkit::token::TokenType;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Pair,
        Name,
    }

    fn token(kind: TokenType, text: &str, start: usize) -> SyntaxElement<Kind> {
        SyntaxElement::Token(Token::new(
            kind,
            text,
            TextRange::new(start, start + text.len()),
        ))
    }

    // Pair(Name(a) " " Name(b))
    fn sample() -> SyntaxNode<Kind> {
        let a = SyntaxNode::element(
            Kind::Name,
            TextRange::new(0, 1),
            vec![token(TokenType::Identifier, "a", 0)],
        );
        let b = SyntaxNode::element(
            Kind::Name,
            TextRange::new(2, 3),
            vec![token(TokenType::Identifier, "b", 2)],
        );
        SyntaxNode::element(
            Kind::Pair,
            TextRange::new(0, 3),
            vec![
                SyntaxElement::Node(a),
                token(TokenType::Whitespace, " ", 1),
                SyntaxElement::Node(b),
            ],
        )
    }

    #[test]
    fn test_text_and_tokens_in_order() {
        let pair = sample();
        assert_eq!(pair.text(), "a b");
        let texts: Vec<&str> = pair.tokens().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", " ", "b"]);
        assert_eq!(pair.source_text("a b c"), "a b");
    }

    #[test]
    fn test_deep_tree_walks_and_drops_without_recursion() {
        let mut node = SyntaxNode::element(
            Kind::Name,
            TextRange::new(0, 1),
            vec![token(TokenType::Identifier, "a", 0)],
        );
        for _ in 0..200_000 {
            node = SyntaxNode::element(Kind::Pair, TextRange::new(0, 1), vec![SyntaxElement::Node(node)]);
        }
        assert_eq!(node.text(), "a");
        assert_eq!(node.descendants().count(), 200_001);

        // A shared subtree outlives the tree it was taken from
        let shared = node.children_shared();
        drop(node);
        assert_eq!(shared.len(), 1);
        drop(shared);
    }

    #[test]
    fn test_descendants_pre_order() {
        let pair = sample();
        let kinds: Vec<Option<Kind>> = pair.descendants().map(|n| n.element_kind()).collect();
        assert_eq!(kinds, vec![Some(Kind::Pair), Some(Kind::Name), Some(Kind::Name)]);
        assert_eq!(pair.find_all(Kind::Name).len(), 2);
    }

    #[test]
    fn test_node_at_offset() {
        let pair = sample();
        assert_eq!(pair.node_at_offset(2).unwrap().range(), TextRange::new(2, 3));
        // The gap between names belongs to the pair itself
        assert_eq!(pair.node_at_offset(1).unwrap().element_kind(), Some(Kind::Pair));
        assert!(pair.node_at_offset(3).is_none());
    }

    #[test]
    fn test_error_nodes_make_tree_invalid() {
        let pair = sample();
        assert!(pair.is_valid());

        let broken = SyntaxNode::element(
            Kind::Pair,
            TextRange::new(0, 3),
            vec![SyntaxElement::Node(SyntaxNode::error(
                "missing name",
                TextRange::empty(3),
                Vec::new(),
            ))],
        );
        assert!(broken.contains_error());
        assert_eq!(broken.errors()[0].error_message(), Some("missing name"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(NodeKind::<Kind>::Root.to_string(), "Root");
        assert_eq!(NodeKind::Element(Kind::Pair).to_string(), "Pair");
        let error: NodeKind<Kind> = NodeKind::Error {
            message: "bad".to_string(),
            token_index: None,
        };
        assert_eq!(error.to_string(), "Error(\"bad\")");
    }
}
