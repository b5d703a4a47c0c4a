//! Tree builder
//!
//!     Turns the flat output of a parse (tokens, completed markers, errors) into one
//!     [`SyntaxNode`] tree. The builder is pure: the result depends only on its inputs, not on
//!     the order markers were appended in, and it never fails. Whatever it cannot place is
//!     reported as a [`BuildAnomaly`] and the tree degrades gracefully.
//!
//! Algorithm
//!
//!     1. Screen: markers with an inverted or out-of-bounds range are dropped, and so are
//!        repeats of an id already kept. The first valid marker appended with an id wins,
//!        which is the one place where append order matters.
//!     2. Identical ranges: markers linked by `precede` nest, the wrapper outside. Any other
//!        marker with the same range as a kept one is a duplicate; the lowest id wins.
//!     3. Layout: sort by `(start asc, end desc)` (wrappers first on ties) and assign parents
//!        in one stack pass. Containment is half-open, so a zero-width marker sitting at the
//!        end of a non-empty marker is outside it. A marker that crosses the boundary of the
//!        one it starts in is dropped.
//!     4. Errors: each parse error goes to the innermost node whose token range contains its
//!        token index (the root if none does). Repeats of the same index and message are
//!        folded into one.
//!     5. Assembly, bottom-up: a node's children are its child nodes, the tokens no child
//!        covers, and its error leaves, in source order; error leaves come first at equal
//!        positions. The element registry then builds the node, and a rejection wraps the
//!        same children in an error node.
//!
//!     The whole run is O(m log m + n) for m markers and n tokens.

use crate::synkit::building::registry::ElementRegistry;
use crate::synkit::building::tree::{Children, NodeKind, SyntaxElement, SyntaxNode};
use crate::synkit::parsing::{CompletedMarker, ElementKind, ParseError};
use crate::synkit::range::TextRange;
use crate::synkit::token::{Token, TokenType};
use crate::synkit::trace::{NoopTracer, TraceEvent, Tracer};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Something in the builder's input that could not be placed as given
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BuildAnomaly {
    /// `start > end`, or the range does not fit the token stream
    InvalidRange {
        marker_id: usize,
        start: usize,
        end: usize,
    },
    DuplicateId {
        marker_id: usize,
    },
    /// Same range as `kept_id` without being its wrapper
    DuplicateRange {
        marker_id: usize,
        kept_id: usize,
        start: usize,
        end: usize,
    },
    /// Starts inside `other_id` but ends after it
    Overlapping {
        marker_id: usize,
        other_id: usize,
    },
    /// A marker was reached again while its node was being built
    Cycle {
        marker_id: usize,
    },
}

impl fmt::Display for BuildAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildAnomaly::InvalidRange {
                marker_id,
                start,
                end,
            } => write!(f, "marker #{} has invalid range [{}, {})", marker_id, start, end),
            BuildAnomaly::DuplicateId { marker_id } => {
                write!(f, "marker id #{} appears more than once", marker_id)
            }
            BuildAnomaly::DuplicateRange {
                marker_id,
                kept_id,
                start,
                end,
            } => write!(
                f,
                "marker #{} duplicates the range [{}, {}) of marker #{}",
                marker_id, start, end, kept_id
            ),
            BuildAnomaly::Overlapping {
                marker_id,
                other_id,
            } => write!(f, "marker #{} crosses the end of marker #{}", marker_id, other_id),
            BuildAnomaly::Cycle { marker_id } => {
                write!(f, "marker #{} re-entered while under construction", marker_id)
            }
        }
    }
}

/// Which trivia tokens become leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub retain_whitespace: bool,
    pub retain_comments: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            retain_whitespace: true,
            retain_comments: true,
        }
    }
}

/// The built tree and what the builder noticed along the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput<K> {
    pub root: SyntaxNode<K>,
    /// No parse errors were reported and the tree holds no error node
    pub valid: bool,
    pub anomalies: Vec<BuildAnomaly>,
}

/// Builds trees with a given registry
pub struct TreeBuilder<'r, K> {
    registry: &'r ElementRegistry<K>,
    options: BuildOptions,
    tracer: Box<dyn Tracer>,
}

impl<'r, K: ElementKind> TreeBuilder<'r, K> {
    pub fn new(registry: &'r ElementRegistry<K>) -> Self {
        Self {
            registry,
            options: BuildOptions::default(),
            tracer: Box::new(NoopTracer),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_tracer(mut self, tracer: Box<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn build(
        &mut self,
        tokens: &[Token],
        markers: &[CompletedMarker<K>],
        errors: &[ParseError],
    ) -> BuildOutput<K> {
        let mut anomalies = Vec::new();
        let screened = screen(tokens.len(), markers, &mut anomalies);
        let ordered = order(screened, &mut anomalies);
        let layout = Layout::new(ordered, errors, tokens.len(), &mut anomalies);

        let root = {
            let mut assembly = Assembly {
                tokens,
                registry: self.registry,
                options: self.options,
                layout: &layout,
                in_progress: HashSet::new(),
                anomalies: &mut anomalies,
                tracer: self.tracer.as_mut(),
            };
            assembly.root()
        };

        if self.tracer.enabled() {
            for anomaly in &anomalies {
                self.tracer.event(TraceEvent::Anomaly(anomaly.clone()));
            }
        }

        let valid = errors.is_empty() && !root.contains_error();
        BuildOutput {
            root,
            valid,
            anomalies,
        }
    }
}

/// Build a tree with default options
pub fn build<K: ElementKind>(
    tokens: &[Token],
    markers: &[CompletedMarker<K>],
    errors: &[ParseError],
    registry: &ElementRegistry<K>,
) -> BuildOutput<K> {
    TreeBuilder::new(registry).build(tokens, markers, errors)
}

/// Step 1: drop markers that cannot be placed at all
fn screen<K: ElementKind>(
    token_count: usize,
    markers: &[CompletedMarker<K>],
    anomalies: &mut Vec<BuildAnomaly>,
) -> Vec<CompletedMarker<K>> {
    let mut sorted: Vec<CompletedMarker<K>> = markers.to_vec();
    // Stable: among markers sharing an id, the first appended is kept
    sorted.sort_by_key(|m| m.id);

    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(sorted.len());
    for marker in sorted {
        if marker.start > marker.end || marker.end > token_count || marker.start >= token_count {
            anomalies.push(BuildAnomaly::InvalidRange {
                marker_id: marker.id,
                start: marker.start,
                end: marker.end,
            });
        } else if !seen.insert(marker.id) {
            anomalies.push(BuildAnomaly::DuplicateId {
                marker_id: marker.id,
            });
        } else {
            kept.push(marker);
        }
    }
    kept
}

/// Step 2: resolve identical ranges and sort into layout order
fn order<K: ElementKind>(
    mut markers: Vec<CompletedMarker<K>>,
    anomalies: &mut Vec<BuildAnomaly>,
) -> Vec<CompletedMarker<K>> {
    markers.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.end.cmp(&a.end))
            .then(a.id.cmp(&b.id))
    });

    let mut ordered = Vec::with_capacity(markers.len());
    let mut rest = markers.as_slice();
    while let Some(first) = rest.first() {
        let size = rest
            .iter()
            .take_while(|m| m.start == first.start && m.end == first.end)
            .count();
        let (group, tail) = rest.split_at(size);
        rest = tail;

        let base = group[0];
        let mut chain = vec![base];
        for marker in &group[1..] {
            let last = chain[chain.len() - 1].id;
            if marker.precedes == Some(last) {
                chain.push(*marker);
            } else {
                anomalies.push(BuildAnomaly::DuplicateRange {
                    marker_id: marker.id,
                    kept_id: base.id,
                    start: marker.start,
                    end: marker.end,
                });
            }
        }
        // Outermost wrapper first
        ordered.extend(chain.into_iter().rev());
    }
    ordered
}

/// Half-open containment of marker ranges
fn contains<K>(parent: &CompletedMarker<K>, child: &CompletedMarker<K>) -> bool {
    let within = parent.start <= child.start && child.end <= parent.end;
    // A zero-width child at the parent's end lies outside a non-empty parent
    within && (child.start < parent.end || parent.start == parent.end)
}

/// Steps 3 and 4: parent/child structure and error ownership
struct Layout<K> {
    markers: Vec<CompletedMarker<K>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    /// Error leaves per marker, and for the root
    errors: Vec<Vec<ParseError>>,
    root_errors: Vec<ParseError>,
}

impl<K: ElementKind> Layout<K> {
    fn new(
        markers: Vec<CompletedMarker<K>>,
        errors: &[ParseError],
        token_count: usize,
        anomalies: &mut Vec<BuildAnomaly>,
    ) -> Self {
        let mut children = vec![Vec::new(); markers.len()];
        let mut roots = Vec::new();
        let mut stack: Vec<usize> = Vec::new();

        'markers: for (index, marker) in markers.iter().enumerate() {
            while let Some(&top) = stack.last() {
                let parent = &markers[top];
                if contains(parent, marker) {
                    break;
                }
                if marker.start < parent.end {
                    anomalies.push(BuildAnomaly::Overlapping {
                        marker_id: marker.id,
                        other_id: parent.id,
                    });
                    continue 'markers;
                }
                stack.pop();
            }
            match stack.last() {
                Some(&parent) => children[parent].push(index),
                None => roots.push(index),
            }
            stack.push(index);
        }

        let mut layout = Self {
            errors: vec![Vec::new(); markers.len()],
            markers,
            children,
            roots,
            root_errors: Vec::new(),
        };

        let mut seen = HashSet::new();
        for error in errors {
            if !seen.insert((error.token_index, error.message.as_str())) {
                continue;
            }
            let owner = if error.token_index < token_count {
                layout.owner_of(error.token_index)
            } else {
                None
            };
            match owner {
                Some(index) => layout.errors[index].push(error.clone()),
                None => layout.root_errors.push(error.clone()),
            }
        }
        layout
    }

    /// The innermost laid-out marker whose token range contains `token_index`
    fn owner_of(&self, token_index: usize) -> Option<usize> {
        let mut owner = None;
        let mut level = &self.roots;
        loop {
            let after = level.partition_point(|&i| self.markers[i].start <= token_index);
            let candidate = after.checked_sub(1).map(|slot| level[slot]);
            match candidate {
                Some(index) if token_index < self.markers[index].end => {
                    owner = Some(index);
                    level = &self.children[index];
                }
                _ => return owner,
            }
        }
    }
}

/// Step 5: bottom-up node construction
struct Assembly<'a, K> {
    tokens: &'a [Token],
    registry: &'a ElementRegistry<K>,
    options: BuildOptions,
    layout: &'a Layout<K>,
    in_progress: HashSet<usize>,
    anomalies: &'a mut Vec<BuildAnomaly>,
    tracer: &'a mut dyn Tracer,
}

/// One node under assembly: the children collected so far and how far through its child
/// markers it is
struct Frame<K> {
    /// `None` for the root
    index: Option<usize>,
    end: usize,
    next_child: usize,
    /// First token not yet covered by a child marker
    cursor: usize,
    /// (token index, rank, element); at equal index: errors, then zero-width nodes, then the rest
    items: Vec<(usize, u8, SyntaxElement<K>)>,
}

impl<'a, K: ElementKind> Assembly<'a, K> {
    /// Post-order walk over the layout with an explicit stack of frames, so arbitrarily deep
    /// trees (long left-associative chains nest one level per operator) never recurse
    fn root(&mut self) -> SyntaxNode<K> {
        let layout = self.layout;
        let mut root = self.open(None);
        let mut stack: Vec<Frame<K>> = Vec::new();

        loop {
            let frame = match stack.last_mut() {
                Some(frame) => frame,
                None => &mut root,
            };
            let child_markers = self.child_markers(frame.index);

            if let Some(&child) = child_markers.get(frame.next_child) {
                frame.next_child += 1;
                let marker = &layout.markers[child];
                self.push_tokens(frame.cursor, marker.start, &mut frame.items);
                frame.cursor = frame.cursor.max(marker.end);

                if self.in_progress.insert(child) {
                    let opened = self.open(Some(child));
                    stack.push(opened);
                } else {
                    let node = self.reentered(child);
                    frame.items.push(placed(marker, node));
                }
                continue;
            }

            let Some(done) = stack.pop() else {
                return self.close(root);
            };
            let marker = done.index.map(|index| &layout.markers[index]);
            let node = self.close(done);
            let parent = match stack.last_mut() {
                Some(parent) => parent,
                None => &mut root,
            };
            if let Some(marker) = marker {
                parent.items.push(placed(marker, node));
            }
        }
    }

    fn child_markers(&self, index: Option<usize>) -> &'a [usize] {
        let layout = self.layout;
        match index {
            Some(index) => &layout.children[index],
            None => &layout.roots,
        }
    }

    /// Start a frame: its error leaves are known up front
    fn open(&self, index: Option<usize>) -> Frame<K> {
        let layout = self.layout;
        let (start, end, errors) = match index {
            Some(index) => {
                let marker = &layout.markers[index];
                (marker.start, marker.end, &layout.errors[index])
            }
            None => (0, self.tokens.len(), &layout.root_errors),
        };

        let items = errors
            .iter()
            .map(|error| {
                let leaf = SyntaxNode::new(
                    NodeKind::Error {
                        message: error.message.clone(),
                        token_index: Some(error.token_index),
                    },
                    error.range,
                    Vec::new(),
                );
                (error.token_index, 0, SyntaxElement::Node(leaf))
            })
            .collect();

        Frame {
            index,
            end,
            next_child: 0,
            cursor: start,
            items,
        }
    }

    /// Finish a frame: trailing tokens, source order, then the registry builds the node
    fn close(&mut self, mut frame: Frame<K>) -> SyntaxNode<K> {
        self.push_tokens(frame.cursor, frame.end, &mut frame.items);
        frame.items.sort_by_key(|(index, rank, _)| (*index, *rank));
        let elements: Vec<SyntaxElement<K>> = frame
            .items
            .into_iter()
            .map(|(_, _, element)| element)
            .collect();

        let Some(index) = frame.index else {
            let range = self.token_span(0, self.tokens.len());
            return SyntaxNode::new(NodeKind::Root, range, elements);
        };
        self.in_progress.remove(&index);

        let marker = &self.layout.markers[index];
        let range = self.token_span(marker.start, marker.end);
        let children: Children<K> = elements.into();
        match self
            .registry
            .construct(marker, Arc::clone(&children), range)
        {
            Ok(node) => node,
            Err(message) => {
                if self.tracer.enabled() {
                    self.tracer.event(TraceEvent::ConstructorRejected {
                        marker_id: marker.id,
                        message: message.clone(),
                    });
                }
                SyntaxNode::error(message, range, children)
            }
        }
    }

    /// A marker reached again while its node is still open
    fn reentered(&mut self, index: usize) -> SyntaxNode<K> {
        let marker = &self.layout.markers[index];
        self.anomalies.push(BuildAnomaly::Cycle {
            marker_id: marker.id,
        });
        SyntaxNode::error(
            format!("marker #{} re-entered while under construction", marker.id),
            self.token_span(marker.start, marker.end),
            Vec::new(),
        )
    }

    fn push_tokens(&self, from: usize, to: usize, items: &mut Vec<(usize, u8, SyntaxElement<K>)>) {
        for index in from..to.min(self.tokens.len()) {
            let token = &self.tokens[index];
            let keep = match token.kind {
                TokenType::Eof => false,
                TokenType::Whitespace => self.options.retain_whitespace,
                TokenType::Comment => self.options.retain_comments,
                _ => true,
            };
            if keep {
                items.push((index, 2, SyntaxElement::Token(token.clone())));
            }
        }
    }

    /// Source range of tokens `[start, end)`; zero-width at the start token when empty
    fn token_span(&self, start: usize, end: usize) -> TextRange {
        if start < end && end <= self.tokens.len() {
            return TextRange::new(self.tokens[start].range.start, self.tokens[end - 1].range.end);
        }
        let offset = self
            .tokens
            .get(start)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.range.start);
        TextRange::empty(offset)
    }
}

/// Where a child node sorts among its siblings
fn placed<K>(marker: &CompletedMarker<K>, node: SyntaxNode<K>) -> (usize, u8, SyntaxElement<K>) {
    let rank = if marker.start == marker.end { 1 } else { 2 };
    (marker.start, rank, SyntaxElement::Node(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synkit::testing::factories::{mk_error, mk_marker, mk_tokens};
    use crate::synkit::trace::RecordingTracer;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        A,
        B,
        C,
    }

    // Ten one-letter identifiers, then Eof
    fn ten_tokens() -> Vec<Token> {
        let texts = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];
        mk_tokens(
            &texts
                .iter()
                .map(|t| (TokenType::Identifier, *t))
                .collect::<Vec<_>>(),
        )
    }

    fn run(markers: &[CompletedMarker<Kind>], errors: &[ParseError]) -> BuildOutput<Kind> {
        build(&ten_tokens(), markers, errors, &ElementRegistry::new())
    }

    fn child_kinds(node: &SyntaxNode<Kind>) -> Vec<String> {
        node.children()
            .iter()
            .map(|c| match c {
                SyntaxElement::Node(n) => n.kind().to_string(),
                SyntaxElement::Token(t) => t.text.clone(),
            })
            .collect()
    }

    #[test]
    fn test_containment() {
        let markers = [mk_marker(1, 2, 6, Kind::B), mk_marker(0, 0, 10, Kind::A)];
        let out = run(&markers, &[]);
        assert!(out.valid);
        assert!(out.anomalies.is_empty());

        let a = out.root.child_nodes().next().unwrap();
        assert_eq!(a.element_kind(), Some(Kind::A));
        assert_eq!(child_kinds(a), vec!["a", "b", "B", "g", "h", "i", "j"]);
        let b = a.child_nodes().next().unwrap();
        assert_eq!(b.text(), "cdef");
        assert_eq!(b.range(), TextRange::new(2, 6));
    }

    #[test]
    fn test_identical_ranges_keep_lowest_id() {
        let markers = [
            mk_marker(0, 0, 10, Kind::A),
            mk_marker(2, 2, 6, Kind::C),
            mk_marker(1, 2, 6, Kind::B),
        ];
        let out = run(&markers, &[]);
        let a = out.root.child_nodes().next().unwrap();
        let nodes: Vec<Option<Kind>> = a.child_nodes().map(|n| n.element_kind()).collect();
        assert_eq!(nodes, vec![Some(Kind::B)]);
        assert_eq!(
            out.anomalies,
            vec![BuildAnomaly::DuplicateRange {
                marker_id: 2,
                kept_id: 1,
                start: 2,
                end: 6
            }]
        );
    }

    #[test]
    fn test_precede_chain_nests_wrapper_outside() {
        let markers = [
            mk_marker(0, 0, 3, Kind::A),
            mk_marker(1, 0, 3, Kind::B).with_precedes(0),
            mk_marker(2, 0, 3, Kind::C).with_precedes(1),
        ];
        let out = run(&markers, &[]);
        assert!(out.anomalies.is_empty());
        let c = out.root.child_nodes().next().unwrap();
        assert_eq!(c.element_kind(), Some(Kind::C));
        let b = c.child_nodes().next().unwrap();
        assert_eq!(b.element_kind(), Some(Kind::B));
        let a = b.child_nodes().next().unwrap();
        assert_eq!(a.element_kind(), Some(Kind::A));
        assert_eq!(a.text(), "abc");
    }

    #[test]
    fn test_append_order_does_not_matter() {
        let mut markers = vec![
            mk_marker(0, 0, 10, Kind::A),
            mk_marker(1, 1, 4, Kind::B),
            mk_marker(2, 5, 9, Kind::B),
            mk_marker(3, 6, 7, Kind::C),
        ];
        let first = run(&markers, &[]);
        markers.reverse();
        let second = run(&markers, &[]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_crossing_marker_is_dropped() {
        let markers = [mk_marker(0, 0, 5, Kind::A), mk_marker(1, 3, 8, Kind::B)];
        let out = run(&markers, &[]);
        assert_eq!(
            out.anomalies,
            vec![BuildAnomaly::Overlapping {
                marker_id: 1,
                other_id: 0
            }]
        );
        assert_eq!(child_kinds(&out.root), vec!["A", "f", "g", "h", "i", "j"]);
    }

    #[test]
    fn test_zero_width_marker_at_end_is_a_sibling() {
        let markers = [mk_marker(0, 0, 2, Kind::A), mk_marker(1, 2, 2, Kind::B)];
        let out = run(&markers, &[]);
        assert_eq!(child_kinds(&out.root)[..3], ["A", "B", "c"]);
        let b = &out.root.child_nodes().nth(1).unwrap();
        assert_eq!(b.range(), TextRange::empty(2));
    }

    #[test]
    fn test_invalid_markers_are_screened() {
        let markers = [
            mk_marker(0, 4, 2, Kind::A),
            mk_marker(1, 0, 99, Kind::A),
            mk_marker(2, 1, 2, Kind::B),
            mk_marker(2, 3, 4, Kind::C),
        ];
        let out = run(&markers, &[]);
        assert_eq!(out.anomalies.len(), 3);
        assert!(matches!(out.anomalies[2], BuildAnomaly::DuplicateId { marker_id: 2 }));
        assert_eq!(out.root.find_all(Kind::B).len(), 1);
        assert!(out.root.find_all(Kind::C).is_empty());
    }

    #[test]
    fn test_repeated_id_keeps_first_appended() {
        let markers = [mk_marker(4, 5, 9, Kind::B), mk_marker(4, 1, 3, Kind::C)];
        let out = run(&markers, &[]);
        assert_eq!(out.anomalies, vec![BuildAnomaly::DuplicateId { marker_id: 4 }]);
        let kept: Vec<(Option<Kind>, TextRange)> = out
            .root
            .child_nodes()
            .map(|n| (n.element_kind(), n.range()))
            .collect();
        assert_eq!(kept, vec![(Some(Kind::B), TextRange::new(5, 9))]);
    }

    #[test]
    fn test_long_chain_builds_without_recursion() {
        // Every marker wraps the previous one, the shape a long left-associative chain has
        let count = 100_000;
        let tokens = mk_tokens(&vec![(TokenType::Identifier, "x"); count]);
        let markers: Vec<CompletedMarker<Kind>> = (0..count)
            .map(|i| {
                let marker = mk_marker(i, 0, i + 1, Kind::A);
                if i == 0 {
                    marker
                } else {
                    marker.with_precedes(i - 1)
                }
            })
            .collect();

        let out = build(&tokens, &markers, &[], &ElementRegistry::new());
        assert!(out.valid);
        assert!(out.anomalies.is_empty());
        assert_eq!(out.root.find_all(Kind::A).len(), count);
        assert_eq!(out.root.text().len(), count);
        drop(out);
    }

    #[test]
    fn test_errors_attach_to_innermost_node() {
        let markers = [mk_marker(0, 0, 10, Kind::A), mk_marker(1, 2, 6, Kind::B)];
        let errors = [
            mk_error(3, "inside b"),
            mk_error(6, "after b"),
            mk_error(3, "inside b"),
            mk_error(10, "at eof"),
        ];
        let out = run(&markers, &errors);
        assert!(!out.valid);

        let a = out.root.child_nodes().next().unwrap();
        let b = a.find_all(Kind::B)[0];
        assert_eq!(child_kinds(b), vec!["c", "Error(\"inside b\")", "d", "e", "f"]);
        assert_eq!(
            child_kinds(a),
            vec!["a", "b", "B", "Error(\"after b\")", "g", "h", "i", "j"]
        );
        assert_eq!(child_kinds(&out.root), vec!["A", "Error(\"at eof\")"]);
    }

    #[test]
    fn test_validity_requires_no_errors() {
        let out = run(&[mk_marker(0, 0, 1, Kind::A)], &[]);
        assert!(out.valid);
        assert!(out.root.is_valid());

        let out = run(&[], &[mk_error(0, "bad")]);
        assert!(!out.valid);
    }

    #[test]
    fn test_rejected_constructor_wraps_children() {
        let registry = ElementRegistry::new().with(Kind::B, |_, _, _| Err("no".to_string()));
        let tracer = RecordingTracer::new();
        let out = TreeBuilder::new(&registry)
            .with_tracer(Box::new(tracer.clone()))
            .build(&ten_tokens(), &[mk_marker(0, 1, 3, Kind::B)], &[]);

        assert!(!out.valid);
        let error = out.root.child_nodes().next().unwrap();
        assert_eq!(error.error_message(), Some("no"));
        assert_eq!(error.text(), "bc");
        assert_eq!(
            tracer.events(),
            vec![TraceEvent::ConstructorRejected {
                marker_id: 0,
                message: "no".to_string()
            }]
        );
    }

    #[test]
    fn test_cycle_guard_yields_error_node() {
        let tokens = ten_tokens();
        let registry = ElementRegistry::new();
        let mut anomalies = Vec::new();
        // A layout whose only marker lists itself as its child
        let layout = Layout {
            markers: vec![mk_marker(7, 0, 2, Kind::A)],
            children: vec![vec![0]],
            roots: vec![0],
            errors: vec![Vec::new()],
            root_errors: Vec::new(),
        };
        let mut tracer = NoopTracer;
        let root = Assembly {
            tokens: &tokens,
            registry: &registry,
            options: BuildOptions::default(),
            layout: &layout,
            in_progress: HashSet::new(),
            anomalies: &mut anomalies,
            tracer: &mut tracer,
        }
        .root();

        assert_eq!(anomalies, vec![BuildAnomaly::Cycle { marker_id: 7 }]);
        assert!(root.contains_error());
    }

    #[test]
    fn test_trivia_retention() {
        let tokens = mk_tokens(&[
            (TokenType::Identifier, "a"),
            (TokenType::Whitespace, " "),
            (TokenType::Comment, "#c"),
        ]);
        let registry: ElementRegistry<Kind> = ElementRegistry::new();
        let out = TreeBuilder::new(&registry)
            .with_options(BuildOptions {
                retain_whitespace: false,
                retain_comments: true,
            })
            .build(&tokens, &[], &[]);
        assert_eq!(out.root.text(), "a#c");
        assert_eq!(out.root.range(), TextRange::new(0, 4));
    }
}
