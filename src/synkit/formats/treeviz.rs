//! Treeviz formatter for syntax trees
//!
//! One line per element, indented 2 spaces per level of nesting. Nodes print their kind and
//! range, tokens print like [`Token`]'s `Display`:
//!
//! ```text
//! Root@0..9
//!   Add@0..9
//!     Name@0..1
//!       Identifier "a"@0..1
//!     Whitespace " "@1..2
//!     Operator "+"@2..3
//!     ...
//! ```
//!
//! Error nodes print as `Error("message")@range`.

use crate::synkit::building::{SyntaxElement, SyntaxNode};
use crate::synkit::parsing::ElementKind;
use crate::synkit::range::TextRange;
use crate::synkit::token::Token;
use std::fmt;

/// Which leaves to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreevizOptions {
    pub show_tokens: bool,
    /// Whitespace and comments; only relevant with `show_tokens`
    pub show_trivia: bool,
}

impl Default for TreevizOptions {
    fn default() -> Self {
        Self {
            show_tokens: true,
            show_trivia: true,
        }
    }
}

pub fn to_treeviz_str<K: ElementKind>(root: &SyntaxNode<K>) -> String {
    to_treeviz_str_with(root, TreevizOptions::default())
}

pub fn to_treeviz_str_with<K: ElementKind>(root: &SyntaxNode<K>, options: TreevizOptions) -> String {
    let mut output = String::new();
    write_line(&mut output, 0, root.kind(), root.range());

    // One child iterator per open node; the stack height is the indentation
    let mut stack = vec![root.children().iter()];
    loop {
        let depth = stack.len();
        let Some(children) = stack.last_mut() else {
            break;
        };
        match children.next() {
            Some(SyntaxElement::Node(node)) => {
                write_line(&mut output, depth, node.kind(), node.range());
                stack.push(node.children().iter());
            }
            Some(SyntaxElement::Token(token)) if shown(token, options) => {
                output.push_str(&format!("{}{}\n", "  ".repeat(depth), token));
            }
            Some(SyntaxElement::Token(_)) => {}
            None => {
                stack.pop();
            }
        }
    }
    output
}

fn write_line(output: &mut String, depth: usize, kind: impl fmt::Display, range: TextRange) {
    output.push_str(&format!("{}{}@{}\n", "  ".repeat(depth), kind, range));
}

fn shown(token: &Token, options: TreevizOptions) -> bool {
    options.show_tokens && (options.show_trivia || !token.is_trivia())
}
