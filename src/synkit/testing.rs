//! Testing utilities for grammars built on synkit
//!
//! # Grammar Testing Guidelines
//!
//! Tests of a grammar should pin down the shape and content of the tree, not generalities
//! like node counts. This module provides three tools:
//!
//! 1. **[assert_tree](fn@assert_tree)** - fluent verification of a built tree
//! 2. **[factories]** - tokens, markers and errors for builder tests that skip the lexer
//! 3. **[calc]** - a complete reference grammar to parse realistic input with
//!
//! ## Rule 1: Verify Trees with assert_tree
//!
//! Matching on nodes by hand looks like this:
//!
//! ```rust-example
//! let stmt = out.root.child_nodes().next().unwrap();
//! assert_eq!(stmt.element_kind(), Some(CalcKind::ExprStmt));
//! let add = stmt.child_nodes().next().unwrap();
//! assert_eq!(add.element_kind(), Some(CalcKind::Add));
//! // ... and so on for every level
//! ```
//!
//! The same check with the fluent API:
//!
//! ```rust-example
//! use synkit::synkit::testing::assert_tree;
//!
//! assert_tree(&out.root)
//!     .is_root()
//!     .valid()
//!     .child(0, |stmt| {
//!         stmt.element(CalcKind::ExprStmt)
//!             .child(0, |add| add.element(CalcKind::Add).text("a + b"))
//!     });
//! ```
//!
//! Failures name the path that failed (`Root[0]:ExprStmt[0]:Add: Text mismatch`).
//!
//! ## Rule 2: Keep Builder Tests Independent of the Lexer
//!
//! Tree-builder behavior is about token indices. Build the token stream with
//! [`factories::mk_tokens`] and hand-written markers so a lexer change cannot move them.

pub mod assertions;
pub mod calc;
pub mod factories;

pub use assertions::{assert_tree, NodeAssertion};
