//! Pratt expression engine
//!
//!     An operator-precedence parser on top of the marker API. A grammar provides an
//!     [`OperatorTable`] and an atom parser; [`ExpressionGrammar::parse_expression`] does the
//!     rest. Every hook has a default built on the table, and grammars override the ones they
//!     need (a call postfix, keyword atoms, ...).
//!
//! Binding Powers
//!
//!     Each operator has a binding power; higher binds tighter. "No binding power" (`None`)
//!     means the token cannot start (nud) or continue (led) an expression. The [`Precedence`]
//!     levels are spaced by 10 so grammars can slot custom levels in between.
//!
//!     Left-associative infix operators parse their right operand with `bp + 1`, so an equal
//!     operator to the right ends the operand; right-associative ones use `bp`.
//!
//! Algorithm
//!
//!     parse_expression(min_bp):
//!         skip trivia
//!         nothing left on the line         -> error "expected expression"
//!         token has no nud binding power   -> error "unexpected token '…'" (not consumed)
//!         too many enclosing expressions   -> error "expression nested too deeply"
//!         left = parse_nud
//!         loop:
//!             look at the next significant token
//!             stop if it has no led binding power, or it is below min_bp
//!             left = parse_led(left), stopping (and keeping left) if that fails
//!
//!     Binary nodes wrap their left operand with [`CompletedMarker::precede`], so the tree
//!     comes out nested without the grammar building anything by hand.

use crate::synkit::parsing::marker::CompletedMarker;
use crate::synkit::parsing::session::ParserSession;
use crate::synkit::parsing::ElementKind;
use crate::synkit::token::{LiteralKind, StringPart, Token, TokenType};
use std::collections::HashMap;

/// Operator associativity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// Standard precedence levels, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    Assignment = 10,
    /// `?:` and `a ? b : c`
    Ternary = 20,
    LogicalOr = 30,
    LogicalAnd = 40,
    BitOr = 50,
    BitXor = 60,
    BitAnd = 70,
    Equality = 80,
    Comparison = 90,
    Shift = 100,
    Additive = 110,
    Multiplicative = 120,
    Exponent = 130,
    Prefix = 140,
    Postfix = 150,
    Atom = 160,
}

impl Precedence {
    pub const fn binding_power(self) -> u32 {
        self as u32
    }
}

impl From<Precedence> for u32 {
    fn from(precedence: Precedence) -> u32 {
        precedence.binding_power()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixOp<K> {
    pub bp: u32,
    pub kind: K,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfixOp<K> {
    pub bp: u32,
    pub assoc: Assoc,
    pub kind: K,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostfixOp<K> {
    pub bp: u32,
    pub kind: K,
}

/// `cond <open> then <separator> else`, e.g. `a ? b : c`. Right associative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TernaryOp<K> {
    pub open: String,
    pub separator: String,
    pub bp: u32,
    pub kind: K,
}

/// Operators keyed by token text.
///
/// Only operator, keyword and punctuation tokens are looked up, so an identifier or literal
/// never acts as an operator.
#[derive(Debug, Clone)]
pub struct OperatorTable<K> {
    prefix: HashMap<String, PrefixOp<K>>,
    infix: HashMap<String, InfixOp<K>>,
    postfix: HashMap<String, PostfixOp<K>>,
    ternary: Vec<TernaryOp<K>>,
}

impl<K> Default for OperatorTable<K> {
    fn default() -> Self {
        Self {
            prefix: HashMap::new(),
            infix: HashMap::new(),
            postfix: HashMap::new(),
            ternary: Vec::new(),
        }
    }
}

fn is_operator_token(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenType::Operator | TokenType::Keyword | TokenType::Punctuation
    )
}

impl<K: ElementKind> OperatorTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, text: impl Into<String>, bp: impl Into<u32>, kind: K) -> Self {
        self.prefix.insert(
            text.into(),
            PrefixOp {
                bp: bp.into(),
                kind,
            },
        );
        self
    }

    pub fn infix(
        mut self,
        text: impl Into<String>,
        bp: impl Into<u32>,
        assoc: Assoc,
        kind: K,
    ) -> Self {
        self.infix.insert(
            text.into(),
            InfixOp {
                bp: bp.into(),
                assoc,
                kind,
            },
        );
        self
    }

    pub fn postfix(mut self, text: impl Into<String>, bp: impl Into<u32>, kind: K) -> Self {
        self.postfix.insert(
            text.into(),
            PostfixOp {
                bp: bp.into(),
                kind,
            },
        );
        self
    }

    pub fn ternary(
        mut self,
        open: impl Into<String>,
        separator: impl Into<String>,
        bp: impl Into<u32>,
        kind: K,
    ) -> Self {
        self.ternary.push(TernaryOp {
            open: open.into(),
            separator: separator.into(),
            bp: bp.into(),
            kind,
        });
        self
    }

    pub fn prefix_op(&self, token: &Token) -> Option<&PrefixOp<K>> {
        is_operator_token(token)
            .then(|| self.prefix.get(&token.text))
            .flatten()
    }

    pub fn infix_op(&self, token: &Token) -> Option<&InfixOp<K>> {
        is_operator_token(token)
            .then(|| self.infix.get(&token.text))
            .flatten()
    }

    pub fn postfix_op(&self, token: &Token) -> Option<&PostfixOp<K>> {
        is_operator_token(token)
            .then(|| self.postfix.get(&token.text))
            .flatten()
    }

    pub fn ternary_op(&self, token: &Token) -> Option<&TernaryOp<K>> {
        if !is_operator_token(token) {
            return None;
        }
        self.ternary.iter().find(|op| op.open == token.text)
    }
}

/// An expression grammar.
///
/// Implementors supply the operator table and the atom parser; the remaining methods have
/// defaults driven by the table.
pub trait ExpressionGrammar<K: ElementKind> {
    fn operators(&self) -> &OperatorTable<K>;

    /// Parse one atom at the cursor (trivia already skipped)
    fn parse_atom(&self, s: &mut ParserSession<K>) -> Option<CompletedMarker<K>>;

    /// Whether `token` can begin an atom. Identifiers, numbers, chars and string openers by
    /// default.
    fn starts_atom(&self, token: &Token) -> bool {
        match token.kind {
            TokenType::Identifier => true,
            TokenType::Literal(LiteralKind::String(part)) => {
                matches!(part, StringPart::SlStart | StringPart::MlStart)
            }
            TokenType::Literal(_) => true,
            _ => false,
        }
    }

    fn nud_binding_power(&self, token: &Token) -> Option<u32> {
        if let Some(op) = self.operators().prefix_op(token) {
            return Some(op.bp);
        }
        self.starts_atom(token)
            .then(|| Precedence::Atom.binding_power())
    }

    fn led_binding_power(&self, token: &Token) -> Option<u32> {
        let table = self.operators();
        table
            .ternary_op(token)
            .map(|op| op.bp)
            .or_else(|| table.infix_op(token).map(|op| op.bp))
            .or_else(|| table.postfix_op(token).map(|op| op.bp))
    }

    /// Parse the start of an expression: a prefix operator and its operand, or an atom
    fn parse_nud(&self, s: &mut ParserSession<K>) -> Option<CompletedMarker<K>> {
        let Some(op) = self.operators().prefix_op(s.peek()).copied() else {
            return self.parse_atom(s);
        };
        let m = s.mark();
        s.advance();
        if self.parse_expression(s, op.bp).is_some() {
            Some(m.done(s, op.kind))
        } else {
            m.drop(s);
            None
        }
    }

    /// Continue an expression after `left` with the operator at the cursor.
    ///
    /// Returns `None` (dropping the wrapper) when the operand after the operator is missing.
    fn parse_led(
        &self,
        s: &mut ParserSession<K>,
        left: CompletedMarker<K>,
        bp: u32,
    ) -> Option<CompletedMarker<K>> {
        let table = self.operators();

        if let Some(op) = table.ternary_op(s.peek()) {
            let m = left.precede(s);
            s.advance();
            let complete = self.parse_expression(s, 0).is_some()
                && s.expect(op.separator.as_str())
                && self.parse_expression(s, op.bp).is_some();
            return if complete {
                Some(m.done(s, op.kind))
            } else {
                m.drop(s);
                None
            };
        }

        if let Some(op) = table.infix_op(s.peek()).copied() {
            let m = left.precede(s);
            s.advance();
            let right_bp = match op.assoc {
                Assoc::Left => bp + 1,
                Assoc::Right => bp,
            };
            return if self.parse_expression(s, right_bp).is_some() {
                Some(m.done(s, op.kind))
            } else {
                m.drop(s);
                None
            };
        }

        if let Some(op) = table.postfix_op(s.peek()).copied() {
            let m = left.precede(s);
            s.advance();
            return Some(m.done(s, op.kind));
        }

        None
    }

    /// Parse an expression whose operators all bind at least as tightly as `min_bp`
    fn parse_expression(
        &self,
        s: &mut ParserSession<K>,
        min_bp: u32,
    ) -> Option<CompletedMarker<K>> {
        s.skip_trivia();
        if matches!(s.current_kind(), TokenType::Eof | TokenType::Linebreak) {
            s.error("expected expression");
            return None;
        }
        if self.nud_binding_power(s.peek()).is_none() {
            let message = format!("unexpected token '{}'", s.current_text());
            s.error(message);
            return None;
        }

        if !s.enter_expression() {
            s.error("expression nested too deeply");
            return None;
        }

        let parsed = self.parse_nud(s).map(|mut left| {
            loop {
                let bp = match self.led_binding_power(s.nth(0)) {
                    Some(bp) if bp >= min_bp => bp,
                    _ => break,
                };
                s.skip_trivia();
                match self.parse_led(s, left, bp) {
                    Some(next) => left = next,
                    None => break,
                }
            }
            left
        });
        s.exit_expression();
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synkit::building::{build, ElementRegistry, NodeKind, SyntaxElement, SyntaxNode};
    use crate::synkit::lexing::{tokenize, LexerConfig};
    use crate::synkit::parsing::SessionOptions;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Expr {
        Atom,
        Neg,
        Not,
        Add,
        Sub,
        Mul,
        Pow,
        Assign,
        Cond,
        Bang,
    }

    struct Grammar {
        table: OperatorTable<Expr>,
    }

    impl Grammar {
        fn new() -> Self {
            let table = OperatorTable::new()
                .prefix("-", Precedence::Prefix, Expr::Neg)
                .prefix("!", Precedence::Prefix, Expr::Not)
                .infix("+", Precedence::Additive, Assoc::Left, Expr::Add)
                .infix("-", Precedence::Additive, Assoc::Left, Expr::Sub)
                .infix("*", Precedence::Multiplicative, Assoc::Left, Expr::Mul)
                .infix("**", Precedence::Exponent, Assoc::Right, Expr::Pow)
                .infix("=", Precedence::Assignment, Assoc::Right, Expr::Assign)
                .postfix("!", Precedence::Postfix, Expr::Bang)
                .ternary("?", ":", Precedence::Ternary, Expr::Cond);
            Self { table }
        }
    }

    impl ExpressionGrammar<Expr> for Grammar {
        fn operators(&self) -> &OperatorTable<Expr> {
            &self.table
        }

        fn parse_atom(&self, s: &mut ParserSession<Expr>) -> Option<CompletedMarker<Expr>> {
            let m = s.mark();
            s.advance();
            Some(m.done(s, Expr::Atom))
        }
    }

    fn sexpr(node: &SyntaxNode<Expr>) -> String {
        match node.kind() {
            NodeKind::Element(Expr::Atom) => node.text(),
            NodeKind::Element(kind) => {
                let parts: Vec<String> = node
                    .children()
                    .iter()
                    .filter_map(|child| match child {
                        SyntaxElement::Node(n) if !n.is_error() => Some(sexpr(n)),
                        _ => None,
                    })
                    .collect();
                format!("({:?} {})", kind, parts.join(" "))
            }
            _ => node
                .children()
                .iter()
                .filter_map(SyntaxElement::as_node)
                // Errors are checked through the message list
                .filter(|n| !n.is_error())
                .map(sexpr)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    fn parse(source: &str) -> (String, Vec<String>) {
        let grammar = Grammar::new();
        let mut s = ParserSession::from_source(source, &LexerConfig::c_like());
        grammar.parse_expression(&mut s, 0);
        let result = s.finish();
        let errors = result.errors.iter().map(|e| e.message.clone()).collect();
        let output = build(
            &result.tokens,
            &result.completed_markers,
            &result.errors,
            &ElementRegistry::new(),
        );
        (sexpr(&output.root), errors)
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(parse("1 + 2 * 3").0, "(Add 1 (Mul 2 3))");
        assert_eq!(parse("2 * 3 + 1").0, "(Add (Mul 2 3) 1)");
        assert_eq!(parse("1 - 2 - 3").0, "(Sub (Sub 1 2) 3)");
        assert_eq!(parse("a = b = c").0, "(Assign a (Assign b c))");
        assert_eq!(parse("2 ** 3 ** 2").0, "(Pow 2 (Pow 3 2))");
    }

    #[test]
    fn test_prefix_postfix_and_ternary() {
        assert_eq!(parse("-a * b").0, "(Mul (Neg a) b)");
        assert_eq!(parse("-a!").0, "(Neg (Bang a))");
        assert_eq!(parse("!x").0, "(Not x)");
        assert_eq!(parse("c ? a + 1 : b").0, "(Cond c (Add a 1) b)");
        assert_eq!(parse("x = c ? a : b").0, "(Assign x (Cond c a b))");
    }

    #[test]
    fn test_missing_expression() {
        let (tree, errors) = parse("");
        assert_eq!(tree, "");
        assert_eq!(errors, vec!["expected expression"]);
    }

    #[test]
    fn test_unexpected_token_is_not_consumed() {
        let grammar = Grammar::new();
        let mut s = ParserSession::from_source(")", &LexerConfig::c_like());
        assert!(grammar.parse_expression(&mut s, 0).is_none());
        assert_eq!(s.position(), 0);
        assert_eq!(s.errors()[0].message, "unexpected token ')'");
    }

    #[test]
    fn test_missing_right_operand_keeps_left() {
        let (tree, errors) = parse("a * b +");
        assert_eq!(tree, "(Mul a b)");
        assert_eq!(errors, vec!["expected expression"]);
    }

    #[test]
    fn test_stops_below_min_bp() {
        let grammar = Grammar::new();
        let mut s = ParserSession::from_source("a * b + c", &LexerConfig::c_like());
        let done = grammar
            .parse_expression(&mut s, Precedence::Multiplicative.binding_power())
            .unwrap();
        assert_eq!(done.kind, Expr::Mul);
        // Cursor rests before the trivia ahead of `+`
        assert_eq!(s.position(), 5);
    }

    fn shallow_session(source: &str, max_expression_depth: usize) -> ParserSession<Expr> {
        let options = SessionOptions {
            max_expression_depth,
            ..SessionOptions::default()
        };
        ParserSession::with_options(tokenize(source, &LexerConfig::c_like(), None), options)
    }

    #[test]
    fn test_nesting_limit_keeps_best_left() {
        let grammar = Grammar::new();
        let mut s = shallow_session("a = b = c", 2);
        let done = grammar.parse_expression(&mut s, 0);
        assert_eq!(done.map(|m| m.kind), Some(Expr::Assign));
        assert_eq!(s.expression_depth(), 0);

        let result = s.finish();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "expression nested too deeply");
        assert_eq!(result.errors[0].token_index, 8);
        let output = build(
            &result.tokens,
            &result.completed_markers,
            &result.errors,
            &ElementRegistry::new(),
        );
        assert_eq!(sexpr(&output.root), "(Assign a b)");
    }

    #[test]
    fn test_nesting_limit_stops_prefix_chain() {
        let grammar = Grammar::new();
        let mut s = shallow_session("- - - a", 2);
        assert!(grammar.parse_expression(&mut s, 0).is_none());
        assert_eq!(s.errors()[0].message, "expression nested too deeply");
        assert_eq!(s.errors()[0].token_index, 4);
        assert!(s.completed_markers().is_empty());
    }
}
