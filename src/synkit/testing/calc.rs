//! Calc: a small reference grammar
//!
//!     A line-oriented calculator language written only against the public API. It is what
//!     the integration tests and the `synkit tree` command parse, and it doubles as a worked
//!     example of a grammar.
//!
//! Syntax
//!
//!     program    := (statement? linebreak)* statement?
//!     statement  := "let" Name "=" expr | expr
//!     expr       := Pratt expression over the table below
//!     atom       := number | char | name | string | "true" | "false" | "(" expr ")"
//!     string     := '"' (content | "$" name | "${" expr "}")* '"'
//!
//!     Operators, loosest first: `=` (right), `?:` and `c ? a : b` (right), `||`, `&&`, `|`,
//!     `^`, `&`, `==` `!=`, `<` `<=` `>` `>=`, `<<` `>>`, `+` `-`, `*` `/` `%`, `**` (right),
//!     prefix `-` `!` `~`.
//!
//! Recovery
//!
//!     A statement that does not end at the line end is cut there: the rest of the line is
//!     wrapped in a `BadStatement` node and parsing resumes on the next line. Constructors
//!     reject groups without a closing `)` and assignments to anything but a name.

use crate::synkit::building::{BuildOutput, ElementRegistry, SyntaxElement, SyntaxNode};
use crate::synkit::lexing::LexerConfig;
use crate::synkit::parsing::pratt::{Assoc, ExpressionGrammar, OperatorTable, Precedence};
use crate::synkit::parsing::{CompletedMarker, ParseResult, ParserSession};
use crate::synkit::token::{LiteralKind, StringPart, Token, TokenType};
use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalcKind {
    // Statements
    Let,
    ExprStmt,
    BadStatement,
    // Atoms
    Number,
    Char,
    Name,
    Bool,
    Str,
    Group,
    // Prefix
    Neg,
    Not,
    BitNot,
    // Infix
    Assign,
    Elvis,
    Cond,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

static OPERATORS: Lazy<OperatorTable<CalcKind>> = Lazy::new(|| {
    use Assoc::{Left, Right};
    use CalcKind::*;
    OperatorTable::new()
        .prefix("-", Precedence::Prefix, Neg)
        .prefix("!", Precedence::Prefix, Not)
        .prefix("~", Precedence::Prefix, BitNot)
        .infix("=", Precedence::Assignment, Right, Assign)
        .infix("?:", Precedence::Ternary, Right, Elvis)
        .ternary("?", ":", Precedence::Ternary, Cond)
        .infix("||", Precedence::LogicalOr, Left, Or)
        .infix("&&", Precedence::LogicalAnd, Left, And)
        .infix("|", Precedence::BitOr, Left, BitOr)
        .infix("^", Precedence::BitXor, Left, BitXor)
        .infix("&", Precedence::BitAnd, Left, BitAnd)
        .infix("==", Precedence::Equality, Left, Eq)
        .infix("!=", Precedence::Equality, Left, Ne)
        .infix("<", Precedence::Comparison, Left, Lt)
        .infix("<=", Precedence::Comparison, Left, Le)
        .infix(">", Precedence::Comparison, Left, Gt)
        .infix(">=", Precedence::Comparison, Left, Ge)
        .infix("<<", Precedence::Shift, Left, Shl)
        .infix(">>", Precedence::Shift, Left, Shr)
        .infix("+", Precedence::Additive, Left, Add)
        .infix("-", Precedence::Additive, Left, Sub)
        .infix("*", Precedence::Multiplicative, Left, Mul)
        .infix("/", Precedence::Multiplicative, Left, Div)
        .infix("%", Precedence::Multiplicative, Left, Rem)
        .infix("**", Precedence::Exponent, Right, Pow)
});

static REGISTRY: Lazy<ElementRegistry<CalcKind>> = Lazy::new(|| {
    ElementRegistry::new()
        .with(CalcKind::Group, |_, children, range| {
            if last_significant_leaf(&children).map(|t| t.text.as_str()) == Some(")") {
                Ok(SyntaxNode::element(CalcKind::Group, range, children))
            } else {
                Err("unclosed group".to_string())
            }
        })
        .with(CalcKind::Assign, |_, children, range| {
            let target = children.iter().find_map(SyntaxElement::as_node);
            match target.and_then(SyntaxNode::element_kind) {
                Some(CalcKind::Name) => Ok(SyntaxNode::element(CalcKind::Assign, range, children)),
                _ => Err("invalid assignment target".to_string()),
            }
        })
});

fn last_significant_leaf(children: &[SyntaxElement<CalcKind>]) -> Option<&Token> {
    children
        .iter()
        .rev()
        .filter_map(SyntaxElement::as_token)
        .find(|t| !t.is_trivia())
}

/// The lexer settings Calc is written against
pub fn config() -> LexerConfig {
    LexerConfig::c_like()
}

/// Node constructors for Calc
pub fn registry() -> &'static ElementRegistry<CalcKind> {
    &REGISTRY
}

/// Tokenize and parse `source`
pub fn parse(source: &str) -> ParseResult<CalcKind> {
    let mut s = ParserSession::from_source(source, &config());
    Calc.parse_program(&mut s);
    s.finish()
}

/// Parse `source` and build its tree
pub fn parse_tree(source: &str) -> BuildOutput<CalcKind> {
    parse(source).build(registry())
}

/// The Calc grammar
#[derive(Debug, Clone, Copy, Default)]
pub struct Calc;

fn string_part(token: &Token) -> Option<StringPart> {
    match token.kind {
        TokenType::Literal(LiteralKind::String(part)) => Some(part),
        _ => None,
    }
}

impl Calc {
    pub fn parse_program(&self, s: &mut ParserSession<CalcKind>) {
        loop {
            s.skip_trivia();
            match s.current_kind() {
                TokenType::Eof => break,
                TokenType::Linebreak => s.advance(),
                _ => self.parse_statement(s),
            }
        }
    }

    pub fn parse_statement(&self, s: &mut ParserSession<CalcKind>) {
        let errors_before = s.errors().len();

        if s.at("let") {
            self.parse_let(s);
        } else if let Some(expr) = self.parse_expression(s, 0) {
            expr.precede(s).done(s, CalcKind::ExprStmt);
        }

        s.skip_trivia();
        if !matches!(s.current_kind(), TokenType::Linebreak | TokenType::Eof) {
            if s.errors().len() == errors_before {
                s.error("expected end of line");
            }
            s.recover_to_line_end(CalcKind::BadStatement);
        }
    }

    fn parse_let(&self, s: &mut ParserSession<CalcKind>) -> CompletedMarker<CalcKind> {
        s.skip_trivia();
        let m = s.mark();
        s.advance();

        if s.at(TokenType::Identifier) {
            s.skip_trivia();
            let name = s.mark();
            s.advance();
            name.done(s, CalcKind::Name);
        } else {
            s.expect(TokenType::Identifier);
        }

        if s.expect("=") {
            self.parse_expression(s, 0);
        }
        m.done(s, CalcKind::Let)
    }

    fn parse_string(&self, s: &mut ParserSession<CalcKind>) -> CompletedMarker<CalcKind> {
        let m = s.mark();
        s.advance();
        loop {
            match string_part(s.peek()) {
                Some(StringPart::SlEnd | StringPart::MlEnd) => {
                    s.advance();
                    break;
                }
                Some(StringPart::InterpSingle) => {
                    s.advance();
                    if s.current_kind() == TokenType::Identifier {
                        let name = s.mark();
                        s.advance();
                        name.done(s, CalcKind::Name);
                    }
                }
                Some(StringPart::InterpBlockStart) => {
                    s.advance();
                    self.parse_interpolation_block(s);
                }
                Some(_) => s.advance(),
                // The lexer turns broken strings into a single error token
                None => {
                    s.error("unterminated string");
                    break;
                }
            }
        }
        m.done(s, CalcKind::Str)
    }

    fn parse_interpolation_block(&self, s: &mut ParserSession<CalcKind>) {
        let block_end = TokenType::string(StringPart::InterpBlockEnd);
        if self.parse_expression(s, 0).is_some() && s.eat(block_end) {
            return;
        }
        if !s.at(block_end) {
            s.error("expected '}'");
        }
        while !matches!(
            string_part(s.peek()),
            Some(StringPart::InterpBlockEnd | StringPart::SlEnd | StringPart::MlEnd)
        ) && s.current_kind() != TokenType::Eof
        {
            s.advance();
        }
        s.eat(block_end);
    }

    fn parse_group(&self, s: &mut ParserSession<CalcKind>) -> CompletedMarker<CalcKind> {
        let m = s.mark();
        s.advance();
        if self.parse_expression(s, 0).is_some() {
            s.expect(")");
        }
        m.done(s, CalcKind::Group)
    }

    fn leaf(&self, s: &mut ParserSession<CalcKind>, kind: CalcKind) -> CompletedMarker<CalcKind> {
        let m = s.mark();
        s.advance();
        m.done(s, kind)
    }
}

impl ExpressionGrammar<CalcKind> for Calc {
    fn operators(&self) -> &OperatorTable<CalcKind> {
        &OPERATORS
    }

    fn starts_atom(&self, token: &Token) -> bool {
        match token.kind {
            TokenType::Punctuation => token.text == "(",
            TokenType::Keyword => matches!(token.text.as_str(), "true" | "false"),
            TokenType::Identifier => true,
            TokenType::Literal(LiteralKind::String(part)) => {
                matches!(part, StringPart::SlStart | StringPart::MlStart)
            }
            TokenType::Literal(_) => true,
            _ => false,
        }
    }

    fn parse_atom(&self, s: &mut ParserSession<CalcKind>) -> Option<CompletedMarker<CalcKind>> {
        let done = match s.current_kind() {
            TokenType::Identifier => self.leaf(s, CalcKind::Name),
            TokenType::Keyword => self.leaf(s, CalcKind::Bool),
            TokenType::Punctuation => self.parse_group(s),
            TokenType::Literal(LiteralKind::Char) => self.leaf(s, CalcKind::Char),
            TokenType::Literal(LiteralKind::String(_)) => self.parse_string(s),
            TokenType::Literal(_) => self.leaf(s, CalcKind::Number),
            _ => return None,
        };
        Some(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synkit::testing::assert_tree;

    fn messages(result: &ParseResult<CalcKind>) -> Vec<&str> {
        result.errors.iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn test_let_statement() {
        let out = parse_tree("let x = 1 + 2\n");
        assert!(out.valid);
        assert_tree(&out.root).is_root().range(0, 14).child_count(1).child(0, |stmt| {
            stmt.element(CalcKind::Let)
                .range(0, 13)
                .leaf_texts(&["let", "="])
                .child_count(2)
                .child(0, |name| name.element(CalcKind::Name).text("x"))
                .child(1, |add| {
                    add.element(CalcKind::Add)
                        .text("1 + 2")
                        .leaf_texts(&["+"])
                        .child(0, |n| n.element(CalcKind::Number).text("1"))
                        .child(1, |n| n.element(CalcKind::Number).text("2"))
                })
        });
    }

    #[test]
    fn test_expression_statement_wraps_expression() {
        let out = parse_tree("a * (b - 1)");
        assert!(out.valid);
        assert_tree(&out.root).child(0, |stmt| {
            stmt.element(CalcKind::ExprStmt).child(0, |mul| {
                mul.element(CalcKind::Mul).child(1, |group| {
                    group
                        .element(CalcKind::Group)
                        .leaf_texts(&["(", ")"])
                        .child(0, |sub| sub.element(CalcKind::Sub).text("b - 1"))
                })
            })
        });
    }

    #[test]
    fn test_operators_and_keywords() {
        let out = parse_tree("ok = !done && n >= 10 ?: false");
        assert!(out.valid);
        assert_tree(&out.root).child(0, |stmt| {
            stmt.child(0, |assign| {
                assign.element(CalcKind::Assign).child(1, |elvis| {
                    elvis
                        .element(CalcKind::Elvis)
                        .child(0, |and| {
                            and.element(CalcKind::And)
                                .child(0, |not| not.element(CalcKind::Not))
                                .child(1, |ge| ge.element(CalcKind::Ge))
                        })
                        .child(1, |b| b.element(CalcKind::Bool).text("false"))
                })
            })
        });
    }

    #[test]
    fn test_string_interpolation() {
        let out = parse_tree(r#"greeting = "hi $name, ${count + 1} new""#);
        assert!(out.valid);
        assert_tree(&out.root).find(CalcKind::Str, |s| {
            s.child_count(2)
                .child(0, |name| name.element(CalcKind::Name).text("name"))
                .child(1, |add| add.element(CalcKind::Add).text("count + 1"))
        });
    }

    #[test]
    fn test_statement_recovery() {
        let result = parse("1 +\nlet = 2\nx)\ny\n");
        assert_eq!(
            messages(&result),
            vec!["expected expression", "expected Identifier", "expected end of line"]
        );

        let out = result.build(registry());
        assert!(!out.valid);
        let bad = out.root.find_all(CalcKind::BadStatement);
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].text(), ")");
        // The line after the broken one still parses
        assert_eq!(out.root.find_all(CalcKind::ExprStmt).len(), 3);
    }

    #[test]
    fn test_unexpected_token_reports_once() {
        let result = parse("let y = )\n");
        assert_eq!(messages(&result), vec!["unexpected token ')'"]);
        let out = result.build(registry());
        assert_eq!(out.root.find_all(CalcKind::BadStatement).len(), 1);
    }

    #[test]
    fn test_unclosed_group_is_rejected() {
        let result = parse("(a + b\n");
        assert_eq!(messages(&result), vec!["expected ')'"]);

        let out = result.build(registry());
        assert!(!out.valid);
        let errors = out.root.errors();
        assert!(errors
            .iter()
            .any(|e| e.error_message() == Some("unclosed group") && e.text() == "(a + b"));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let out = parse_tree("1 = 2");
        assert!(!out.valid);
        assert_tree(&out.root).child(0, |stmt| {
            stmt.element(CalcKind::ExprStmt)
                .child(0, |bad| bad.is_error().error_message("invalid assignment target"))
        });
    }

    #[test]
    fn test_lex_error_becomes_parse_error() {
        let result = parse("x = @\n");
        assert_eq!(messages(&result), vec!["unexpected token '@'"]);
    }

    #[test]
    fn test_blank_lines_and_comments() {
        let out = parse_tree("\n  // nothing\n\na\n");
        assert!(out.valid);
        assert_tree(&out.root).child_count(1);
    }
}
