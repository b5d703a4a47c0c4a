//! Precedence and associativity tables for the Pratt engine
//!
//! Each case parses one expression with the calc grammar and compares the tree in
//! s-expression form.

use rstest::rstest;
use synkit::synkit::building::{NodeKind, SyntaxNode};
use synkit::synkit::testing::calc::{self, CalcKind};

fn sexpr(node: &SyntaxNode<CalcKind>) -> String {
    match node.kind() {
        NodeKind::Element(CalcKind::Name | CalcKind::Number | CalcKind::Bool | CalcKind::Str) => {
            node.text()
        }
        NodeKind::Element(CalcKind::Group) => node
            .child_nodes()
            .map(sexpr)
            .collect::<Vec<_>>()
            .join(" "),
        NodeKind::Element(kind) => {
            let operands: Vec<String> = node.child_nodes().map(sexpr).collect();
            format!("({:?} {})", kind, operands.join(" "))
        }
        NodeKind::Error { message, .. } => format!("<{}>", message),
        NodeKind::Root => node.child_nodes().map(sexpr).collect::<Vec<_>>().join("; "),
    }
}

/// Parse a single expression statement and render its expression
fn render(source: &str) -> String {
    let out = calc::parse_tree(source);
    assert!(out.valid, "{:?} did not parse cleanly", source);
    let stmt = out
        .root
        .child_nodes()
        .next()
        .unwrap_or_else(|| panic!("{:?} produced no statement", source));
    assert_eq!(stmt.element_kind(), Some(CalcKind::ExprStmt));
    stmt.child_nodes().map(sexpr).collect::<Vec<_>>().join(" ")
}

#[rstest]
#[case("1 + 2 * 3", "(Add 1 (Mul 2 3))")]
#[case("2 * 3 + 1", "(Add (Mul 2 3) 1)")]
#[case("1 - 2 - 3", "(Sub (Sub 1 2) 3)")]
#[case("8 / 4 / 2", "(Div (Div 8 4) 2)")]
#[case("a + b * (c - 1)", "(Add a (Mul b (Sub c 1)))")]
#[case("(1 + 2) * 3", "(Mul (Add 1 2) 3)")]
#[case("1 << 2 + 3", "(Shl 1 (Add 2 3))")]
#[case("a < b == c > d", "(Eq (Lt a b) (Gt c d))")]
#[case("a | b ^ c & d", "(BitOr a (BitXor b (BitAnd c d)))")]
#[case("a || b && c", "(Or a (And b c))")]
#[case("a && b || c", "(Or (And a b) c)")]
fn test_binary_precedence(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(render(source), expected);
}

#[rstest]
#[case("2 ** 3 ** 2", "(Pow 2 (Pow 3 2))")]
#[case("a = b = c", "(Assign a (Assign b c))")]
#[case("a ?: b ?: c", "(Elvis a (Elvis b c))")]
#[case("a ? b : c ? d : e", "(Cond a b (Cond c d e))")]
fn test_right_associative(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(render(source), expected);
}

#[rstest]
#[case("-a * b", "(Mul (Neg a) b)")]
#[case("-2 ** 2", "(Pow (Neg 2) 2)")]
#[case("!a && b", "(And (Not a) b)")]
#[case("- -a", "(Neg (Neg a))")]
#[case("~a | b", "(BitOr (BitNot a) b)")]
fn test_prefix_operators(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(render(source), expected);
}

#[rstest]
#[case("x = a ? b : c", "(Assign x (Cond a b c))")]
#[case("a ? b + 1 : c * 2", "(Cond a (Add b 1) (Mul c 2))")]
#[case("x = y ?: 0", "(Assign x (Elvis y 0))")]
fn test_ternary_and_assignment(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(render(source), expected);
}

#[rstest]
#[case("1 +", "expected expression")]
#[case("* 2", "unexpected token '*'")]
#[case("a ? b", "expected ':'")]
#[case("(a", "expected ')'")]
fn test_expression_errors(#[case] source: &str, #[case] message: &str) {
    let result = calc::parse(source);
    let messages: Vec<&str> = result.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec![message]);
}

#[test]
fn test_trailing_trivia_stays_outside_expression() {
    let out = calc::parse_tree("a + b   // sum\n");
    let stmt = out.root.child_nodes().next().map(|n| n.range());
    assert_eq!(stmt.map(|r| (r.start, r.end)), Some((0, 5)));
}
