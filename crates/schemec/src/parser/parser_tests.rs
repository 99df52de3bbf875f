use schemec_support::Interner;

use super::parse;
use crate::ast::{Ast, NodeKind};
use crate::diagnostics::Diagnostics;

fn parse_source(source: &str) -> (Ast, Interner, Diagnostics) {
    let mut interner = Interner::new();
    let mut diagnostics = Diagnostics::new();
    let tokens = crate::lexer::lex(source, &mut interner, &mut diagnostics);
    let ast = parse(&tokens, &mut interner, &mut diagnostics);
    (ast, interner, diagnostics)
}

fn program_forms(ast: &Ast) -> &[crate::ast::NodeId] {
    match &ast.node(ast.program.unwrap()).kind {
        NodeKind::Program(forms) => forms,
        _ => panic!("program root should always be NodeKind::Program"),
    }
}

#[test]
fn empty_source_still_produces_a_program_node() {
    let (ast, _, diagnostics) = parse_source("");
    assert!(!diagnostics.has_errors());
    assert!(program_forms(&ast).is_empty());
}

#[test]
fn a_bare_atom_parses_as_one_top_level_form() {
    let (ast, _, diagnostics) = parse_source("42");
    assert!(!diagnostics.has_errors());
    let forms = program_forms(&ast);
    assert_eq!(forms.len(), 1);
    assert!(matches!(ast.node(forms[0]).kind, NodeKind::IntegerLiteral(42)));
}

#[test]
fn define_shorthand_desugars_to_a_lambda_value() {
    let (ast, _, diagnostics) = parse_source("(define (add a b) (+ a b))");
    assert!(!diagnostics.has_errors());
    let forms = program_forms(&ast);
    assert_eq!(forms.len(), 1);
    match &ast.node(forms[0]).kind {
        NodeKind::Define { value, .. } => {
            assert!(matches!(ast.node(*value).kind, NodeKind::Lambda(_)));
        }
        other => panic!("expected a Define node, found {other:?}"),
    }
}

#[test]
fn mismatched_closer_is_reported_but_the_call_still_recovers() {
    let (ast, _, diagnostics) = parse_source("(+ 1 2]");
    assert!(diagnostics.has_errors());
    let forms = program_forms(&ast);
    assert!(matches!(ast.node(forms[0]).kind, NodeKind::Call(_)), "a bad closer alone shouldn't poison an otherwise well-formed call");
}

#[test]
fn unterminated_list_reports_one_error_and_recovers_at_eof() {
    let (_, _, diagnostics) = parse_source("(+ 1 2");
    assert!(diagnostics.has_errors());
}

#[test]
fn deeply_nested_parens_hit_the_recursion_limit_instead_of_overflowing() {
    let nested = "(".repeat(400) + "1" + &")".repeat(400);
    let (_, _, diagnostics) = parse_source(&nested);
    assert!(diagnostics.has_errors());
}

#[test]
fn quote_shorthand_parses_to_a_quote_node() {
    let (ast, _, diagnostics) = parse_source("'(1 2 3)");
    assert!(!diagnostics.has_errors());
    let forms = program_forms(&ast);
    assert!(matches!(ast.node(forms[0]).kind, NodeKind::Quote(_)));
}
