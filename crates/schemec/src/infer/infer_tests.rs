use schemec_support::Interner;

use super::*;
use crate::ast::{Ast, NodeKind};
use crate::binder::BindingTable;
use crate::diagnostics::Diagnostics;

fn infer_source(source: &str) -> (Ast, Interner, BindingTable, TypeMap, Diagnostics) {
    let mut interner = Interner::new();
    let mut diagnostics = Diagnostics::new();
    let tokens = crate::lexer::lex(source, &mut interner, &mut diagnostics);
    let mut ast = crate::parser::parse(&tokens, &mut interner, &mut diagnostics);
    let binder = crate::binder::resolve(&mut ast, &interner, &mut diagnostics);
    let types = infer(&ast, &interner, &binder, &mut diagnostics);
    (ast, interner, binder, types, diagnostics)
}

fn top_level_forms(ast: &Ast) -> &[crate::ast::NodeId] {
    match &ast.node(ast.program.unwrap()).kind {
        NodeKind::Program(forms) => forms,
        _ => panic!("program root should always be NodeKind::Program"),
    }
}

#[test]
fn literals_get_their_ground_type() {
    let (ast, _, _, types, diagnostics) = infer_source("1 1.5 #t \"hi\" #\\a");
    assert!(!diagnostics.has_errors());

    let forms = top_level_forms(&ast);
    assert_eq!(types[&forms[0]], Type::Integer);
    assert_eq!(types[&forms[1]], Type::Float);
    assert_eq!(types[&forms[2]], Type::Bool);
    assert_eq!(types[&forms[3]], Type::String);
    assert_eq!(types[&forms[4]], Type::Char);
}

#[test]
fn lambda_infers_a_function_type() {
    let (ast, _, _, types, diagnostics) = infer_source("(lambda (n) n)");
    assert!(!diagnostics.has_errors());

    let lambda = top_level_forms(&ast)[0];
    assert!(matches!(types[&lambda], Type::Function(_, _)));
}

#[test]
fn mixed_arithmetic_promotes_to_float() {
    let (ast, _, _, types, diagnostics) = infer_source("(+ 1 2.0)");
    assert!(!diagnostics.has_errors());

    let call = top_level_forms(&ast)[0];
    assert_eq!(types[&call], Type::Float);
}

#[test]
fn all_integer_arithmetic_stays_integer() {
    let (ast, _, _, types, diagnostics) = infer_source("(+ 1 2 3)");
    assert!(!diagnostics.has_errors());

    let call = top_level_forms(&ast)[0];
    assert_eq!(types[&call], Type::Integer);
}

#[test]
fn an_unconstrained_binding_widens_to_unknown() {
    let (ast, _, _, types, diagnostics) = infer_source("(lambda (n) n)");
    assert!(!diagnostics.has_errors());
    assert!(diagnostics.iter().any(|d| d.text().contains("widened to")));

    // The parameter itself is never constrained against anything ground,
    // so its function type's argument widens to `unknown`.
    let lambda = top_level_forms(&ast)[0];
    match &types[&lambda] {
        Type::Function(params, _) => assert_eq!(params[0], Type::Unknown),
        other => panic!("expected a function type, found {other}"),
    }
}

#[test]
fn set_onto_a_differently_typed_value_is_a_warning_not_an_error() {
    let (_, _, _, _, diagnostics) = infer_source(r#"(let (([x : integer] 0)) (set! x "oops"))"#);
    assert!(!diagnostics.has_errors(), "a type mismatch is recoverable, not a pipeline-stopping error");
    assert!(diagnostics.has_warnings());
}

#[test]
fn a_declared_signature_constrains_its_define() {
    let (ast, _, _, types, diagnostics) = infer_source("(: f (-> integer integer)) (define f (lambda (x) x))");
    assert!(!diagnostics.has_errors());

    let lambda = top_level_forms(&ast)
        .iter()
        .find(|&&id| matches!(ast.node(id).kind, NodeKind::Define { .. }))
        .map(|&id| match &ast.node(id).kind {
            NodeKind::Define { value, .. } => *value,
            _ => unreachable!(),
        })
        .unwrap();
    assert_eq!(types[&lambda], Type::Function(vec![Type::Integer], Box::new(Type::Integer)));
    let _ = &ast;
}
