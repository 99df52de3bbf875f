use schemec_support::Interner;

use super::*;
use crate::ast::{Ast, NodeKind};
use crate::diagnostics::Diagnostics;

fn resolve_source(source: &str) -> (Ast, Interner, BindingTable, Diagnostics) {
    let mut interner = Interner::new();
    let mut diagnostics = Diagnostics::new();
    let tokens = crate::lexer::lex(source, &mut interner, &mut diagnostics);
    let mut ast = crate::parser::parse(&tokens, &mut interner, &mut diagnostics);
    let table = resolve(&mut ast, &interner, &mut diagnostics);
    (ast, interner, table, diagnostics)
}

fn find_identifier(ast: &Ast, interner: &Interner, name: &str) -> NodeId {
    ast.nodes()
        .find(|(_, node)| matches!(&node.kind, NodeKind::Identifier(sym) if interner.resolve(*sym) == name))
        .map(|(id, _)| id)
        .unwrap_or_else(|| panic!("no identifier node named `{name}`"))
}

#[test]
fn define_introduces_a_module_scope_binding() {
    let (ast, interner, table, diagnostics) = resolve_source("(define x 1) x");
    assert!(!diagnostics.has_errors());

    let reference = find_identifier(&ast, &interner, "x");
    let binding_id = table.resolution(reference).expect("x should resolve");
    assert_eq!(interner.resolve(table.binding(binding_id).name), "x");
}

#[test]
fn lambda_parameter_shadows_outer_binding() {
    let (ast, interner, table, diagnostics) = resolve_source("(define x 1) (lambda (x) x)");
    assert!(!diagnostics.has_errors());

    let outer_define = ast
        .nodes()
        .find_map(|(id, node)| matches!(&node.kind, NodeKind::Define { .. }).then_some(id))
        .unwrap();
    let outer_binding = table.define_bindings[&outer_define];

    let inner_reference = ast
        .nodes()
        .filter(|(_, node)| matches!(&node.kind, NodeKind::Identifier(sym) if interner.resolve(*sym) == "x"))
        .last()
        .map(|(id, _)| id)
        .unwrap();
    let inner_binding = table.resolution(inner_reference).unwrap();

    assert_ne!(outer_binding, inner_binding, "the parameter should shadow the module-level define");
}

#[test]
fn letrec_bindings_are_visible_to_every_clause() {
    let (ast, interner, table, diagnostics) = resolve_source("(letrec ((even? (lambda (n) n)) (odd? (lambda (n) even?))) odd?)");
    assert!(!diagnostics.has_errors());

    let reference = find_identifier(&ast, &interner, "even?");
    assert!(table.resolution(reference).is_some(), "odd?'s body should see even? via letrec");
}

#[test]
fn unresolved_identifier_is_reported_as_a_diagnostic() {
    let (_, _, _, diagnostics) = resolve_source("totally-undefined-name");
    assert!(diagnostics.has_errors());
}

#[test]
fn set_target_resolves_like_any_other_identifier() {
    let (ast, interner, table, diagnostics) = resolve_source("(define x 1) (lambda () (set! x 2))");
    assert!(!diagnostics.has_errors());

    let target = ast
        .nodes()
        .find_map(|(_, node)| match &node.kind {
            NodeKind::Set { target, .. } => Some(*target),
            _ => None,
        })
        .unwrap();
    let binding_id = table.resolution(target).expect("set! target should resolve");
    assert!(table.binding(binding_id).flags.mutable);
    let _ = interner;
}
