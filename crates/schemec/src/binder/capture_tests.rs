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

fn lambda_nodes(ast: &Ast) -> Vec<NodeId> {
    ast.nodes().filter(|(_, node)| matches!(node.kind, NodeKind::Lambda(_))).map(|(id, _)| id).collect()
}

#[test]
fn lambda_with_no_outer_reference_is_not_a_closure() {
    let (ast, _, table, diagnostics) = resolve_source("(lambda (n) n)");
    assert!(!diagnostics.has_errors());

    let [lambda] = lambda_nodes(&ast)[..] else { panic!("expected exactly one lambda") };
    let info = table.lambda_info(lambda).expect("binder annotates every lambda");
    assert!(!info.is_closure());
    assert!(info.free_bindings.is_empty());
}

#[test]
fn lambda_capturing_an_outer_let_binding_is_a_closure() {
    let (ast, _, table, diagnostics) = resolve_source("(let ((n 1)) (lambda () n))");
    assert!(!diagnostics.has_errors());

    let [lambda] = lambda_nodes(&ast)[..] else { panic!("expected exactly one lambda") };
    let info = table.lambda_info(lambda).expect("binder annotates every lambda");
    assert!(info.is_closure());
    assert_eq!(info.free_bindings.len(), 1);
}

#[test]
fn module_scope_bindings_are_never_captured() {
    let (ast, _, table, diagnostics) = resolve_source("(define n 1) (lambda () n)");
    assert!(!diagnostics.has_errors());

    let [lambda] = lambda_nodes(&ast)[..] else { panic!("expected exactly one lambda") };
    let info = table.lambda_info(lambda).unwrap();
    assert!(!info.is_closure(), "a reference to a module-scope define is not a capture");

    let define_node = ast
        .nodes()
        .find_map(|(id, node)| matches!(&node.kind, NodeKind::Define { .. }).then_some(id))
        .unwrap();
    let binding_id = table.define_bindings[&define_node];
    assert!(!table.binding(binding_id).flags.captured);
}

#[test]
fn nested_lambda_captures_through_an_intermediate_scope() {
    let (ast, _, table, diagnostics) = resolve_source("(lambda (outer) (lambda () (lambda () outer)))");
    assert!(!diagnostics.has_errors());

    let lambdas = lambda_nodes(&ast);
    assert_eq!(lambdas.len(), 3);

    // The outermost lambda owns `outer` as a parameter; the two nested
    // lambdas should both report it as a free binding since the
    // innermost one's reference crosses both scope boundaries.
    let closures: Vec<_> = lambdas.iter().filter(|&&l| table.lambda_info(l).unwrap().is_closure()).collect();
    assert_eq!(closures.len(), 2, "both the middle and innermost lambdas capture `outer`");
}

#[test]
fn mutable_and_captured_binding_is_boxed() {
    let (ast, _, table, diagnostics) = resolve_source("(let ((n 0)) (lambda () (set! n (+ n 1))) n)");
    assert!(!diagnostics.has_errors());

    let define_like = ast
        .nodes()
        .find_map(|(id, node)| match &node.kind {
            NodeKind::Let(form) => form.bindings.first().map(|_| id),
            _ => None,
        })
        .unwrap();
    let binding_id = table.let_bindings[&define_like][0];
    let flags = table.binding(binding_id).flags;
    assert!(flags.mutable);
    assert!(flags.captured);
    assert!(flags.boxed);
}
