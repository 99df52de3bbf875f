//! Pass 2: capture analysis.
//!
//! A second descent over the AST, this time carrying a stack of
//! *currently open lambdas* instead of scopes. Every `Identifier`
//! reference is checked against each open lambda in turn: if the
//! reference's binding was introduced in a non-module scope that is a
//! strict ancestor of that lambda's own scope, the binding is free with
//! respect to that lambda and gets added to its `free_bindings` set.
//!
//! Module-scope bindings are never captures — a top-level `define`
//! referenced from inside a lambda is an ordinary global reference, not
//! an environment capture, regardless of how many lambdas enclose the
//! reference.

use crate::ast::{Ast, NodeId, NodeKind};
use crate::binder::scope::ScopeKind;
use crate::binder::BindingTable;

pub fn run(ast: &Ast, table: &mut BindingTable) {
    let Some(program) = ast.program else { return };
    let mut visitor = CaptureVisitor { ast, table, lambda_stack: Vec::new() };
    visitor.visit(program);
}

struct CaptureVisitor<'a> {
    ast: &'a Ast,
    table: &'a mut BindingTable,
    lambda_stack: Vec<NodeId>,
}

impl CaptureVisitor<'_> {
    fn visit(&mut self, node: NodeId) {
        match self.ast.node(node).kind.clone() {
            NodeKind::Identifier(_) => self.record_reference(node),
            NodeKind::Lambda(form) => {
                self.lambda_stack.push(node);
                self.visit(form.body);
                self.lambda_stack.pop();
            }
            NodeKind::Define { value, .. } => self.visit(value),
            NodeKind::If(f) => {
                self.visit(f.test);
                self.visit(f.consequent);
                if let Some(alt) = f.alternate {
                    self.visit(alt);
                }
            }
            NodeKind::Let(f) => {
                for b in &f.bindings {
                    self.visit(b.value);
                }
                self.visit(f.body);
            }
            NodeKind::Set { target, value } => {
                self.visit(target);
                self.visit(value);
            }
            NodeKind::Begin(exprs) | NodeKind::And(exprs) | NodeKind::Or(exprs) => {
                for e in exprs {
                    self.visit(e);
                }
            }
            NodeKind::Call(c) => {
                self.visit(c.callee);
                for a in c.args {
                    self.visit(a);
                }
            }
            NodeKind::Program(forms) => {
                for f in forms {
                    self.visit(f);
                }
            }
            NodeKind::IntegerLiteral(_)
            | NodeKind::FloatLiteral(_)
            | NodeKind::BoolLiteral(_)
            | NodeKind::StringLiteral(_)
            | NodeKind::CharLiteral(_)
            | NodeKind::Quote(_)
            | NodeKind::TypeDeclaration { .. }
            | NodeKind::Erroneous => {}
        }
    }

    fn record_reference(&mut self, node: NodeId) {
        let Some(&binding_id) = self.table.identifier_bindings.get(&node) else { return };
        let defining_scope = self.table.binding(binding_id).scope_id;
        if self.table.scope(defining_scope).kind == ScopeKind::Module {
            return;
        }
        let lambdas = self.lambda_stack.clone();
        for lambda_id in lambdas {
            let Some(lambda_scope) = self.table.lambda_info(lambda_id).map(|i| i.introduced_scope) else {
                continue;
            };
            if self.table.is_strict_ancestor(defining_scope, lambda_scope) {
                self.table
                    .lambdas
                    .get_mut(&lambda_id)
                    .expect("looked up above")
                    .free_bindings
                    .insert(binding_id);
                self.table.bindings.get_mut(binding_id).flags.captured = true;
            }
        }
    }
}
