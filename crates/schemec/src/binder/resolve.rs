//! Pass 1: scope construction and binding introduction.
//!
//! A single recursive descent over the AST, carrying a stack of active
//! scopes. `define` (at module level or nested inside a `begin`-like
//! sequence) is pre-declared relative to its enclosing sequence so sibling
//! forms can reference each other before their own value is visited —
//! this is what lets mutual top-level recursion (`even?`/`odd?`) resolve
//! without a separate forward-declaration step.

use std::collections::HashMap;

use schemec_support::{Interner, Symbol};

use crate::ast::{Ast, LambdaForm, LetForm, LetKind, NodeId, NodeKind};
use crate::binder::binding::{Binding, BindingId};
use crate::binder::scope::{Scope, ScopeId, ScopeKind};
use crate::binder::{BindingTable, LambdaInfo};
use crate::diagnostics::Diagnostics;
use crate::infer::operators;

pub fn run(ast: &mut Ast, interner: &Interner, diagnostics: &mut Diagnostics, table: &mut BindingTable) {
    let Some(program) = ast.program else { return };
    let mut resolver = Resolver {
        ast,
        interner,
        diagnostics,
        table,
        stack: Vec::new(),
        scope_bindings: HashMap::new(),
    };
    let module_scope = resolver.push_scope(ScopeKind::Module, program);
    resolver.table.module_scope = Some(module_scope);
    let NodeKind::Program(forms) = resolver.ast.node(program).kind.clone() else {
        unreachable!("Ast::program always points at a Program node")
    };
    resolver.visit_sequence(&forms, true);
    resolver.pop_scope();
}

struct Resolver<'a, 'd> {
    ast: &'a mut Ast,
    interner: &'a Interner,
    diagnostics: &'d mut Diagnostics,
    table: &'a mut BindingTable,
    stack: Vec<ScopeId>,
    scope_bindings: HashMap<ScopeId, HashMap<Symbol, BindingId>>,
}

impl Resolver<'_, '_> {
    fn current_scope(&self) -> ScopeId {
        *self.stack.last().expect("at least the module scope is always active")
    }

    fn push_scope(&mut self, kind: ScopeKind, introducing_node: NodeId) -> ScopeId {
        let parent = self.stack.last().copied();
        let id = self.table.scopes.alloc(Scope { parent, introducing_node, kind });
        self.scope_bindings.insert(id, HashMap::new());
        self.stack.push(id);
        id
    }

    fn pop_scope(&mut self) {
        self.stack.pop();
    }

    fn declare_binding(&mut self, scope: ScopeId, name: Symbol, node: NodeId, parameter: bool) -> BindingId {
        let id = self.table.bindings.alloc(Binding {
            scope_id: scope,
            name,
            flags: crate::binder::binding::BindingFlags { parameter, ..Default::default() },
            defining_node_id: node,
            being_initialized: false,
        });
        self.scope_bindings.get_mut(&scope).expect("scope was pushed before use").insert(name, id);
        id
    }

    /// Declares `name` in `scope` unless it's already there (idempotent
    /// re-entry point for both the sequence prescan and a lone
    /// non-sequence `define`).
    fn ensure_declared(&mut self, scope: ScopeId, name: Symbol, node: NodeId) -> BindingId {
        if let Some(&id) = self.scope_bindings.get(&scope).and_then(|m| m.get(&name)) {
            id
        } else {
            self.declare_binding(scope, name, node, false)
        }
    }

    fn lookup(&self, name: Symbol) -> Option<BindingId> {
        for &scope in self.stack.iter().rev() {
            if let Some(&id) = self.scope_bindings.get(&scope).and_then(|m| m.get(&name)) {
                return Some(id);
            }
        }
        None
    }

    /// Visits a sequence of sibling forms (a `Program`'s forms or a
    /// `Begin`'s exprs), pre-declaring any direct `define` among them
    /// first so forward and mutual references resolve.
    fn visit_sequence(&mut self, exprs: &[NodeId], toplevel: bool) {
        let scope = self.current_scope();
        let mut seen = HashMap::new();
        for &id in exprs {
            if let NodeKind::Define { name, name_span, .. } = self.ast.node(id).kind.clone() {
                if toplevel {
                    if let Some(prev) = seen.insert(name, name_span) {
                        let _ = prev;
                        self.diagnostics
                            .warning(name_span, format!("duplicate top-level definition of `{}`", self.interner.resolve(name)))
                            .emit();
                    }
                }
                let binding_id = self.ensure_declared(scope, name, id);
                self.table.define_bindings.insert(id, binding_id);
            }
        }
        for &id in exprs {
            self.visit_expr(id);
        }
    }

    fn visit_expr(&mut self, node: NodeId) {
        match self.ast.node(node).kind.clone() {
            NodeKind::IntegerLiteral(_)
            | NodeKind::FloatLiteral(_)
            | NodeKind::BoolLiteral(_)
            | NodeKind::StringLiteral(_)
            | NodeKind::CharLiteral(_)
            | NodeKind::Quote(_)
            | NodeKind::TypeDeclaration { .. }
            | NodeKind::Erroneous => {}
            NodeKind::Identifier(sym) => self.resolve_identifier(node, sym),
            NodeKind::Lambda(form) => self.visit_lambda(node, form),
            NodeKind::Define { name, value, .. } => {
                let scope = self.current_scope();
                let binding_id = self.ensure_declared(scope, name, node);
                self.table.define_bindings.insert(node, binding_id);
                self.visit_expr(value);
            }
            NodeKind::If(f) => {
                self.visit_expr(f.test);
                self.visit_expr(f.consequent);
                if let Some(alt) = f.alternate {
                    self.visit_expr(alt);
                }
            }
            NodeKind::Let(f) => self.visit_let(node, f),
            NodeKind::Set { target, value } => self.visit_set(target, value),
            NodeKind::Begin(exprs) => self.visit_sequence(&exprs, false),
            NodeKind::And(exprs) | NodeKind::Or(exprs) => {
                for e in exprs {
                    self.visit_expr(e);
                }
            }
            NodeKind::Call(c) => {
                self.visit_call_callee(c.callee);
                for a in c.args {
                    self.visit_expr(a);
                }
            }
            NodeKind::Program(forms) => self.visit_sequence(&forms, true),
        }
    }

    /// A call's callee gets one extra allowance: an unresolved identifier
    /// that names a known intrinsic (`+`, `display`, `gradient`, ...) is
    /// not a binding at all and is left unresolved silently, so the
    /// inferencer and code generator can dispatch it by name. A user
    /// binding of the same name still wins normal lexical lookup.
    fn visit_call_callee(&mut self, callee: NodeId) {
        if let NodeKind::Identifier(sym) = self.ast.node(callee).kind {
            if self.lookup(sym).is_none() && operators::lookup(self.interner.resolve(sym)).is_some() {
                return;
            }
        }
        self.visit_expr(callee);
    }

    fn resolve_identifier(&mut self, node: NodeId, sym: Symbol) {
        match self.lookup(sym) {
            Some(binding_id) => {
                self.table.identifier_bindings.insert(node, binding_id);
            }
            None => {
                let span = self.ast.node(node).span;
                let name = self.interner.resolve(sym);
                self.diagnostics.error(span, format!("unresolved identifier `{name}`")).emit();
                self.ast.node_mut(node).kind = NodeKind::Erroneous;
            }
        }
    }

    fn visit_lambda(&mut self, node: NodeId, form: LambdaForm) {
        let scope = self.push_scope(ScopeKind::Lambda, node);
        let mut parameter_bindings = Vec::with_capacity(form.params.len());
        for param in &form.params {
            parameter_bindings.push(self.declare_binding(scope, param.name, node, true));
        }
        self.table.lambdas.insert(
            node,
            LambdaInfo {
                free_bindings: Default::default(),
                parameter_bindings,
                introduced_scope: scope,
            },
        );
        self.visit_expr(form.body);
        self.pop_scope();
    }

    fn visit_let(&mut self, node: NodeId, form: LetForm) {
        match form.kind {
            LetKind::Let => {
                for b in &form.bindings {
                    self.visit_expr(b.value);
                }
                let scope = self.push_scope(ScopeKind::Let, node);
                let mut ids = Vec::with_capacity(form.bindings.len());
                for b in &form.bindings {
                    ids.push(self.declare_binding(scope, b.name, node, false));
                }
                self.table.let_bindings.insert(node, ids);
                self.visit_expr(form.body);
                self.pop_scope();
            }
            LetKind::LetStar => {
                let mut ids = Vec::with_capacity(form.bindings.len());
                for b in &form.bindings {
                    self.visit_expr(b.value);
                    let scope = self.push_scope(ScopeKind::Let, node);
                    ids.push(self.declare_binding(scope, b.name, node, false));
                }
                self.table.let_bindings.insert(node, ids.clone());
                self.visit_expr(form.body);
                for _ in 0..form.bindings.len() {
                    self.pop_scope();
                }
            }
            LetKind::LetRec => {
                let scope = self.push_scope(ScopeKind::LetRec, node);
                let mut ids = Vec::with_capacity(form.bindings.len());
                for b in &form.bindings {
                    let id = self.declare_binding(scope, b.name, node, false);
                    self.table.bindings.get_mut(id).being_initialized = true;
                    ids.push(id);
                }
                self.table.let_bindings.insert(node, ids.clone());
                for b in &form.bindings {
                    self.visit_expr(b.value);
                }
                for id in ids {
                    self.table.bindings.get_mut(id).being_initialized = false;
                }
                self.visit_expr(form.body);
                self.pop_scope();
            }
        }
    }

    fn visit_set(&mut self, target: NodeId, value: NodeId) {
        self.visit_expr(target);
        if let Some(&binding_id) = self.table.identifier_bindings.get(&target) {
            self.table.bindings.get_mut(binding_id).flags.mutable = true;
        }
        self.visit_expr(value);
    }
}
