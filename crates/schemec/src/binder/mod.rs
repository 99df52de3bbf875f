//! Binding resolution: turns every `Identifier` reference into a
//! `BindingId` and annotates every `Lambda` with what it captures.
//!
//! Two passes share one [`BindingTable`] (spec.md §4.3): [`resolve`]
//! walks the AST once to build the scope tree and declare bindings
//! ([`resolve_identifier`](resolve) resolving every reference along the
//! way), then [`capture`] walks it a second time to compute each
//! lambda's free-variable set.

mod binding;
mod capture;
mod resolve;
#[cfg(test)]
mod resolve_tests;
#[cfg(test)]
mod capture_tests;
mod scope;

pub use binding::{Binding, BindingFlags, BindingId};
pub use scope::{Scope, ScopeId, ScopeKind};

use std::collections::HashMap;

use indexmap::IndexSet;
use schemec_support::{Arena, Interner};

use crate::ast::{Ast, NodeId};
use crate::diagnostics::Diagnostics;

/// Per-lambda capture info computed by the binder's second pass.
#[derive(Debug, Clone, Default)]
pub struct LambdaInfo {
    /// Outer bindings this lambda reads or writes across its own scope
    /// boundary, in first-reference order (an `IndexSet` so the
    /// generated closure environment's field order is deterministic).
    pub free_bindings: IndexSet<BindingId>,
    /// This lambda's own parameter bindings, in declaration order.
    pub parameter_bindings: Vec<BindingId>,
    pub introduced_scope: ScopeId,
}

impl LambdaInfo {
    pub fn is_closure(&self) -> bool {
        !self.free_bindings.is_empty()
    }
}

/// Everything the binder produces: the scope/binding arenas, plus the
/// per-node side tables every later pass reads instead of mutating the
/// AST.
#[derive(Debug, Default)]
pub struct BindingTable {
    pub scopes: Arena<Scope>,
    pub bindings: Arena<Binding>,
    /// Every resolved `Identifier` node, including `Set`'s `target`.
    pub identifier_bindings: HashMap<NodeId, BindingId>,
    pub lambdas: HashMap<NodeId, LambdaInfo>,
    /// A `define` node's own binding (module-level or nested).
    pub define_bindings: HashMap<NodeId, BindingId>,
    /// A `let`/`let*`/`letrec` node's bindings, in declaration order.
    pub let_bindings: HashMap<NodeId, Vec<BindingId>>,
    pub module_scope: Option<ScopeId>,
}

impl BindingTable {
    pub fn binding(&self, id: BindingId) -> &Binding {
        self.bindings.get(id)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        self.scopes.get(id)
    }

    pub fn resolution(&self, node: NodeId) -> Option<BindingId> {
        self.identifier_bindings.get(&node).copied()
    }

    pub fn lambda_info(&self, node: NodeId) -> Option<&LambdaInfo> {
        self.lambdas.get(&node)
    }

    /// True iff `ancestor` is a strict ancestor of `scope` in the scope
    /// forest (i.e. `scope` is nested inside `ancestor`, not equal to it).
    pub fn is_strict_ancestor(&self, ancestor: ScopeId, mut scope: ScopeId) -> bool {
        while let Some(parent) = self.scope(scope).parent {
            if parent == ancestor {
                return true;
            }
            scope = parent;
        }
        false
    }
}

/// Runs both binder passes over `ast`, resolving every `Identifier` to a
/// [`BindingId`] and flagging every `Lambda`'s captured variables. Also
/// finalizes the derived `boxed` flag (`mutable && captured`) on every
/// binding once both passes have run.
pub fn resolve(ast: &mut Ast, interner: &Interner, diagnostics: &mut Diagnostics) -> BindingTable {
    let mut table = BindingTable::default();
    resolve::run(ast, interner, diagnostics, &mut table);
    capture::run(ast, &mut table);
    for (_, binding) in table.bindings.iter_mut() {
        binding.flags.boxed = binding.flags.mutable && binding.flags.captured;
    }
    table
}
