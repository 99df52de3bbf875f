//! Bindings: one per `define`, `lambda` parameter, and `let`/`let*`/`letrec`
//! clause.

use schemec_support::{Idx, Symbol};

use crate::ast::NodeId;
use crate::binder::scope::ScopeId;

pub type BindingId = Idx<Binding>;

#[derive(Debug, Clone, Copy, Default)]
pub struct BindingFlags {
    /// Set the moment a `set!` targets this binding, even on its first
    /// assignment — mutability is discovered, not declared.
    pub mutable: bool,
    /// Set by the capture-analysis pass when some lambda's body refers to
    /// this binding across that lambda's scope boundary.
    pub captured: bool,
    pub parameter: bool,
    /// `mutable && captured`, computed once both passes have run. A boxed
    /// binding is heap-allocated so every closure sharing it observes the
    /// same cell.
    pub boxed: bool,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub scope_id: ScopeId,
    pub name: Symbol,
    pub flags: BindingFlags,
    pub defining_node_id: NodeId,
    /// True between a `letrec` binding's declaration and the end of its
    /// own initializer; resolving a reference while this is set is a
    /// legal recursive/mutual reference, not an error.
    pub being_initialized: bool,
}
