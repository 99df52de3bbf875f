//! Lexical scopes introduced by `Program`, `Lambda`, `Let`, `Let*`, and `LetRec`.

use schemec_support::Idx;

use crate::ast::NodeId;

pub type ScopeId = Idx<Scope>;

/// `Let*` chains one scope per binding, but they carry kind `Let` like a
/// plain `let` scope — the chain shape only matters during resolution,
/// not to later passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Lambda,
    Let,
    LetRec,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub introducing_node: NodeId,
    pub kind: ScopeKind,
}
