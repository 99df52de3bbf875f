//! Gradual type inference (spec.md §4.4).
//!
//! One constraint-generation walk ([`constrain`]) feeds a union-find
//! solver ([`unify`]); [`operators`] is the shared intrinsic-name table
//! also used by the binder (to recognize a call head as an intrinsic) and
//! the code generator (to lower it to a runtime call).

mod constrain;
pub(crate) mod operators;
#[cfg(test)]
mod infer_tests;
mod types;
mod unify;

use std::collections::HashMap;

use schemec_support::Interner;

use crate::ast::{Ast, NodeId};
use crate::binder::BindingTable;
use crate::diagnostics::Diagnostics;

pub use types::Type;
pub use unify::TypeVarId;

/// Every expression node's solved (and widened) type, plus `Void` for
/// statement-shaped nodes that don't produce a value.
pub type TypeMap = HashMap<NodeId, Type>;

/// Runs inference over the whole program, given the binder's resolved
/// scope/binding table. Never fails the pipeline itself — type mismatches
/// are reported as warnings and the offending node widens to `Unknown`
/// (see [`unify::UnionFind::unify`]).
pub fn infer(ast: &Ast, interner: &Interner, binder: &BindingTable, diagnostics: &mut Diagnostics) -> TypeMap {
    constrain::run(ast, interner, binder, diagnostics)
}
