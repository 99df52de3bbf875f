//! C code generation (spec.md §5/§6): lowers a bound, type-inferred AST
//! into a single C translation unit built around the fixed preamble's
//! runtime surface.

mod closures;
mod emitter;
mod intrinsics;
mod lower;
mod names;
mod preamble;
mod types;

#[cfg(test)]
mod codegen_tests;

use schemec_support::Interner;

use crate::ast::Ast;
use crate::binder::BindingTable;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::infer::TypeMap;

pub(crate) const EXIT_SUCCESS: i32 = 0;

/// Generates the full C translation unit for `ast`, or an
/// [`Error::UnsupportedForm`] if a construct with no lowering was
/// reached (arity-mismatched intrinsic calls, a nested `define` in
/// expression position, an identifier the binder couldn't resolve —
/// every such failure is also reported through `diagnostics` before this
/// returns).
pub fn generate(ast: &Ast, interner: &Interner, binder: &BindingTable, types: &TypeMap, diagnostics: &mut Diagnostics) -> Result<String> {
    let mut lowering = lower::Lowering::new(ast, interner, binder, types, diagnostics);
    let body = lowering.generate();
    if lowering.failed() || body.is_none() {
        return Err(Error::UnsupportedForm("one or more forms could not be lowered to C; see diagnostics".to_string()));
    }
    Ok(format!("{}\n{}", preamble::PREAMBLE, body.expect("checked above")))
}
