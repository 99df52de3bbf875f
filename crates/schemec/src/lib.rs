//! schemec: lexer, parser, binder, gradual type inferencer, and C code
//! generator for a small Scheme-family language.
//!
//! [`Compilation::from_source`] runs every analysis pass and hands back
//! both the compilation and its accumulated diagnostics; [`Compilation::emit_c`]
//! lowers to C afterward, refusing if an earlier pass reported an error.

pub mod ast;
pub mod binder;
pub mod codegen;
pub mod diagnostics;
mod error;
pub mod infer;
mod lexer;
mod parser;

pub use error::{Error, Result};
pub use lexer::Token;

use schemec_support::Interner;

use ast::Ast;
use binder::BindingTable;
use diagnostics::Diagnostics;
use infer::TypeMap;

/// Owns every pass's output for one source file, so a caller can inspect
/// tokens, the AST, resolved bindings, or inferred types without
/// re-running earlier stages.
pub struct Compilation {
    interner: Interner,
    tokens: Vec<Token>,
    ast: Ast,
    binder: BindingTable,
    types: TypeMap,
}

impl Compilation {
    /// Runs the lexer, parser, binder, and inferencer over `source` in
    /// sequence, accumulating every pass's diagnostics into one
    /// collection rather than stopping at the first (spec.md §7: report
    /// as much as possible before giving up).
    pub fn from_source(source: &str) -> (Compilation, Diagnostics) {
        let mut interner = Interner::new();
        let mut diagnostics = Diagnostics::new();

        let tokens = lexer::lex(source, &mut interner, &mut diagnostics);
        let mut ast = parser::parse(&tokens, &mut interner, &mut diagnostics);
        let binder = binder::resolve(&mut ast, &interner, &mut diagnostics);
        let types = infer::infer(&ast, &interner, &binder, &mut diagnostics);

        (Compilation { interner, tokens, ast, binder, types }, diagnostics)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn binder(&self) -> &BindingTable {
        &self.binder
    }

    pub fn types(&self) -> &TypeMap {
        &self.types
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Lowers the compilation to a C translation unit. Refuses (without
    /// touching code generation at all) if `diagnostics` already carries
    /// an `error`-severity message from an earlier pass; codegen can
    /// still add its own (an intrinsic called with the wrong arity, for
    /// instance) since those failures are only discoverable while
    /// lowering.
    pub fn emit_c(&self, diagnostics: &mut Diagnostics) -> Result<String> {
        if diagnostics.has_errors() {
            return Err(Error::DiagnosedFailure(diagnostics.error_count()));
        }
        codegen::generate(&self.ast, &self.interner, &self.binder, &self.types, diagnostics)
    }
}
