//! Errors that stop the pipeline outright.
//!
//! Most failures (lexical, parse, unresolved identifier, type mismatch,
//! ambiguous type) are recoverable and go into [`crate::diagnostics::Diagnostics`]
//! instead. Only the two kinds below actually abort a compilation.

use thiserror::Error;

/// A failure that stops the pipeline instead of merely being recorded as
/// a diagnostic.
#[derive(Debug, Error)]
pub enum Error {
    /// The code generator hit an AST node it has no lowering for.
    #[error("code generator cannot lower this form: {0}")]
    UnsupportedForm(String),

    /// Reading source or writing generated output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An earlier pass reported `error`-severity diagnostics; pipeline
    /// progression into code generation was refused.
    #[error("compilation has {0} error diagnostic(s); not proceeding")]
    DiagnosedFailure(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
