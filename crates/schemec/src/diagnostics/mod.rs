//! Diagnostics infrastructure shared by every pipeline stage.
//!
//! Each stage (lexer, parser, binder, inferencer, codegen) takes a
//! `&mut Diagnostics` and reports into it rather than returning `Result`
//! for recoverable failures — only [`crate::error::Error`] stops the
//! pipeline outright.

mod collection;
mod message;
mod printer;

pub use collection::{DiagnosticBuilder, Diagnostics};
pub use message::{DiagnosticMessage, Severity};
pub use printer::DiagnosticsPrinter;
