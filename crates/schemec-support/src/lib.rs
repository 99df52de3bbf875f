//! Shared low-level infrastructure for the schemec pipeline.
//!
//! - `interner` — string interning (`Symbol`, `Interner`)
//! - `arena` — bump-style, whole-region-freed storage for arena-owned collections
//! - `span` — source positions and ranges carried on every token and AST node

mod arena;
mod interner;
mod span;

pub use arena::{Arena, Idx};
pub use interner::{Interner, Symbol};
pub use span::{Position, Span};
