//! Recursive-descent, pull-model parser: token stream to untyped AST.

mod grammar;

#[cfg(test)]
mod parser_tests;

use schemec_support::{Interner, Span};

use crate::ast::{Ast, NodeId, NodeKind};
use crate::diagnostics::Diagnostics;
use crate::lexer::{Token, TokenKind};

/// Bounds form nesting so a pathological `(((((...` input fails with a
/// diagnostic instead of overflowing the native call stack.
const MAX_RECURSION_DEPTH: u32 = 256;

pub(crate) struct Parser<'t, 'd> {
    tokens: &'t [Token],
    pos: usize,
    ast: Ast,
    interner: &'d mut Interner,
    diagnostics: &'d mut Diagnostics,
    depth: u32,
}

/// Parses a full token stream into a `Program` AST. Always returns an
/// `Ast` with `program` set, even if every form inside it is `Erroneous`.
pub fn parse(tokens: &[Token], interner: &mut Interner, diagnostics: &mut Diagnostics) -> Ast {
    let mut parser = Parser {
        tokens,
        pos: 0,
        ast: Ast::new(),
        interner,
        diagnostics,
        depth: 0,
    };
    parser.parse_program();
    parser.ast
}

impl<'t, 'd> Parser<'t, 'd> {
    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    fn at_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    /// Advances past the current token and returns it, unless already at
    /// `Eof` (which is never consumed — it always remains available as a
    /// boundary marker).
    fn bump(&mut self) -> Token {
        let token = *self.current();
        if !self.at_eof() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            let span = self.current().span;
            self.diagnostics
                .error(span, format!("expected {what}, found {:?}", self.current_kind()))
                .emit();
            None
        }
    }

    fn error_node(&mut self, span: Span, msg: impl Into<String>) -> NodeId {
        self.diagnostics.error(span, msg).emit();
        self.ast.alloc_node(span, NodeKind::Erroneous)
    }

    /// Builds a composite node, demoting it to `Erroneous` if any of its
    /// already-parsed children were themselves `Erroneous` — this is how
    /// a parse failure poisons every ancestor up to the enclosing
    /// top-level form without a separate propagation pass.
    fn finish(&mut self, span: Span, children: &[NodeId], kind: NodeKind) -> NodeId {
        if self.ast.any_erroneous(children) {
            self.ast.alloc_node(span, NodeKind::Erroneous)
        } else {
            self.ast.alloc_node(span, kind)
        }
    }

    fn enter_recursion(&mut self) -> Result<(), NodeId> {
        self.depth += 1;
        if self.depth > MAX_RECURSION_DEPTH {
            let span = self.current().span;
            Err(self.error_node(span, "recursion limit exceeded while parsing nested forms"))
        } else {
            Ok(())
        }
    }

    fn exit_recursion(&mut self) {
        self.depth -= 1;
    }

    /// Skips tokens until the closing delimiter of the list we're
    /// currently inside, or `Eof`. Leaves the cursor *on* that closer (the
    /// caller bumps it) so callers can still merge a span. Tracks nested
    /// opens so an inner `(a (b c) d` doesn't stop at `)` belonging to
    /// `(b c)`.
    fn recover_to_list_boundary(&mut self) {
        let mut depth: i32 = 0;
        loop {
            match self.current_kind() {
                TokenKind::Eof => return,
                TokenKind::LParen | TokenKind::LBracket => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::RParen | TokenKind::RBracket => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.bump();
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn parse_program(&mut self) {
        let start = self.current().span;
        let mut forms = Vec::new();
        while !self.at_eof() {
            forms.push(self.parse_expr());
        }
        let span = forms.last().map_or(start, |&id| start.merge(self.ast.node(id).span));
        let program = self.ast.alloc_node(span, NodeKind::Program(forms));
        self.ast.program = Some(program);
    }
}
