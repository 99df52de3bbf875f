//! Literals, identifiers, and quoted data.

use crate::ast::{DatumId, DatumKind, NodeId, NodeKind};
use crate::lexer::{TokenKind, TokenValue};
use crate::parser::Parser;

impl<'t, 'd> Parser<'t, 'd> {
    /// Parses a bare literal or identifier token. Callers have already
    /// checked (via `current_kind`) that one of these applies.
    pub(super) fn parse_atom(&mut self) -> NodeId {
        let token = self.bump();
        let kind = match (token.kind, token.value) {
            (TokenKind::Number, TokenValue::Integer(v)) => NodeKind::IntegerLiteral(v),
            (TokenKind::Number, TokenValue::Float(v)) => NodeKind::FloatLiteral(v),
            (TokenKind::Bool, TokenValue::Bool(v)) => NodeKind::BoolLiteral(v),
            (TokenKind::String, TokenValue::Symbol(s)) => NodeKind::StringLiteral(s),
            (TokenKind::Char, TokenValue::Char(c)) => NodeKind::CharLiteral(c),
            (TokenKind::Identifier, TokenValue::Symbol(s)) => NodeKind::Identifier(s),
            _ => unreachable!("parse_atom called on a non-atom token"),
        };
        self.ast.alloc_node(token.span, kind)
    }

    /// `'datum` sugar, equivalent to `(quote datum)`.
    pub(super) fn parse_quote_shorthand(&mut self) -> NodeId {
        let quote_tok = self.bump();
        let datum = self.parse_datum();
        let span = quote_tok.span.merge(self.ast.datum(datum).span);
        self.ast.alloc_node(span, NodeKind::Quote(datum))
    }

    /// `` `datum `` — lexed but not lowered; the quasiquote Open Question
    /// resolves to rejecting it with a clear diagnostic rather than
    /// silently miscompiling.
    pub(super) fn parse_quasiquote_shorthand(&mut self) -> NodeId {
        let tok = self.bump();
        let _ = self.parse_datum();
        self.error_node(tok.span, "quasiquote is not supported")
    }

    pub(super) fn parse_datum(&mut self) -> DatumId {
        let token = self.current();
        let span = token.span;
        match token.kind {
            TokenKind::Number => {
                let value = token.value;
                self.bump();
                match value {
                    TokenValue::Integer(v) => self.ast.alloc_datum(span, DatumKind::Integer(v)),
                    TokenValue::Float(v) => self.ast.alloc_datum(span, DatumKind::Float(v)),
                    _ => unreachable!(),
                }
            }
            TokenKind::Bool => {
                let TokenValue::Bool(v) = token.value else { unreachable!() };
                self.bump();
                self.ast.alloc_datum(span, DatumKind::Bool(v))
            }
            TokenKind::Char => {
                let TokenValue::Char(v) = token.value else { unreachable!() };
                self.bump();
                self.ast.alloc_datum(span, DatumKind::Char(v))
            }
            TokenKind::String => {
                let sym = token.symbol().unwrap();
                self.bump();
                self.ast.alloc_datum(span, DatumKind::String(sym))
            }
            // Symbols in quoted context never resolve to bindings, unlike
            // `Identifier` expression nodes — `Keyword` tokens are valid
            // quoted symbols too (`'if` is the symbol `if`).
            TokenKind::Identifier | TokenKind::Keyword | TokenKind::Colon | TokenKind::Arrow => {
                let sym = token.symbol().unwrap_or_else(|| unreachable!());
                self.bump();
                self.ast.alloc_datum(span, DatumKind::Symbol(sym))
            }
            TokenKind::Quote => {
                self.bump();
                let inner = self.parse_datum();
                let quote_sym_span = span;
                let quote_sym_name = self.interner.intern("quote");
                let quote_sym = self.ast.alloc_datum(quote_sym_span, DatumKind::Symbol(quote_sym_name));
                let merged = span.merge(self.ast.datum(inner).span);
                self.ast.alloc_datum(merged, DatumKind::List(vec![quote_sym, inner]))
            }
            TokenKind::LParen | TokenKind::LBracket => self.parse_datum_list(),
            _ => {
                self.diagnostics.error(span, format!("expected a quoted datum, found {:?}", token.kind)).emit();
                self.bump();
                let sym = self.interner.intern("?");
                self.ast.alloc_datum(span, DatumKind::Symbol(sym))
            }
        }
    }

    fn closing_for(&self, opener: TokenKind) -> TokenKind {
        if opener == TokenKind::LBracket {
            TokenKind::RBracket
        } else {
            TokenKind::RParen
        }
    }

    fn parse_datum_list(&mut self) -> DatumId {
        let opener = self.bump();
        let closer = self.closing_for(opener.kind);
        let mut items = Vec::new();
        let mut tail = None;

        while !self.at(closer) && !self.at_eof() {
            if self.at(TokenKind::Dot) {
                self.bump();
                tail = Some(self.parse_datum());
                break;
            }
            items.push(self.parse_datum());
        }

        let end_span = self.current().span;
        if self.expect(closer, "`)`").is_none() {
            self.recover_to_list_boundary();
            if self.at(closer) || self.at(TokenKind::RParen) || self.at(TokenKind::RBracket) {
                self.bump();
            }
        }
        let span = opener.span.merge(end_span);
        match tail {
            Some(tail) => self.ast.alloc_datum(span, DatumKind::DottedList(items, tail)),
            None => self.ast.alloc_datum(span, DatumKind::List(items)),
        }
    }
}
