//! Top-level expression dispatch: literals, quoting, and parenthesized
//! forms (special forms and ordinary calls).

use crate::ast::{CallForm, NodeId, NodeKind};
use crate::lexer::TokenKind;
use crate::parser::Parser;

impl<'t, 'd> Parser<'t, 'd> {
    pub(crate) fn parse_expr(&mut self) -> NodeId {
        match self.enter_recursion() {
            Ok(()) => {}
            Err(id) => return id,
        }
        let result = self.parse_expr_inner();
        self.exit_recursion();
        result
    }

    fn parse_expr_inner(&mut self) -> NodeId {
        match self.current_kind() {
            TokenKind::Number | TokenKind::Bool | TokenKind::String | TokenKind::Char | TokenKind::Identifier => {
                self.parse_atom()
            }
            TokenKind::Quote => self.parse_quote_shorthand(),
            TokenKind::Backtick => self.parse_quasiquote_shorthand(),
            TokenKind::LParen | TokenKind::LBracket => self.parse_list(),
            other => {
                let span = self.current().span;
                self.bump();
                self.error_node(span, format!("unexpected token {other:?} in expression position"))
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

    /// Consumes a parenthesized form, dispatching on its head token.
    /// Brackets and parens are accepted interchangeably as list
    /// delimiters (only parameter annotations give brackets their own
    /// dedicated meaning).
    fn parse_list(&mut self) -> NodeId {
        let opener = self.bump();
        let closer = self.closing_for(opener.kind);

        if self.at(closer) {
            let span = opener.span.merge(self.current().span);
            self.bump();
            return self.error_node(span, "empty form `()` has no head to dispatch on");
        }

        match self.current_kind() {
            TokenKind::Keyword => self.parse_special_form(opener.span, closer),
            TokenKind::Colon => self.parse_type_declaration(opener.span, closer),
            _ => self.parse_call(opener.span, closer),
        }
    }

    fn parse_special_form(&mut self, open_span: schemec_support::Span, closer: TokenKind) -> NodeId {
        let head = self.bump();
        let name = self.interner.resolve(head.symbol().expect("keyword token always carries a symbol")).to_owned();
        match name.as_str() {
            "define" => self.parse_define(open_span, closer),
            "lambda" => self.parse_lambda(open_span, closer),
            "if" => self.parse_if(open_span, closer),
            "let" => self.parse_let(open_span, closer, crate::ast::LetKind::Let),
            "let*" => self.parse_let(open_span, closer, crate::ast::LetKind::LetStar),
            "letrec" => self.parse_let(open_span, closer, crate::ast::LetKind::LetRec),
            "set!" => self.parse_set(open_span, closer),
            "begin" => self.parse_begin(open_span, closer),
            "quote" => self.parse_quote_form(open_span, closer),
            "quasiquote" => self.parse_quasiquote_form(open_span, closer),
            "and" => self.parse_and_or(open_span, closer, true),
            "or" => self.parse_and_or(open_span, closer, false),
            "cond" => self.parse_cond(open_span, closer),
            "case" => self.parse_case(open_span, closer),
            "when" => self.parse_when(open_span, closer),
            "unless" => self.parse_unless(open_span, closer),
            "do" => self.parse_do(open_span, closer),
            _ => unreachable!("lexer keyword table and this dispatch must stay in sync"),
        }
    }

    /// Parses the remaining tokens of a call `(callee arg...)`. The head
    /// token has already been confirmed to not be a keyword or `:`, but
    /// is not yet consumed, since the callee is an ordinary expression
    /// (possibly itself a nested call, e.g. `((compose f g) x)`).
    fn parse_call(&mut self, open_span: schemec_support::Span, closer: TokenKind) -> NodeId {
        let callee = self.parse_expr();
        let mut args = Vec::new();
        while !self.at(closer) && !self.at_eof() {
            args.push(self.parse_expr());
        }
        let end_span = self.current().span;
        self.expect_closer(closer);
        let span = open_span.merge(end_span);
        let mut children = vec![callee];
        children.extend(args.iter().copied());
        self.finish(span, &children, NodeKind::Call(CallForm { callee, args }))
    }

    /// Expects `closer`, recovering to the list boundary on mismatch so a
    /// single malformed form doesn't cascade into unrelated diagnostics.
    pub(super) fn expect_closer(&mut self, closer: TokenKind) {
        if self.expect(closer, "a closing delimiter").is_none() {
            self.recover_to_list_boundary();
            if matches!(self.current_kind(), TokenKind::RParen | TokenKind::RBracket) {
                self.bump();
            }
        }
    }

    /// Implicitly wraps a multi-expression body in `Begin`, per the
    /// parser's contract for `lambda`/`let`/`let*`/`letrec`/`begin`/
    /// `when`/`unless`. A single expression is returned as-is.
    pub(super) fn wrap_body(&mut self, exprs: Vec<NodeId>, fallback_span: schemec_support::Span) -> NodeId {
        match exprs.len() {
            0 => self.error_node(fallback_span, "expected at least one body expression"),
            1 => exprs[0],
            _ => {
                let span = self
                    .ast
                    .node(exprs[0])
                    .span
                    .merge(self.ast.node(*exprs.last().unwrap()).span);
                self.finish(span, &exprs, NodeKind::Begin(exprs))
            }
        }
    }
}
