//! Special-form sub-parsers. Each is entered with the opening delimiter
//! and the form's keyword already consumed; each is responsible for
//! parsing the rest of the form and consuming its closing delimiter.

use schemec_support::{Span, Symbol};

use crate::ast::{CallForm, IfForm, LambdaForm, LetBinding, LetForm, LetKind, NodeId, NodeKind};
use crate::lexer::TokenKind;
use crate::parser::Parser;

impl<'t, 'd> Parser<'t, 'd> {
    /// A node with no useful value — the result of `(when #f ...)`'s
    /// untaken branch, an empty `do` body, and similar positions the
    /// specification calls "unspecified". Lowered by codegen as `void`.
    fn unspecified(&mut self, span: Span) -> NodeId {
        self.ast.alloc_node(span, NodeKind::Begin(Vec::new()))
    }

    fn ident_node(&mut self, span: Span, name: Symbol) -> NodeId {
        self.ast.alloc_node(span, NodeKind::Identifier(name))
    }

    fn call_node(&mut self, span: Span, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        let mut children = vec![callee];
        children.extend(args.iter().copied());
        self.finish(span, &children, NodeKind::Call(CallForm { callee, args }))
    }

    /// `(define name value)` or the sugar `(define (name params...) body...)`,
    /// which this desugars at parse time into `(define name (lambda (params...) body...))`.
    pub(super) fn parse_define(&mut self, open_span: Span, closer: TokenKind) -> NodeId {
        if self.at(TokenKind::LParen) {
            let sig_opener = self.bump();
            let name_tok = self.expect(TokenKind::Identifier, "a function name");
            let params = self.parse_parameter_list(TokenKind::RParen);
            self.expect_closer(TokenKind::RParen);
            let _ = sig_opener;

            let body_exprs = self.parse_body_until(closer);
            let end_span = self.current().span;
            self.expect_closer(closer);
            let body = self.wrap_body(body_exprs, end_span);

            let Some(name_tok) = name_tok else {
                return self.error_node(open_span.merge(end_span), "malformed `define` signature");
            };
            let lambda_span = name_tok.span.merge(end_span);
            let lambda = self.ast.alloc_node(
                lambda_span,
                NodeKind::Lambda(LambdaForm {
                    params,
                    return_annotation: None,
                    body,
                }),
            );
            let span = open_span.merge(end_span);
            self.finish(
                span,
                &[lambda],
                NodeKind::Define {
                    name: name_tok.symbol().unwrap(),
                    name_span: name_tok.span,
                    value: lambda,
                },
            )
        } else {
            let name_tok = self.expect(TokenKind::Identifier, "a name");
            let value = self.parse_expr();
            let end_span = self.current().span;
            self.expect_closer(closer);
            let span = open_span.merge(end_span);
            let Some(name_tok) = name_tok else {
                return self.error_node(span, "malformed `define`");
            };
            self.finish(
                span,
                &[value],
                NodeKind::Define {
                    name: name_tok.symbol().unwrap(),
                    name_span: name_tok.span,
                    value,
                },
            )
        }
    }

    pub(super) fn parse_lambda(&mut self, open_span: Span, closer: TokenKind) -> NodeId {
        let params_opener = self.expect(TokenKind::LParen, "a parameter list");
        let params = if params_opener.is_some() {
            let p = self.parse_parameter_list(TokenKind::RParen);
            self.expect_closer(TokenKind::RParen);
            p
        } else {
            Vec::new()
        };

        let return_annotation = if self.at(TokenKind::Arrow) {
            self.bump();
            Some(self.parse_type())
        } else {
            None
        };

        let body_exprs = self.parse_body_until(closer);
        let end_span = self.current().span;
        self.expect_closer(closer);
        let body = self.wrap_body(body_exprs, end_span);
        let span = open_span.merge(end_span);
        self.finish(
            span,
            &[body],
            NodeKind::Lambda(LambdaForm {
                params,
                return_annotation,
                body,
            }),
        )
    }

    pub(super) fn parse_if(&mut self, open_span: Span, closer: TokenKind) -> NodeId {
        let test = self.parse_expr();
        let consequent = self.parse_expr();
        let alternate = if !self.at(closer) { Some(self.parse_expr()) } else { None };
        let end_span = self.current().span;
        self.expect_closer(closer);
        let span = open_span.merge(end_span);
        let mut children = vec![test, consequent];
        children.extend(alternate);
        self.finish(span, &children, NodeKind::If(IfForm { test, consequent, alternate }))
    }

    /// Shared by `let`, `let*`, and `letrec`: `((name init) ...) body...`.
    /// Bindings may optionally carry `[name : type value]`-style
    /// annotations by writing the name as a bracketed `[name : type]`
    /// pair followed by the initializer.
    pub(super) fn parse_let(&mut self, open_span: Span, closer: TokenKind, kind: LetKind) -> NodeId {
        self.expect(TokenKind::LParen, "a binding list");
        let mut bindings = Vec::new();
        while self.at(TokenKind::LParen) {
            self.bump();
            let (name, name_span, annotation) = if self.at(TokenKind::LBracket) {
                let param = self.parse_parameter();
                (param.name, param.span, param.annotation)
            } else {
                let tok = self.expect(TokenKind::Identifier, "a binding name");
                match tok {
                    Some(t) => (t.symbol().unwrap(), t.span, None),
                    None => (self.interner.intern("_"), self.current().span, None),
                }
            };
            let value = self.parse_expr();
            self.expect_closer(TokenKind::RParen);
            bindings.push(LetBinding { name, span: name_span, annotation, value });
        }
        self.expect_closer(TokenKind::RParen);

        let body_exprs = self.parse_body_until(closer);
        let end_span = self.current().span;
        self.expect_closer(closer);
        let body = self.wrap_body(body_exprs, end_span);
        let span = open_span.merge(end_span);
        let mut children: Vec<NodeId> = bindings.iter().map(|b| b.value).collect();
        children.push(body);
        self.finish(span, &children, NodeKind::Let(LetForm { kind, bindings, body }))
    }

    pub(super) fn parse_set(&mut self, open_span: Span, closer: TokenKind) -> NodeId {
        let target_tok = self.expect(TokenKind::Identifier, "an identifier to assign");
        let target = match target_tok {
            Some(t) => self.ident_node(t.span, t.symbol().unwrap()),
            None => self.error_node(self.current().span, "expected an identifier after `set!`"),
        };
        let value = self.parse_expr();
        let end_span = self.current().span;
        self.expect_closer(closer);
        let span = open_span.merge(end_span);
        self.finish(span, &[target, value], NodeKind::Set { target, value })
    }

    pub(super) fn parse_begin(&mut self, open_span: Span, closer: TokenKind) -> NodeId {
        let exprs = self.parse_body_until(closer);
        let end_span = self.current().span;
        self.expect_closer(closer);
        let span = open_span.merge(end_span);
        self.finish(span, &exprs, NodeKind::Begin(exprs))
    }

    pub(super) fn parse_quote_form(&mut self, open_span: Span, closer: TokenKind) -> NodeId {
        let datum = self.parse_datum();
        let end_span = self.current().span;
        self.expect_closer(closer);
        let span = open_span.merge(end_span);
        self.ast.alloc_node(span, NodeKind::Quote(datum))
    }

    pub(super) fn parse_quasiquote_form(&mut self, open_span: Span, closer: TokenKind) -> NodeId {
        let _ = self.parse_datum();
        let end_span = self.current().span;
        self.expect_closer(closer);
        self.error_node(open_span.merge(end_span), "quasiquote is not supported")
    }

    pub(super) fn parse_and_or(&mut self, open_span: Span, closer: TokenKind, is_and: bool) -> NodeId {
        let operands = self.parse_body_until(closer);
        let end_span = self.current().span;
        self.expect_closer(closer);
        let span = open_span.merge(end_span);
        let kind = if is_and { NodeKind::And(operands.clone()) } else { NodeKind::Or(operands.clone()) };
        self.finish(span, &operands, kind)
    }

    /// `(: name (-> arg-types... ret-type))` — a standalone type
    /// declaration attached by name to a later `define`.
    pub(super) fn parse_type_declaration(&mut self, open_span: Span, closer: TokenKind) -> NodeId {
        self.bump(); // `:`
        let name_tok = self.expect(TokenKind::Identifier, "a declared function's name");
        let signature = self.parse_type();
        let end_span = self.current().span;
        self.expect_closer(closer);
        let span = open_span.merge(end_span);
        let Some(name_tok) = name_tok else {
            return self.error_node(span, "malformed type declaration");
        };
        if !matches!(signature, crate::ast::TypeAnnotation::Function(_, _)) {
            self.diagnostics.error(span, "type declaration signature must be a function type").emit();
        }
        self.ast.alloc_node(
            span,
            NodeKind::TypeDeclaration {
                name: name_tok.symbol().unwrap(),
                signature,
            },
        )
    }

    /// Parses expressions until `closer`, used by every body-bearing form.
    fn parse_body_until(&mut self, closer: TokenKind) -> Vec<NodeId> {
        let mut exprs = Vec::new();
        while !self.at(closer) && !self.at_eof() {
            exprs.push(self.parse_expr());
        }
        exprs
    }

    // -- cond / case / when / unless / do: desugared into If/Let/Begin at
    // parse time so the binder and inferencer never see these as
    // distinct AST variants. --

    pub(super) fn parse_when(&mut self, open_span: Span, closer: TokenKind) -> NodeId {
        let test = self.parse_expr();
        let body = self.parse_body_until(closer);
        let end_span = self.current().span;
        self.expect_closer(closer);
        let span = open_span.merge(end_span);
        let consequent = self.wrap_body(body, end_span);
        self.finish(span, &[test, consequent], NodeKind::If(IfForm { test, consequent, alternate: None }))
    }

    pub(super) fn parse_unless(&mut self, open_span: Span, closer: TokenKind) -> NodeId {
        let test = self.parse_expr();
        let body = self.parse_body_until(closer);
        let end_span = self.current().span;
        self.expect_closer(closer);
        let span = open_span.merge(end_span);
        let consequent = self.unspecified(test);
        let alternate = self.wrap_body(body, end_span);
        self.finish(
            span,
            &[test, alternate],
            NodeKind::If(IfForm { test, consequent, alternate: Some(alternate) }),
        )
    }

    /// `(cond (test expr...) ... (else expr...))` -> nested `If`. A
    /// clause with no body, `(cond (test))`, yields `test`'s own value
    /// as both test and result via a synthesized temporary `Let` (so
    /// `test` is only evaluated once).
    pub(super) fn parse_cond(&mut self, open_span: Span, closer: TokenKind) -> NodeId {
        struct Clause {
            span: Span,
            is_else: bool,
            test: Option<NodeId>,
            body: Vec<NodeId>,
        }

        let mut clauses = Vec::new();
        while !self.at(closer) && !self.at_eof() {
            let clause_opener = self.expect(TokenKind::LParen, "a `cond` clause");
            let Some(clause_opener) = clause_opener else {
                self.recover_to_list_boundary();
                if matches!(self.current_kind(), TokenKind::RParen | TokenKind::RBracket) {
                    self.bump();
                }
                continue;
            };
            let is_else = self.at(TokenKind::Keyword)
                && self.current().symbol().map(|s| self.interner.resolve(s) == "else").unwrap_or(false);
            let test = if is_else {
                self.bump();
                None
            } else {
                Some(self.parse_expr())
            };
            let body = self.parse_body_until(TokenKind::RParen);
            let end_span = self.current().span;
            self.expect_closer(TokenKind::RParen);
            clauses.push(Clause { span: clause_opener.span.merge(end_span), is_else, test, body });
        }
        let end_span = self.current().span;
        self.expect_closer(closer);
        let overall_span = open_span.merge(end_span);

        let mut rest: Option<NodeId> = None;
        for clause in clauses.into_iter().rev() {
            rest = Some(if clause.is_else {
                self.wrap_body(clause.body, clause.span)
            } else {
                let test = clause.test.unwrap();
                if clause.body.is_empty() {
                    let tmp = self.interner.intern("%cond-tmp");
                    let tmp_ident_test = self.ident_node(clause.span, tmp);
                    let tmp_ident_result = self.ident_node(clause.span, tmp);
                    let if_node = self.ast.alloc_node(
                        clause.span,
                        NodeKind::If(IfForm { test: tmp_ident_test, consequent: tmp_ident_result, alternate: rest }),
                    );
                    self.ast.alloc_node(
                        clause.span,
                        NodeKind::Let(LetForm {
                            kind: LetKind::Let,
                            bindings: vec![LetBinding { name: tmp, span: clause.span, annotation: None, value: test }],
                            body: if_node,
                        }),
                    )
                } else {
                    let consequent = self.wrap_body(clause.body, clause.span);
                    self.ast.alloc_node(clause.span, NodeKind::If(IfForm { test, consequent, alternate: rest }))
                }
            });
        }
        rest.unwrap_or_else(|| self.unspecified(overall_span))
    }

    /// `(case key ((d1 d2...) expr...) ... (else expr...))`. `key` is
    /// bound once via a synthesized `Let` and compared against each
    /// clause's data with the same equality the `=` intrinsic lowers.
    pub(super) fn parse_case(&mut self, open_span: Span, closer: TokenKind) -> NodeId {
        struct Clause {
            span: Span,
            is_else: bool,
            data: Vec<NodeId>,
            body: Vec<NodeId>,
        }

        let key = self.parse_expr();
        let mut clauses = Vec::new();
        while !self.at(closer) && !self.at_eof() {
            let clause_opener = self.expect(TokenKind::LParen, "a `case` clause");
            let Some(clause_opener) = clause_opener else {
                self.recover_to_list_boundary();
                if matches!(self.current_kind(), TokenKind::RParen | TokenKind::RBracket) {
                    self.bump();
                }
                continue;
            };
            let is_else = self.at(TokenKind::Keyword)
                && self.current().symbol().map(|s| self.interner.resolve(s) == "else").unwrap_or(false);
            let data = if is_else {
                self.bump();
                Vec::new()
            } else {
                self.expect(TokenKind::LParen, "a list of datums");
                let mut data = Vec::new();
                while !self.at(TokenKind::RParen) && !self.at_eof() {
                    let d = self.parse_datum();
                    data.push(self.datum_to_expr(d));
                }
                self.expect_closer(TokenKind::RParen);
                data
            };
            let body = self.parse_body_until(TokenKind::RParen);
            let end_span = self.current().span;
            self.expect_closer(TokenKind::RParen);
            clauses.push(Clause { span: clause_opener.span.merge(end_span), is_else, data, body });
        }
        let end_span = self.current().span;
        self.expect_closer(closer);
        let overall_span = open_span.merge(end_span);

        let tmp = self.interner.intern("%case-key");
        let mut rest: Option<NodeId> = None;
        for clause in clauses.into_iter().rev() {
            let consequent = self.wrap_body(clause.body, clause.span);
            rest = Some(if clause.is_else {
                consequent
            } else {
                let eq_sym = self.interner.intern("=");
                let mut test: Option<NodeId> = None;
                for datum_expr in clause.data {
                    let tmp_ident = self.ident_node(clause.span, tmp);
                    let eq_callee = self.ident_node(clause.span, eq_sym);
                    let eq_call = self.call_node(clause.span, eq_callee, vec![tmp_ident, datum_expr]);
                    test = Some(match test {
                        Some(acc) => {
                            let or_span = clause.span;
                            self.ast.alloc_node(or_span, NodeKind::Or(vec![acc, eq_call]))
                        }
                        None => eq_call,
                    });
                }
                let test = test.unwrap_or_else(|| {
                    let b = self.ast.alloc_node(clause.span, NodeKind::BoolLiteral(false));
                    b
                });
                self.ast.alloc_node(clause.span, NodeKind::If(IfForm { test, consequent, alternate: rest }))
            });
        }
        let body = rest.unwrap_or_else(|| self.unspecified(overall_span));
        self.ast.alloc_node(
            overall_span,
            NodeKind::Let(LetForm {
                kind: LetKind::Let,
                bindings: vec![LetBinding { name: tmp, span: overall_span, annotation: None, value: key }],
                body,
            }),
        )
    }

    /// Converts a parsed quoted datum back into an expression-position
    /// literal node, for `case` clause data (always literals in
    /// practice: numbers, characters, booleans, or bare symbols).
    fn datum_to_expr(&mut self, datum: crate::ast::DatumId) -> NodeId {
        let d = self.ast.datum(datum).clone();
        match d.kind {
            crate::ast::DatumKind::Integer(v) => self.ast.alloc_node(d.span, NodeKind::IntegerLiteral(v)),
            crate::ast::DatumKind::Float(v) => self.ast.alloc_node(d.span, NodeKind::FloatLiteral(v)),
            crate::ast::DatumKind::Bool(v) => self.ast.alloc_node(d.span, NodeKind::BoolLiteral(v)),
            crate::ast::DatumKind::Char(v) => self.ast.alloc_node(d.span, NodeKind::CharLiteral(v)),
            crate::ast::DatumKind::String(s) => self.ast.alloc_node(d.span, NodeKind::StringLiteral(s)),
            crate::ast::DatumKind::Symbol(s) => self.ast.alloc_node(d.span, NodeKind::Identifier(s)),
            crate::ast::DatumKind::List(_) | crate::ast::DatumKind::DottedList(_, _) => {
                self.diagnostics.error(d.span, "`case` clause data must be literals, not lists").emit();
                self.ast.alloc_node(d.span, NodeKind::Erroneous)
            }
        }
    }

    /// `(do ((var init step) ...) (test expr...) body...)` -> a
    /// named-`letrec` loop function.
    pub(super) fn parse_do(&mut self, open_span: Span, closer: TokenKind) -> NodeId {
        self.expect(TokenKind::LParen, "a `do` variable-binding list");
        struct DoVar {
            name: Symbol,
            span: Span,
            init: NodeId,
            step: Option<NodeId>,
        }
        let mut vars = Vec::new();
        while self.at(TokenKind::LParen) {
            self.bump();
            let name_tok = self.expect(TokenKind::Identifier, "a loop variable name");
            let init = self.parse_expr();
            let step = if !self.at(TokenKind::RParen) { Some(self.parse_expr()) } else { None };
            self.expect_closer(TokenKind::RParen);
            if let Some(name_tok) = name_tok {
                vars.push(DoVar { name: name_tok.symbol().unwrap(), span: name_tok.span, init, step });
            }
        }
        self.expect_closer(TokenKind::RParen);

        self.expect(TokenKind::LParen, "a `do` termination clause");
        let test = self.parse_expr();
        let result_body = self.parse_body_until(TokenKind::RParen);
        self.expect_closer(TokenKind::RParen);

        let body = self.parse_body_until(closer);
        let end_span = self.current().span;
        self.expect_closer(closer);
        let span = open_span.merge(end_span);

        let loop_name = self.interner.intern("%do-loop");
        let params = vars
            .iter()
            .map(|v| crate::ast::Parameter { name: v.name, span: v.span, annotation: None })
            .collect::<Vec<_>>();

        let loop_ident_for_call = self.ident_node(span, loop_name);
        let step_args: Vec<NodeId> = vars
            .iter()
            .map(|v| v.step.unwrap_or_else(|| self.ident_node(v.span, v.name)))
            .collect();
        let recurse = self.call_node(span, loop_ident_for_call, step_args);

        let mut loop_body_exprs = body;
        loop_body_exprs.push(recurse);
        let loop_body = self.wrap_body(loop_body_exprs, span);

        let result = self.wrap_body(result_body, span);
        let if_node = self.ast.alloc_node(span, NodeKind::If(IfForm { test, consequent: result, alternate: Some(loop_body) }));

        let lambda = self.ast.alloc_node(span, NodeKind::Lambda(LambdaForm { params, return_annotation: None, body: if_node }));
        let inits: Vec<NodeId> = vars.iter().map(|v| v.init).collect();
        let loop_ident_for_letrec_body = self.ident_node(span, loop_name);
        let call = self.call_node(span, loop_ident_for_letrec_body, inits);

        self.ast.alloc_node(
            span,
            NodeKind::Let(LetForm {
                kind: LetKind::LetRec,
                bindings: vec![LetBinding { name: loop_name, span, annotation: None, value: lambda }],
                body: call,
            }),
        )
    }
}
