//! Type annotation parsing: ground types, `(vector t)`, `(pair t1 t2)`,
//! and `(-> arg-types... ret-type)` function signatures.
//!
//! Surface syntax for compound annotations isn't pinned down by the
//! specification beyond the `->` signature form, so it is filled in here
//! consistently with that form: a parenthesized head-word dispatch, the
//! same shape every other special form uses.

use crate::ast::{Parameter, TypeAnnotation};
use crate::lexer::TokenKind;
use crate::parser::Parser;

impl<'t, 'd> Parser<'t, 'd> {
    pub(crate) fn parse_type(&mut self) -> TypeAnnotation {
        match self.current_kind() {
            TokenKind::Identifier => self.parse_ground_type(),
            TokenKind::LParen | TokenKind::LBracket => self.parse_compound_type(),
            _ => {
                let span = self.current().span;
                self.diagnostics.error(span, "expected a type annotation").emit();
                TypeAnnotation::Unknown
            }
        }
    }

    fn parse_ground_type(&mut self) -> TypeAnnotation {
        let token = self.bump();
        let name = self.interner.resolve(token.symbol().unwrap()).to_owned();
        match name.as_str() {
            "integer" => TypeAnnotation::Integer,
            "float" => TypeAnnotation::Float,
            "bool" => TypeAnnotation::Bool,
            "string" => TypeAnnotation::String,
            "char" => TypeAnnotation::Char,
            "symbol" => TypeAnnotation::Symbol,
            "void" => TypeAnnotation::Void,
            "unknown" => TypeAnnotation::Unknown,
            _ => {
                self.diagnostics
                    .error(token.span, format!("unknown type `{name}`"))
                    .emit();
                TypeAnnotation::Unknown
            }
        }
    }

    fn parse_compound_type(&mut self) -> TypeAnnotation {
        let opener = self.bump();
        let closer = if opener.kind == TokenKind::LBracket {
            TokenKind::RBracket
        } else {
            TokenKind::RParen
        };

        if self.at(TokenKind::Arrow) {
            self.bump();
            let mut types = Vec::new();
            while !self.at(closer) && !self.at_eof() {
                types.push(self.parse_type());
            }
            self.expect_closer(closer);
            if types.is_empty() {
                self.diagnostics.error(opener.span, "function type needs at least a return type").emit();
                return TypeAnnotation::Function(Vec::new(), Box::new(TypeAnnotation::Unknown));
            }
            let ret = types.pop().unwrap();
            return TypeAnnotation::Function(types, Box::new(ret));
        }

        if self.at(TokenKind::Identifier) {
            let head_sym = self.current().symbol().unwrap();
            let head = self.interner.resolve(head_sym).to_owned();
            match head.as_str() {
                "vector" => {
                    self.bump();
                    let elem = self.parse_type();
                    self.expect_closer(closer);
                    return TypeAnnotation::Vector(Box::new(elem));
                }
                "pair" => {
                    self.bump();
                    let first = self.parse_type();
                    let second = self.parse_type();
                    self.expect_closer(closer);
                    return TypeAnnotation::Pair(Box::new(first), Box::new(second));
                }
                _ => {}
            }
        }

        self.diagnostics.error(opener.span, "expected `vector`, `pair`, or `->`").emit();
        self.recover_to_list_boundary();
        if matches!(self.current_kind(), TokenKind::RParen | TokenKind::RBracket) {
            self.bump();
        }
        TypeAnnotation::Unknown
    }

    /// `[name : type]`, or a bare `name` with no annotation.
    pub(crate) fn parse_parameter(&mut self) -> Parameter {
        if self.at(TokenKind::LBracket) {
            let opener = self.bump();
            let name_tok = self.expect(TokenKind::Identifier, "a parameter name");
            let name = name_tok.and_then(|t| t.symbol()).unwrap_or(self.interner.intern("_"));
            let name_span = name_tok.map(|t| t.span).unwrap_or(opener.span);
            self.expect(TokenKind::Colon, "`:`");
            let annotation = Some(self.parse_type());
            self.expect_closer(TokenKind::RBracket);
            Parameter {
                name,
                span: opener.span.merge(name_span),
                annotation,
            }
        } else {
            let token = self.expect(TokenKind::Identifier, "a parameter name");
            match token {
                Some(t) => Parameter {
                    name: t.symbol().unwrap(),
                    span: t.span,
                    annotation: None,
                },
                None => Parameter {
                    name: self.interner.intern("_"),
                    span: self.current().span,
                    annotation: None,
                },
            }
        }
    }

    pub(crate) fn parse_parameter_list(&mut self, closer: TokenKind) -> Vec<Parameter> {
        let mut params = Vec::new();
        while !self.at(closer) && !self.at_eof() {
            params.push(self.parse_parameter());
        }
        params
    }
}
