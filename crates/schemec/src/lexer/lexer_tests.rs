use schemec_support::Interner;

use super::*;
use crate::diagnostics::Diagnostics;

fn lex_ok(source: &str) -> (Vec<Token>, Interner) {
    let mut interner = Interner::new();
    let mut diagnostics = Diagnostics::new();
    let tokens = lex(source, &mut interner, &mut diagnostics);
    assert!(!diagnostics.has_errors(), "unexpected lexer errors: {diagnostics:?}");
    (tokens, interner)
}

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

#[test]
fn lexes_parens_and_atoms() {
    let (tokens, _) = lex_ok("(+ 1 2)");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::LParen,
            TokenKind::Identifier,
            TokenKind::Number,
            TokenKind::Number,
            TokenKind::RParen,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn recognizes_keywords_distinct_from_identifiers() {
    let (tokens, _) = lex_ok("(define x 1)");
    assert_eq!(tokens[1].kind, TokenKind::Keyword);
}

#[test]
fn integer_vs_float_promotion_on_embedded_dot() {
    let (tokens, _) = lex_ok("1 1.5");
    assert_eq!(tokens[0].value, TokenValue::Integer(1));
    assert_eq!(tokens[1].value, TokenValue::Float(1.5));
}

#[test]
fn signed_numbers_vs_arithmetic_identifiers() {
    let (tokens, _) = lex_ok("(- 1) (+ -2 3)");
    // '-' alone, followed by a delimiter, is the identifier `-`.
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    // '-2' immediately followed by a digit is a signed number.
    assert_eq!(tokens[6].value, TokenValue::Integer(-2));
}

#[test]
fn colon_and_arrow_are_recognized_as_complete_identifiers() {
    let (tokens, _) = lex_ok("[x : integer] (-> a b)");
    assert_eq!(tokens[2].kind, TokenKind::Colon);
    assert_eq!(tokens[6].kind, TokenKind::Arrow);
}

#[test]
fn strings_decode_escapes() {
    let (tokens, interner) = lex_ok(r#""a\nb\"c""#);
    let sym = tokens[0].symbol().unwrap();
    assert_eq!(interner.resolve(sym), "a\nb\"c");
}

#[test]
fn unterminated_string_emits_diagnostic_and_no_token() {
    let mut interner = Interner::new();
    let mut diagnostics = Diagnostics::new();
    let tokens = lex("\"abc", &mut interner, &mut diagnostics);
    assert!(diagnostics.has_errors());
    assert_eq!(kinds(&tokens), vec![TokenKind::Eof]);
}

#[test]
fn named_and_literal_char_forms() {
    let (tokens, _) = lex_ok(r"#\space #\a #\newline");
    assert_eq!(tokens[0].value, TokenValue::Char(' '));
    assert_eq!(tokens[1].value, TokenValue::Char('a'));
    assert_eq!(tokens[2].value, TokenValue::Char('\n'));
}

#[test]
fn booleans() {
    let (tokens, _) = lex_ok("#t #f");
    assert_eq!(tokens[0].value, TokenValue::Bool(true));
    assert_eq!(tokens[1].value, TokenValue::Bool(false));
}

#[test]
fn line_comments_run_to_end_of_line() {
    let (tokens, _) = lex_ok("1 ; comment here\n2");
    assert_eq!(tokens.len(), 3); // two numbers + eof
    assert_eq!(tokens[1].value, TokenValue::Integer(2));
}

#[test]
fn dot_alone_is_its_own_token() {
    let (tokens, _) = lex_ok("(a . b)");
    assert_eq!(kinds(&tokens), vec![
        TokenKind::LParen,
        TokenKind::Identifier,
        TokenKind::Dot,
        TokenKind::Identifier,
        TokenKind::RParen,
        TokenKind::Eof,
    ]);
}

#[test]
fn spans_track_line_and_column() {
    let (tokens, _) = lex_ok("(foo\n  bar)");
    // `bar` starts on line 2, column 3.
    let bar = &tokens[2];
    assert_eq!(bar.span.line, 2);
    assert_eq!(bar.span.column, 3);
}
