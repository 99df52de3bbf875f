//! Hand-rolled scanner: UTF-8 source text to a finite token stream.
//!
//! A derive-based scanner (`logos`) was considered and rejected: string/char
//! escape handling, the digit-vs-float promotion on an embedded `.`, and
//! error resynchronization at the next delimiter all want imperative
//! control a regex-driven derive doesn't give cleanly, and the grammar is
//! small enough that hand-rolling it is the idiomatic choice here.

mod token;

#[cfg(test)]
mod lexer_tests;

pub use token::{is_keyword, Token, TokenKind, TokenValue, KEYWORDS};

use schemec_support::{Interner, Position, Span};

use crate::diagnostics::Diagnostics;

const NAMED_CHARS: &[(&str, char)] = &[
    ("space", ' '),
    ("newline", '\n'),
    ("tab", '\t'),
    ("return", '\r'),
    ("null", '\0'),
];

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '"' | ';' | '\'' | '`' | ',' | '.')
}

struct Cursor<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            byte_offset: self.pos as u32,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.pos as u32 - start.byte_offset)
    }
}

/// Scans `source` into a token stream, interning identifiers and string
/// contents through `interner` and reporting ill-formed tokens into
/// `diagnostics`. Always terminates with exactly one `Eof` token.
pub fn lex(source: &str, interner: &mut Interner, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();

    loop {
        skip_trivia(&mut cursor);
        let start = cursor.position();
        let Some(c) = cursor.peek() else {
            tokens.push(Token::new(TokenKind::Eof, Span::point(start), TokenValue::None));
            break;
        };

        let starts_number = c.is_ascii_digit()
            || (matches!(c, '+' | '-' | '.') && matches!(cursor.peek2(), Some(d) if d.is_ascii_digit()));

        let token = if starts_number {
            scan_number(&mut cursor, diagnostics)
        } else {
            match c {
                '(' => single(&mut cursor, TokenKind::LParen),
                ')' => single(&mut cursor, TokenKind::RParen),
                '[' => single(&mut cursor, TokenKind::LBracket),
                ']' => single(&mut cursor, TokenKind::RBracket),
                '\'' => single(&mut cursor, TokenKind::Quote),
                '`' => single(&mut cursor, TokenKind::Backtick),
                ',' => single(&mut cursor, TokenKind::Comma),
                '.' => single(&mut cursor, TokenKind::Dot),
                '"' => scan_string(&mut cursor, interner, diagnostics),
                '#' => scan_hash(&mut cursor, diagnostics),
                _ => scan_identifier(&mut cursor, interner),
            }
        };

        if let Some(token) = token {
            tokens.push(token);
        }
    }

    tokens
}

fn single(cursor: &mut Cursor<'_>, kind: TokenKind) -> Option<Token> {
    let start = cursor.position();
    cursor.bump();
    Some(Token::new(kind, cursor.span_from(start), TokenValue::None))
}

fn skip_trivia(cursor: &mut Cursor<'_>) {
    loop {
        match cursor.peek() {
            Some(c) if c.is_whitespace() => {
                cursor.bump();
            }
            Some(';') => {
                while !matches!(cursor.peek(), None | Some('\n')) {
                    cursor.bump();
                }
            }
            _ => break,
        }
    }
}

fn scan_number(cursor: &mut Cursor<'_>, diagnostics: &mut Diagnostics) -> Option<Token> {
    let start = cursor.position();
    if matches!(cursor.peek(), Some('+') | Some('-')) {
        cursor.bump();
    }
    let mut is_float = false;
    while matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
        cursor.bump();
    }
    if cursor.peek() == Some('.') {
        is_float = true;
        cursor.bump();
        while matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
            cursor.bump();
        }
    }
    let span = cursor.span_from(start);
    let text = &cursor.source[span.byte_range()];

    if is_float {
        match text.parse::<f64>() {
            Ok(v) => Some(Token::new(TokenKind::Number, span, TokenValue::Float(v))),
            Err(_) => {
                diagnostics.error(span, format!("invalid floating-point literal `{text}`")).emit();
                None
            }
        }
    } else {
        match text.parse::<i64>() {
            Ok(v) => Some(Token::new(TokenKind::Number, span, TokenValue::Integer(v))),
            Err(_) => {
                diagnostics.error(span, format!("invalid integer literal `{text}`")).emit();
                None
            }
        }
    }
}

fn scan_identifier(cursor: &mut Cursor<'_>, interner: &mut Interner) -> Option<Token> {
    let start = cursor.position();
    while matches!(cursor.peek(), Some(c) if !is_delimiter(c)) {
        cursor.bump();
    }
    let span = cursor.span_from(start);
    let text = &cursor.source[span.byte_range()];

    let kind = if text == ":" {
        TokenKind::Colon
    } else if text == "->" {
        TokenKind::Arrow
    } else if is_keyword(text) {
        TokenKind::Keyword
    } else {
        TokenKind::Identifier
    };
    let symbol = interner.intern(text);
    Some(Token::new(kind, span, TokenValue::Symbol(symbol)))
}

fn scan_string(cursor: &mut Cursor<'_>, interner: &mut Interner, diagnostics: &mut Diagnostics) -> Option<Token> {
    let start = cursor.position();
    cursor.bump(); // opening quote
    let mut content = String::new();
    loop {
        match cursor.peek() {
            None => {
                let span = cursor.span_from(start);
                diagnostics.error(span, "unterminated string literal").emit();
                return None;
            }
            Some('"') => {
                cursor.bump();
                break;
            }
            Some('\\') => {
                let escape_start = cursor.position();
                cursor.bump();
                match cursor.bump() {
                    Some('n') => content.push('\n'),
                    Some('t') => content.push('\t'),
                    Some('\\') => content.push('\\'),
                    Some('"') => content.push('"'),
                    Some('r') => content.push('\r'),
                    Some('0') => content.push('\0'),
                    Some(other) => {
                        let span = cursor.span_from(escape_start);
                        diagnostics
                            .error(span, format!("unknown string escape `\\{other}`"))
                            .emit();
                        content.push(other);
                    }
                    None => {
                        let span = cursor.span_from(escape_start);
                        diagnostics.error(span, "unterminated string literal").emit();
                        return None;
                    }
                }
            }
            Some(c) => {
                content.push(c);
                cursor.bump();
            }
        }
    }
    let span = cursor.span_from(start);
    let symbol = interner.intern_owned(content);
    Some(Token::new(TokenKind::String, span, TokenValue::Symbol(symbol)))
}

fn scan_hash(cursor: &mut Cursor<'_>, diagnostics: &mut Diagnostics) -> Option<Token> {
    let start = cursor.position();
    cursor.bump(); // '#'
    match cursor.peek() {
        Some('t') => {
            cursor.bump();
            Some(Token::new(TokenKind::Bool, cursor.span_from(start), TokenValue::Bool(true)))
        }
        Some('f') => {
            cursor.bump();
            Some(Token::new(TokenKind::Bool, cursor.span_from(start), TokenValue::Bool(false)))
        }
        Some('\\') => {
            cursor.bump();
            scan_char(cursor, start, diagnostics)
        }
        _ => {
            let span = cursor.span_from(start);
            diagnostics.error(span, "unrecognized `#` syntax").emit();
            None
        }
    }
}

fn scan_char(cursor: &mut Cursor<'_>, start: Position, diagnostics: &mut Diagnostics) -> Option<Token> {
    let Some(first) = cursor.bump() else {
        let span = cursor.span_from(start);
        diagnostics.error(span, "unterminated character literal").emit();
        return None;
    };

    if first.is_alphabetic() {
        let word_start_pos = cursor.pos - first.len_utf8();
        let mut word = String::from(first);
        while matches!(cursor.peek(), Some(c) if !is_delimiter(c)) {
            word.push(cursor.bump().unwrap());
        }
        if let Some(&(_, mapped)) = NAMED_CHARS.iter().find(|(name, _)| *name == word) {
            return Some(Token::new(TokenKind::Char, cursor.span_from(start), TokenValue::Char(mapped)));
        }
        // Not a named form: only the first character was the literal: the
        // scanner over-consumed, so rewind to just after it.
        cursor.pos = word_start_pos + first.len_utf8();
        cursor.column -= (word.chars().count() - 1) as u32;
    }

    Some(Token::new(TokenKind::Char, cursor.span_from(start), TokenValue::Char(first)))
}
