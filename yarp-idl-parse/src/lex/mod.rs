#[cfg(test)]
mod tests;

use std::{borrow::Cow, fmt, num::IntErrorKind};

use logos::{Lexer, Logos, Span};

use crate::{ast::Position, error::ParseErrorKind, lines::LineResolver};

/// The lexical categories of a YARP source file.
#[derive(Debug, Clone, Logos, PartialEq, Eq)]
#[logos(extras = TokenExtras)]
#[logos(skip r"[\t\r ]+")]
pub enum Token<'a> {
    #[regex("[A-Za-z_][A-Za-z0-9_]*")]
    Ident(&'a str),
    #[regex("[0-9]+", number)]
    Number(u64),
    #[token("\"", string)]
    StringLiteral(Cow<'a, str>),
    /// A `#` comment, with surrounding whitespace trimmed.
    #[regex(r"#[^\n]*", comment)]
    Comment(&'a str),
    /// An `@name` annotation, without the leading `@`.
    #[regex(r"@[^\t\n\r (]*", annotation)]
    Annotation(&'a str),
    #[token("->")]
    Arrow,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("<")]
    LeftAngleBracket,
    #[token(">")]
    RightAngleBracket,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("=")]
    Equals,
    #[token(";")]
    Semicolon,
    #[token("\n")]
    Newline,
    /// End of input. Appended by [`scan()`](crate::scan()), never produced by the lexer.
    Eof,
}

/// A token along with its location in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme<'a> {
    pub token: Token<'a>,
    pub span: Span,
    pub position: Position,
}

impl Token<'_> {
    pub const PACKAGE: Token<'static> = Token::Ident("package");
    pub const IMPORT: Token<'static> = Token::Ident("import");
    pub const MESSAGE: Token<'static> = Token::Ident("message");
    pub const SERVICE: Token<'static> = Token::Ident("service");
    pub const ONEOF: Token<'static> = Token::Ident("oneof");
    pub const STREAM: Token<'static> = Token::Ident("stream");
    pub const ARRAY: Token<'static> = Token::Ident("array");
    pub const MAP: Token<'static> = Token::Ident("map");

    /// The literal value of this token, as used in annotation values. String literals
    /// are unquoted.
    pub fn value(&self) -> String {
        match self {
            Token::Ident(value) => (*value).to_owned(),
            Token::StringLiteral(value) => value.clone().into_owned(),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(value) => write!(f, "{}", value),
            Token::Number(value) => write!(f, "{}", value),
            Token::StringLiteral(value) => write!(f, "\"{}\"", value.replace('"', "\\\"")),
            Token::Comment(value) => write!(f, "# {}", value),
            Token::Annotation(name) => write!(f, "@{}", name),
            Token::Arrow => write!(f, "->"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftAngleBracket => write!(f, "<"),
            Token::RightAngleBracket => write!(f, ">"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Equals => write!(f, "="),
            Token::Semicolon => write!(f, ";"),
            Token::Newline => write!(f, "\\n"),
            Token::Eof => write!(f, "end of file"),
        }
    }
}

#[doc(hidden)]
#[derive(Debug, Default)]
pub struct TokenExtras {
    errors: Vec<ParseErrorKind>,
}

/// Converts source text into tokens, stopping at the first invalid token. The result
/// always ends with a single [`Token::Eof`].
pub(crate) fn scan(source: &str) -> Result<Vec<Lexeme<'_>>, ParseErrorKind> {
    let lines = LineResolver::new(source);
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        if !lexer.extras.errors.is_empty() {
            return Err(lexer.extras.errors.swap_remove(0));
        }

        let span = lexer.span();
        match result {
            Ok(token) => tokens.push(Lexeme {
                token,
                position: lines.resolve(span.start),
                span,
            }),
            Err(()) => return Err(invalid_token(source, span)),
        }
    }

    tokens.push(Lexeme {
        token: Token::Eof,
        span: source.len()..source.len(),
        position: lines.resolve(source.len()),
    });
    Ok(tokens)
}

fn invalid_token(source: &str, span: Span) -> ParseErrorKind {
    let mut chars = source[span.start..].chars();
    match chars.next() {
        Some('-') => {
            let found = chars.next();
            let end = span.start + 1 + found.map_or(0, char::len_utf8);
            ParseErrorKind::InvalidArrow {
                found: found.map(|ch| ch.escape_debug().to_string()),
                span: span.start..end,
            }
        }
        Some(ch) => ParseErrorKind::UnexpectedCharacter {
            ch: ch.escape_debug().to_string(),
            span: span.start..span.start + ch.len_utf8(),
        },
        None => ParseErrorKind::UnexpectedEof {
            expected: "a token".to_owned(),
            span,
        },
    }
}

fn number<'a>(lex: &mut Lexer<'a, Token<'a>>) -> u64 {
    match lex.slice().parse() {
        Ok(value) => value,
        Err(err) => {
            debug_assert_eq!(err.kind(), &IntErrorKind::PosOverflow);
            lex.extras
                .errors
                .push(ParseErrorKind::IntegerOutOfRange { span: lex.span() });
            Default::default()
        }
    }
}

fn string<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Cow<'a, str> {
    // A quote directly after a backslash never ends the string.
    fn terminator(s: &str) -> Result<usize, usize> {
        let mut previous = None;
        for (index, ch) in s.char_indices() {
            match ch {
                '\n' => return Err(index),
                '"' if previous != Some('\\') => return Ok(index),
                _ => previous = Some(ch),
            }
        }
        Err(s.len())
    }

    let start = lex.span().start;
    let remainder = lex.remainder();
    match terminator(remainder) {
        Ok(len) => {
            lex.bump(len + 1);
            let value = &remainder[..len];
            if value.contains("\\\"") {
                Cow::Owned(value.replace("\\\"", "\""))
            } else {
                Cow::Borrowed(value)
            }
        }
        Err(len) => {
            lex.bump(len);
            lex.extras
                .errors
                .push(ParseErrorKind::UnterminatedString {
                    span: start..lex.span().end,
                });
            Cow::Borrowed(&remainder[..len])
        }
    }
}

fn comment<'a>(lex: &mut Lexer<'a, Token<'a>>) -> &'a str {
    lex.slice()[1..].trim()
}

fn annotation<'a>(lex: &mut Lexer<'a, Token<'a>>) -> &'a str {
    let name = &lex.slice()[1..];
    if name.is_empty() {
        lex.extras
            .errors
            .push(ParseErrorKind::EmptyAnnotationName { span: lex.span() });
    }
    name
}
