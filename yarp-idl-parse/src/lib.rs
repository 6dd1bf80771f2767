//! Parsing of YARP interface description files.
//!
//! See the documentation for [`parse()`] for details.
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/yarp-idl-parse/0.1.0/")]

pub mod ast;
mod error;
mod lex;
mod lines;
mod parse;

pub use self::ast::{
    Annotation, Annotations, Declaration, Field, File, Import, Location, Message, MessageMember,
    Method, OneOfField, Package, Position, Primitive, Service, Type, DEPRECATED_ANNOTATION,
    OPTIONAL_ANNOTATION, REPEATED_ANNOTATION, VOID,
};
pub use self::error::ParseError;
pub use self::lex::{Lexeme, Token};

/// Splits a YARP source file into tokens.
///
/// The returned sequence always ends with a single [`Token::Eof`]. Spaces, tabs and
/// carriage returns are discarded, but newlines are kept since they affect which
/// comments and annotations attach to a declaration.
///
/// The `name` parameter is used only for error reporting.
///
/// # Examples
///
/// ```
/// # use yarp_idl_parse::{scan, Token};
/// let tokens = scan("foo.yarp", "package foo;").unwrap();
/// assert_eq!(tokens[0].token, Token::Ident("package"));
/// assert_eq!(tokens.last().unwrap().token, Token::Eof);
///
/// let err = scan("foo.yarp", "package \"foo;").unwrap_err();
/// assert!(err.is_syntax());
/// assert_eq!(err.to_string(), "unterminated string");
/// ```
pub fn scan<'a>(name: &str, source: &'a str) -> Result<Vec<Lexeme<'a>>, ParseError> {
    lex::scan(source).map_err(|kind| ParseError::new(kind, name, source))
}

/// Parses a single YARP source file.
///
/// This function only validates the grammar of the file and that names and imports are
/// not declared twice within it. It does not resolve imports or check that referenced
/// message types exist.
///
/// The `name` parameter is used only for error reporting.
///
/// # Examples
///
/// ```
/// # use yarp_idl_parse::{parse, Type, Primitive, OPTIONAL_ANNOTATION};
/// let source = r#"
/// package org.example;
///
/// ## A user of the system.
/// message User {
///     @optional
///     email string = 0;
///     tags array<string> = 1;
/// }
/// "#;
/// let file = parse("user.yarp", source).unwrap();
/// let user = file.message("User").unwrap();
///
/// assert_eq!(file.package(), "org.example");
/// assert_eq!(user.comments, ["A user of the system."]);
///
/// let email = user.fields().next().unwrap();
/// assert_eq!(email.ty, Type::Primitive(Primitive::String));
/// assert!(email.annotations.contains(OPTIONAL_ANNOTATION));
/// ```
///
/// Errors carry the location at which parsing stopped:
///
/// ```
/// # use yarp_idl_parse::parse;
/// let err = parse("user.yarp", "package org.example;\nmessage User {").unwrap_err();
/// assert_eq!(err.to_string(), "expected a field name, but reached end of file");
/// assert_eq!(err.position().unwrap().line, 2);
/// assert_eq!(
///     format!("{:?}", err),
///     "user.yarp:2:15: expected a field name, but reached end of file"
/// );
/// ```
pub fn parse(name: &str, source: &str) -> Result<File, ParseError> {
    let tokens = scan(name, source)?;
    parse::parse_file(source, &tokens).map_err(|kind| ParseError::new(kind, name, source))
}
