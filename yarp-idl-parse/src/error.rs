use std::fmt;

use logos::Span;
use miette::{Diagnostic, NamedSource};
use thiserror::Error;

use crate::{ast::Position, lines::LineResolver};

/// An error that may occur while scanning or parsing a YARP source file.
#[derive(Error, Diagnostic)]
#[error("{}", kind)]
#[diagnostic(forward(kind))]
pub struct ParseError {
    kind: Box<ParseErrorKind>,
    file: String,
    position: Option<Position>,
    #[source_code]
    source_code: NamedSource,
}

#[derive(Error, Debug, Diagnostic, PartialEq)]
pub(crate) enum ParseErrorKind {
    #[error("unexpected character '{ch}'")]
    UnexpectedCharacter {
        ch: String,
        #[label("found here")]
        span: Span,
    },
    #[error("{}", match found {
        Some(found) => format!("unexpected '{}', expected '>'", found),
        None => "expected '>' after '-'".to_owned(),
    })]
    InvalidArrow {
        found: Option<String>,
        #[label("found here")]
        span: Span,
    },
    #[error("unterminated string")]
    UnterminatedString {
        #[label("string starts here")]
        span: Span,
    },
    #[error("expected an annotation name")]
    #[diagnostic(help("annotations are written as '@name' or '@name(value, ...)'"))]
    EmptyAnnotationName {
        #[label("found here")]
        span: Span,
    },
    #[error("integer is too large")]
    IntegerOutOfRange {
        #[label("integer defined here")]
        span: Span,
    },
    #[error("expected {expected}, but found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        #[label("found here")]
        span: Span,
    },
    #[error("expected {expected}, but reached end of file")]
    UnexpectedEof {
        expected: String,
        #[label("file ends here")]
        span: Span,
    },
    #[error("multiple package names specified")]
    DuplicatePackage {
        #[label("defined here…")]
        first: Span,
        #[label("…and again here")]
        second: Span,
    },
    #[error("imports are only allowed at the beginning of the file")]
    #[diagnostic(help("move this import directly after the package declaration"))]
    MisplacedImport {
        #[label("found here")]
        span: Span,
    },
    #[error("'{path}' is imported more than once")]
    DuplicateImport {
        path: String,
        #[label("first imported here…")]
        first: Span,
        #[label("…and again here")]
        second: Span,
    },
    #[error("{name} is already defined")]
    DuplicateName {
        name: String,
        #[label("first defined here…")]
        first: Span,
        #[label("…and again here")]
        second: Span,
    },
    #[error("invalid type for map key, expected one of {expected}")]
    InvalidMapKeyType {
        expected: String,
        #[label("found here")]
        span: Span,
    },
    #[error("oneof field is not allowed at this point")]
    #[diagnostic(help("oneof groups may not be nested"))]
    NestedOneof {
        #[label("found here")]
        span: Span,
    },
    #[error("expected an annotation value")]
    EmptyAnnotationValue {
        #[label("found here")]
        span: Span,
    },
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, name: &str, source: &str) -> Self {
        let position = Some(LineResolver::new(source).resolve(kind.span().start));
        ParseError {
            kind: Box::new(kind),
            file: name.to_owned(),
            position,
            source_code: NamedSource::new(name, source.to_owned()),
        }
    }

    /// Gets the name of the file in which this error occurred.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Gets the primary source code span associated with this error.
    pub fn span(&self) -> Span {
        self.kind.span()
    }

    /// Gets the line and column at which this error occurred.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Returns true if this error was raised while splitting the source into tokens,
    /// rather than while checking the grammar.
    pub fn is_syntax(&self) -> bool {
        matches!(
            &*self.kind,
            ParseErrorKind::UnexpectedCharacter { .. }
                | ParseErrorKind::InvalidArrow { .. }
                | ParseErrorKind::UnterminatedString { .. }
                | ParseErrorKind::EmptyAnnotationName { .. }
                | ParseErrorKind::IntegerOutOfRange { .. }
        )
    }
}

impl ParseErrorKind {
    fn span(&self) -> Span {
        match self {
            ParseErrorKind::UnexpectedCharacter { span, .. }
            | ParseErrorKind::InvalidArrow { span, .. }
            | ParseErrorKind::UnterminatedString { span }
            | ParseErrorKind::EmptyAnnotationName { span }
            | ParseErrorKind::IntegerOutOfRange { span }
            | ParseErrorKind::UnexpectedToken { span, .. }
            | ParseErrorKind::UnexpectedEof { span, .. }
            | ParseErrorKind::MisplacedImport { span }
            | ParseErrorKind::InvalidMapKeyType { span, .. }
            | ParseErrorKind::NestedOneof { span }
            | ParseErrorKind::EmptyAnnotationValue { span } => span.clone(),
            ParseErrorKind::DuplicatePackage { second, .. }
            | ParseErrorKind::DuplicateImport { second, .. }
            | ParseErrorKind::DuplicateName { second, .. } => second.clone(),
        }
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.file)?;
        if let Some(position) = self.position {
            write!(f, "{}: ", position)?;
        }
        write!(f, "{}", self)
    }
}
