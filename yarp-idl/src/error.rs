use std::{fmt, io, path::PathBuf};

use miette::{Diagnostic, NamedSource, SourceCode, SourceSpan};
use thiserror::Error;
use yarp_idl_parse::{Location, ParseError};

use crate::file::SourceFile;

/// An error that can occur when loading YARP source files.
#[derive(Diagnostic, Error)]
#[error(transparent)]
#[diagnostic(transparent)]
pub struct Error {
    kind: Box<ErrorKind>,
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum ErrorKind {
    #[error("{}", err)]
    #[diagnostic(forward(err))]
    Parse { err: ParseError },
    #[error("error opening file '{}'", path.display())]
    OpenFile {
        name: String,
        path: PathBuf,
        #[source]
        err: io::Error,
    },
    #[error("file '{name}' is not valid utf-8")]
    FileInvalidUtf8 { name: String },
    #[error("file '{name}' not found")]
    FileNotFound { name: String },
    #[error("'{name}' is a directory")]
    IsDirectory { name: String },
    #[error("import '{name}' not found (imported by '{file}')")]
    ImportNotFound {
        name: String,
        file: String,
        #[label("imported here")]
        span: Option<SourceSpan>,
        #[source_code]
        source_code: NamedSource,
    },
    #[error("mixed packages in source (reading '{file}'): found both '{expected}' and '{found}'")]
    #[diagnostic(help("all files passed to a single file set must declare the same package"))]
    MixedPackages {
        file: String,
        expected: String,
        found: String,
        #[label("package declared here")]
        span: Option<SourceSpan>,
        #[source_code]
        source_code: NamedSource,
    },
    #[error("duplicated definition of {name}")]
    #[diagnostic(help("'{name}' is already defined in '{first}'"))]
    DuplicateMessage {
        name: String,
        file: String,
        first: String,
        #[label("defined again here")]
        span: Option<SourceSpan>,
        #[source_code]
        source_code: NamedSource,
    },
    #[error("multiple declarations of service {name} (duplicate found in '{file}')")]
    #[diagnostic(help("service '{name}' is already defined in '{first}'"))]
    DuplicateService {
        name: String,
        file: String,
        first: String,
        #[label("defined again here")]
        span: Option<SourceSpan>,
        #[source_code]
        source_code: NamedSource,
    },
}

impl Error {
    /// The file in which this error occurred, if available.
    ///
    /// For errors raised while resolving an import, this is the file containing the
    /// `import` statement.
    pub fn file(&self) -> Option<&str> {
        match &*self.kind {
            ErrorKind::Parse { err } => Some(err.file()),
            ErrorKind::OpenFile { name, .. }
            | ErrorKind::FileInvalidUtf8 { name }
            | ErrorKind::FileNotFound { name }
            | ErrorKind::IsDirectory { name } => Some(name),
            ErrorKind::ImportNotFound { file, .. }
            | ErrorKind::MixedPackages { file, .. }
            | ErrorKind::DuplicateMessage { file, .. }
            | ErrorKind::DuplicateService { file, .. } => Some(file),
        }
    }

    pub(crate) fn from_kind(kind: ErrorKind) -> Self {
        Error {
            kind: Box::new(kind),
        }
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns true if a root file or an import could not be found.
    pub fn is_file_not_found(&self) -> bool {
        matches!(
            &*self.kind,
            ErrorKind::FileNotFound { .. } | ErrorKind::ImportNotFound { .. }
        )
    }

    /// Returns true if this error is caused by an invalid YARP source file.
    pub fn is_parse(&self) -> bool {
        matches!(
            &*self.kind,
            ErrorKind::Parse { .. } | ErrorKind::FileInvalidUtf8 { .. }
        )
    }

    /// Returns true if this error is caused by an IO error while opening a file.
    pub fn is_io(&self) -> bool {
        matches!(&*self.kind, ErrorKind::OpenFile { .. })
    }

    /// Returns true if a loaded file declares a different package than the files
    /// loaded before it.
    pub fn is_mixed_packages(&self) -> bool {
        matches!(&*self.kind, ErrorKind::MixedPackages { .. })
    }

    /// Returns true if a message or service is defined more than once in the set.
    pub fn is_duplicate_definition(&self) -> bool {
        matches!(
            &*self.kind,
            ErrorKind::DuplicateMessage { .. } | ErrorKind::DuplicateService { .. }
        )
    }

    pub(crate) fn mixed_packages(file: &SourceFile, expected: &str) -> Self {
        Error::from_kind(ErrorKind::MixedPackages {
            file: file.name().to_owned(),
            expected: expected.to_owned(),
            found: file.package().to_owned(),
            span: to_source_span(file.ast().package_location()),
            source_code: file.to_named_source(),
        })
    }

    pub(crate) fn duplicate_message(name: String, file: &SourceFile, first: &str) -> Self {
        let (_, bare_name) = crate::split_components(&name);
        Error::from_kind(ErrorKind::DuplicateMessage {
            span: to_source_span(file.ast().declaration_location(bare_name)),
            name,
            file: file.name().to_owned(),
            first: first.to_owned(),
            source_code: file.to_named_source(),
        })
    }

    pub(crate) fn duplicate_service(name: &str, file: &SourceFile, first: &str) -> Self {
        Error::from_kind(ErrorKind::DuplicateService {
            name: name.to_owned(),
            file: file.name().to_owned(),
            first: first.to_owned(),
            span: to_source_span(file.ast().declaration_location(name)),
            source_code: file.to_named_source(),
        })
    }

    /// Converts a not-found error for an imported path into one that points at the
    /// `import` statement in the importing file.
    pub(crate) fn into_import_error(self, file: &SourceFile, import: &str) -> Self {
        match *self.kind {
            ErrorKind::FileNotFound { .. } => Error::from_kind(ErrorKind::ImportNotFound {
                name: import.to_owned(),
                file: file.name().to_owned(),
                span: to_source_span(file.ast().import_location(import)),
                source_code: file.to_named_source(),
            }),
            _ => self,
        }
    }
}

fn to_source_span(location: Option<&Location>) -> Option<SourceSpan> {
    location.map(|location| location.span.clone().into())
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::from_kind(ErrorKind::Parse { err })
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.kind {
            ErrorKind::Parse { err } => err.fmt(f),
            ErrorKind::OpenFile { err, .. } => write!(f, "{}: {}", self, err),
            ErrorKind::FileInvalidUtf8 { .. }
            | ErrorKind::FileNotFound { .. }
            | ErrorKind::IsDirectory { .. } => write!(f, "{}", self),
            ErrorKind::ImportNotFound {
                file,
                span,
                source_code,
                ..
            }
            | ErrorKind::MixedPackages {
                file,
                span,
                source_code,
                ..
            }
            | ErrorKind::DuplicateMessage {
                file,
                span,
                source_code,
                ..
            }
            | ErrorKind::DuplicateService {
                file,
                span,
                source_code,
                ..
            } => {
                write!(f, "{}:", file)?;
                if let Some(span) = span {
                    if let Ok(span_contents) = source_code.read_span(span, 0, 0) {
                        write!(
                            f,
                            "{}:{}: ",
                            span_contents.line() + 1,
                            span_contents.column() + 1
                        )?;
                    }
                }
                write!(f, "{}", self)
            }
        }
    }
}

#[test]
fn fmt_debug_io() {
    let err = Error::from_kind(ErrorKind::OpenFile {
        name: "file.yarp".into(),
        path: "path/to/file.yarp".into(),
        err: io::Error::new(io::ErrorKind::Other, "io error"),
    });

    assert!(err.is_io());
    assert!(!err.is_parse());
    assert_eq!(err.file(), Some("file.yarp"));
    assert_eq!(
        format!("{:?}", err),
        "error opening file 'path/to/file.yarp': io error"
    );
}

#[test]
fn fmt_debug_parse() {
    let err = Error::from(yarp_idl_parse::parse("file.yarp", "invalid").unwrap_err());

    assert!(err.is_parse());
    assert!(!err.is_file_not_found());
    assert_eq!(err.file(), Some("file.yarp"));
    assert_eq!(
        format!("{:?}", err),
        "file.yarp:1:1: expected 'package', but found 'invalid'"
    );
}
