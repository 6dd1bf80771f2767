//! Handling of YARP source files


use std::{
    fs, io,
    path::{Path, PathBuf},
};

use miette::NamedSource;
use tracing::debug;
use yarp_idl_parse::File;

use crate::{error::ErrorKind, Error};

/// A parsed YARP source file, along with the text it was parsed from.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    path: Option<PathBuf>,
    source: String,
    ast: File,
}

impl SourceFile {
    /// Reads a YARP source file from the filesystem and parses it.
    ///
    /// # Errors
    ///
    /// Returns an error if there is an IO error opening the file, or it is not a valid
    /// YARP source file.
    ///
    /// If the file does not exist, an error for which
    /// [`is_file_not_found()`](Error::is_file_not_found) returns true is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::fs;
    /// # use yarp_idl::file::SourceFile;
    /// # let tempdir = tempfile::TempDir::new().unwrap();
    /// # std::env::set_current_dir(&tempdir).unwrap();
    /// fs::write("foo.yarp", "package foo;\nmessage Foo {}").unwrap();
    ///
    /// let file = SourceFile::open("foo.yarp".as_ref()).unwrap();
    /// assert_eq!(file.name(), "foo.yarp");
    /// assert_eq!(file.package(), "foo");
    /// assert_eq!(file.ast().declared_messages(), ["Foo"]);
    ///
    /// assert!(SourceFile::open("notfound.yarp".as_ref()).unwrap_err().is_file_not_found());
    /// ```
    pub fn open(path: &Path) -> Result<Self, Error> {
        let name = path.display().to_string();
        let map_io_err = |err: io::Error| -> Error {
            if err.kind() == io::ErrorKind::NotFound {
                Error::from_kind(ErrorKind::FileNotFound { name: name.clone() })
            } else {
                Error::from_kind(ErrorKind::OpenFile {
                    name: name.clone(),
                    path: path.to_owned(),
                    err,
                })
            }
        };

        let bytes = fs::read(path).map_err(map_io_err)?;
        let source = String::from_utf8(bytes).map_err(|_| {
            Error::from_kind(ErrorKind::FileInvalidUtf8 { name: name.clone() })
        })?;
        debug!("Parsing {}", name);

        let mut file = SourceFile::from_source(&name, source)?;
        file.path = Some(path.to_owned());
        Ok(file)
    }

    /// Parses a YARP source file from a string.
    ///
    /// The `name` is used for error reporting only.
    ///
    /// # Examples
    ///
    /// ```
    /// # use yarp_idl::file::SourceFile;
    /// let file = SourceFile::from_source("foo.yarp", "package foo;".to_owned()).unwrap();
    /// assert_eq!(file.path(), None);
    /// assert_eq!(file.source(), "package foo;");
    ///
    /// let err = SourceFile::from_source("foo.yarp", "message Foo {}".to_owned()).unwrap_err();
    /// assert!(err.is_parse());
    /// ```
    pub fn from_source(name: &str, source: String) -> Result<Self, Error> {
        let ast = yarp_idl_parse::parse(name, &source)?;
        Ok(SourceFile {
            name: name.to_owned(),
            path: None,
            source,
            ast,
        })
    }

    /// The name used to refer to this file in errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the filesystem path, if this source is backed by a physical file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the full content of the source file.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the parsed syntax tree of the source file.
    pub fn ast(&self) -> &File {
        &self.ast
    }

    /// The package declared by this file.
    pub fn package(&self) -> &str {
        self.ast.package()
    }

    pub(crate) fn to_named_source(&self) -> NamedSource {
        NamedSource::new(&self.name, self.source.clone())
    }
}
