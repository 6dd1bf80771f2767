use std::{
    collections::{HashMap, HashSet},
    ffi::OsString,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, trace};
use yarp_idl_parse::{Declaration, Message, Service};

use crate::{error::ErrorKind, file::SourceFile, Error};

#[cfg(test)]
mod tests;

/// The extension appended to paths which do not name an existing file.
pub const DEFAULT_EXTENSION: &str = "yarp";

/// The merged declarations of a set of YARP source files sharing a single package.
///
/// Files are added with [`load()`](FileSet::load). Each file's imports are resolved
/// relative to the directory containing it and loaded before the file itself, so that
/// every message the file may refer to is already indexed by the time it is registered.
/// A file is only ever loaded once, so diamond and cyclic imports are permitted.
///
/// Messages from imported files in other packages can be looked up by their
/// fully-qualified name, but only declarations from the set's own package are returned
/// from [`messages()`](FileSet::messages) and [`services()`](FileSet::services).
pub struct FileSet {
    package: Option<String>,
    extension: String,
    loaded: HashSet<PathBuf>,
    files: Vec<SourceFile>,
    index: HashMap<String, DeclarationRef>,
    known_services: HashMap<String, DeclarationRef>,
    messages: Vec<DeclarationRef>,
    services: Vec<DeclarationRef>,
}

#[derive(Debug, Clone, Copy)]
struct DeclarationRef {
    file: usize,
    index: usize,
}

impl FileSet {
    /// Creates an empty [`FileSet`].
    pub fn new() -> Self {
        FileSet {
            package: None,
            extension: DEFAULT_EXTENSION.to_owned(),
            loaded: HashSet::new(),
            files: Vec::new(),
            index: HashMap::new(),
            known_services: HashMap::new(),
            messages: Vec::new(),
            services: Vec::new(),
        }
    }

    /// Set the extension tried when a path does not name an existing file.
    ///
    /// Defaults to [`DEFAULT_EXTENSION`]. The extension should not include a leading `.`.
    pub fn extension(&mut self, extension: impl Into<String>) -> &mut Self {
        self.extension = extension.into();
        self
    }

    /// Loads the file at the given path, along with everything it imports.
    ///
    /// If the path does not exist, or is a directory, it is retried with the
    /// [extension](FileSet::extension) appended. Loading a file which has already been
    /// loaded, either directly or as an import, has no effect.
    ///
    /// The first file loaded determines the package of the set. Any other file passed to
    /// this method must declare the same package.
    ///
    /// # Errors
    ///
    /// If an error is returned, the set may contain some of the files loaded before the
    /// failure and should be discarded.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, Error> {
        let file = match self.open(path.as_ref())? {
            Some(file) => file,
            None => return Ok(self),
        };

        match &self.package {
            Some(package) if package != file.package() => {
                return Err(Error::mixed_packages(&file, package));
            }
            Some(_) => {}
            None => self.package = Some(file.package().to_owned()),
        }

        self.add_file(file)?;
        Ok(self)
    }

    /// Loads each of the given files in order. See [`load()`](FileSet::load).
    pub fn load_files(
        &mut self,
        paths: impl IntoIterator<Item = impl AsRef<Path>>,
    ) -> Result<&mut Self, Error> {
        for path in paths {
            self.load(path)?;
        }
        Ok(self)
    }

    /// The package shared by all files loaded into this set, or `None` if nothing has
    /// been loaded yet.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Every loaded file, including imports from other packages. Imported files are
    /// ordered before the files that import them.
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Messages declared in the set's own package, in the order they were loaded.
    pub fn messages(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages
            .iter()
            .filter_map(|&decl| match self.declaration(decl)? {
                Declaration::Message(message) => Some(message),
                _ => None,
            })
    }

    /// Services declared in the set's own package, in the order they were loaded.
    pub fn services(&self) -> impl Iterator<Item = &Service> + '_ {
        self.services
            .iter()
            .filter_map(|&decl| match self.declaration(decl)? {
                Declaration::Service(service) => Some(service),
                _ => None,
            })
    }

    /// Looks up a message by its fully-qualified name, such as `foo.bar.Baz`. A bare
    /// name, such as `Baz`, is looked up in the set's own package.
    pub fn find_message(&self, name: &str) -> Option<&Message> {
        let decl = self.index.get(&self.qualify(name))?;
        match self.declaration(*decl)? {
            Declaration::Message(message) => Some(message),
            _ => None,
        }
    }

    /// Returns true if the given name resolves to a message declared in the set's own
    /// package.
    pub fn is_own_package(&self, name: &str) -> bool {
        match (self.index.get(&self.qualify(name)), &self.package) {
            (Some(decl), Some(package)) => self
                .files
                .get(decl.file)
                .map_or(false, |file| file.package() == package.as_str()),
            _ => false,
        }
    }

    fn qualify(&self, name: &str) -> String {
        match &self.package {
            Some(package) if !name.contains('.') => format!("{}.{}", package, name),
            _ => name.to_owned(),
        }
    }

    fn declaration(&self, decl: DeclarationRef) -> Option<&Declaration> {
        self.files
            .get(decl.file)?
            .ast()
            .declarations()
            .get(decl.index)
    }

    /// Opens and parses the file at `path`, or returns `None` if it was already loaded.
    fn open(&mut self, path: &Path) -> Result<Option<SourceFile>, Error> {
        let path = self.resolve_path(path)?;
        let canonical = fs::canonicalize(&path).map_err(|err| open_file_error(&path, err))?;
        if !self.loaded.insert(canonical) {
            debug!("Skipping {}, already loaded", path.display());
            return Ok(None);
        }

        debug!("Loading {}", path.display());
        SourceFile::open(&path).map(Some)
    }

    fn resolve_path(&self, path: &Path) -> Result<PathBuf, Error> {
        match fs::metadata(path) {
            Ok(metadata) if !metadata.is_dir() => return Ok(path.to_owned()),
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(open_file_error(path, err)),
        }

        let mut with_extension = OsString::from(path);
        with_extension.push(".");
        with_extension.push(&self.extension);
        let with_extension = PathBuf::from(with_extension);
        if fs::metadata(&with_extension).map_or(false, |metadata| !metadata.is_dir()) {
            return Ok(with_extension);
        }

        let name = path.display().to_string();
        if path.is_dir() {
            Err(Error::from_kind(ErrorKind::IsDirectory { name }))
        } else {
            Err(Error::from_kind(ErrorKind::FileNotFound { name }))
        }
    }

    fn add_file(&mut self, file: SourceFile) -> Result<(), Error> {
        let dir = file
            .path()
            .and_then(Path::parent)
            .map(Path::to_owned)
            .unwrap_or_default();

        for import in file.ast().imports() {
            let imported = self
                .open(&dir.join(import))
                .map_err(|err| err.into_import_error(&file, import))?;
            if let Some(imported) = imported {
                self.add_file(imported)?;
            }
        }

        self.register(file)
    }

    fn register(&mut self, file: SourceFile) -> Result<(), Error> {
        let file_index = self.files.len();
        let own_package = self.package.as_deref() == Some(file.package());

        let mut messages = Vec::new();
        let mut services = Vec::new();
        for (index, decl) in file.ast().declarations().iter().enumerate() {
            let decl_ref = DeclarationRef {
                file: file_index,
                index,
            };
            match decl {
                Declaration::Message(message) => {
                    let name = format!("{}.{}", file.package(), message.name);
                    if let Some(first) = self.index.get(&name) {
                        let first = self.file_name(*first);
                        return Err(Error::duplicate_message(name, &file, first));
                    }
                    trace!("Registering message {}", name);
                    messages.push((name, decl_ref));
                }
                Declaration::Service(service) if own_package => {
                    if let Some(first) = self.known_services.get(&service.name) {
                        let first = self.file_name(*first);
                        return Err(Error::duplicate_service(&service.name, &file, first));
                    }
                    trace!("Registering service {}", service.name);
                    services.push((service.name.clone(), decl_ref));
                }
                _ => {}
            }
        }

        for (name, decl_ref) in messages {
            self.index.insert(name, decl_ref);
            if own_package {
                self.messages.push(decl_ref);
            }
        }
        for (name, decl_ref) in services {
            self.known_services.insert(name, decl_ref);
            self.services.push(decl_ref);
        }
        self.files.push(file);
        Ok(())
    }

    fn file_name(&self, decl: DeclarationRef) -> &str {
        self.files.get(decl.file).map_or("", SourceFile::name)
    }
}

impl Default for FileSet {
    fn default() -> Self {
        FileSet::new()
    }
}

impl fmt::Debug for FileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSet")
            .field("package", &self.package)
            .field("extension", &self.extension)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

/// Splits a dotted name into its package and bare name. If the name has no package,
/// the returned package is empty.
///
/// # Examples
///
/// ```
/// # use yarp_idl::split_components;
/// assert_eq!(split_components("org.example.Contact"), ("org.example", "Contact"));
/// assert_eq!(split_components("Contact"), ("", "Contact"));
/// ```
pub fn split_components(name: &str) -> (&str, &str) {
    name.rsplit_once('.').unwrap_or(("", name))
}

fn open_file_error(path: &Path, err: io::Error) -> Error {
    Error::from_kind(ErrorKind::OpenFile {
        name: path.display().to_string(),
        path: path.to_owned(),
        err,
    })
}
