//! The syntax tree produced by [`parse()`](crate::parse()).

use std::{collections::HashMap, fmt, slice};

use logos::Span;

/// Name of the `@optional` annotation.
pub const OPTIONAL_ANNOTATION: &str = "optional";
/// Name of the `@repeated` annotation.
pub const REPEATED_ANNOTATION: &str = "repeated";
/// Name of the `@deprecated` annotation.
pub const DEPRECATED_ANNOTATION: &str = "deprecated";

/// Argument and return type of a method which does not declare one.
pub const VOID: &str = "void";

/// A 1-based line and column in a source file. Columns count characters, not bytes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// The line number, starting at 1.
    pub line: usize,
    /// The column number, starting at 1.
    pub column: usize,
}

/// The source range covered by a syntax node: from the start of its first token to the
/// end of its last token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location {
    /// Position of the first character of the node.
    pub start: Position,
    /// Position just past the last character of the node.
    pub end: Position,
    /// Byte offsets of the node in the source.
    pub span: Span,
}

/// A parsed source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct File {
    tree: Vec<Declaration>,
    package: String,
    declared_messages: Vec<String>,
    declared_services: Vec<String>,
    imported_files: Vec<String>,
    names: HashMap<String, usize>,
}

/// A top-level item of a [`File`], in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// The `package` clause.
    Package(Package),
    /// An `import` statement.
    Import(Import),
    /// A `message` declaration.
    Message(Message),
    /// A `service` declaration.
    Service(Service),
}

/// A `package foo.bar;` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub location: Location,
    pub name: String,
}

/// An `import "path";` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub location: Location,
    /// The path as written in the source.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub location: Location,
    pub name: String,
    pub comments: Vec<String>,
    pub annotations: Annotations,
    pub members: Vec<MessageMember>,
}

/// An entry in the body of a [`Message`].
#[derive(Debug, Clone, PartialEq)]
pub enum MessageMember {
    Field(Field),
    OneOf(OneOfField),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub location: Location,
    pub name: String,
    pub ty: Type,
    pub index: u64,
    pub comments: Vec<String>,
    pub annotations: Annotations,
}

/// A `oneof { ... } = N;` group. At most one of its fields is populated at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct OneOfField {
    pub location: Location,
    pub index: u64,
    pub fields: Vec<Field>,
    pub comments: Vec<String>,
    pub annotations: Annotations,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub location: Location,
    pub name: String,
    pub comments: Vec<String>,
    pub annotations: Annotations,
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub location: Location,
    pub name: String,
    pub comments: Vec<String>,
    pub annotations: Annotations,
    /// The argument type name, or [`VOID`].
    pub argument_type: String,
    /// The return type name, or [`VOID`].
    pub return_type: String,
    /// Whether the method produces a stream of responses.
    pub return_streaming: bool,
}

/// An `@name` or `@name(v1, v2)` annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub location: Location,
    pub name: String,
    pub values: Vec<String>,
}

/// The annotations attached to a declaration, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations(Vec<Annotation>);

/// The type of a message field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(Primitive),
    Array(Box<Type>),
    /// A map. The key is never [`Primitive::Bool`].
    Map {
        key: Primitive,
        value: Box<Type>,
    },
    /// A reference to a message by name, resolved once all files are loaded.
    Unresolved(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Primitive {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    String,
}

const PRIMITIVES: [(&str, Primitive); 12] = [
    ("string", Primitive::String),
    ("uint8", Primitive::Uint8),
    ("uint16", Primitive::Uint16),
    ("uint32", Primitive::Uint32),
    ("uint64", Primitive::Uint64),
    ("int8", Primitive::Int8),
    ("int16", Primitive::Int16),
    ("int32", Primitive::Int32),
    ("int64", Primitive::Int64),
    ("float32", Primitive::Float32),
    ("float64", Primitive::Float64),
    ("bool", Primitive::Bool),
];

impl File {
    /// The dotted package name.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// All declarations, in source order.
    pub fn declarations(&self) -> &[Declaration] {
        &self.tree
    }

    /// Imported paths with redundant separators and `.`/`..` segments removed.
    pub fn imports(&self) -> &[String] {
        &self.imported_files
    }

    /// Names of declared messages, in source order.
    pub fn declared_messages(&self) -> &[String] {
        &self.declared_messages
    }

    /// Names of declared services, in source order.
    pub fn declared_services(&self) -> &[String] {
        &self.declared_services
    }

    /// Returns true if a message or service with this name is declared in the file.
    pub fn is_defined(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn message(&self, name: &str) -> Option<&Message> {
        match self.declaration(name)? {
            Declaration::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        match self.declaration(name)? {
            Declaration::Service(service) => Some(service),
            _ => None,
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.tree.iter().filter_map(|decl| match decl {
            Declaration::Message(message) => Some(message),
            _ => None,
        })
    }

    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.tree.iter().filter_map(|decl| match decl {
            Declaration::Service(service) => Some(service),
            _ => None,
        })
    }

    /// Gets the location of a declared message or service.
    pub fn declaration_location(&self, name: &str) -> Option<&Location> {
        match self.declaration(name)? {
            Declaration::Message(message) => Some(&message.location),
            Declaration::Service(service) => Some(&service.location),
            Declaration::Package(_) | Declaration::Import(_) => None,
        }
    }

    /// Gets the location of an import statement, matched by its cleaned path as returned
    /// from [`imports()`](File::imports).
    pub fn import_location(&self, path: &str) -> Option<&Location> {
        self.tree.iter().find_map(|decl| match decl {
            Declaration::Import(import) if clean_path(&import.path) == path => {
                Some(&import.location)
            }
            _ => None,
        })
    }

    /// Gets the location of the `package` clause.
    pub fn package_location(&self) -> Option<&Location> {
        self.tree.iter().find_map(|decl| match decl {
            Declaration::Package(package) => Some(&package.location),
            _ => None,
        })
    }

    fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.names.get(name).and_then(|&index| self.tree.get(index))
    }

    /// Appends a declaration. Callers must check names and imports for duplicates first.
    pub(crate) fn push(&mut self, decl: Declaration) {
        match &decl {
            Declaration::Package(package) => self.package = package.name.clone(),
            Declaration::Import(import) => self.imported_files.push(clean_path(&import.path)),
            Declaration::Message(message) => {
                self.declared_messages.push(message.name.clone());
                self.names.insert(message.name.clone(), self.tree.len());
            }
            Declaration::Service(service) => {
                self.declared_services.push(service.name.clone());
                self.names.insert(service.name.clone(), self.tree.len());
            }
        }
        self.tree.push(decl);
    }
}

impl Message {
    /// Iterates all fields, including those nested in oneof groups, in source order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.members.iter().flat_map(|member| match member {
            MessageMember::Field(field) => slice::from_ref(field).iter(),
            MessageMember::OneOf(oneof) => oneof.fields.iter(),
        })
    }

    pub fn oneofs(&self) -> impl Iterator<Item = &OneOfField> {
        self.members.iter().filter_map(|member| match member {
            MessageMember::OneOf(oneof) => Some(oneof),
            MessageMember::Field(_) => None,
        })
    }
}

impl Annotations {
    /// Finds the first annotation with the given name. Later annotations with the same
    /// name are ignored.
    pub fn find(&self, name: &str) -> Option<&Annotation> {
        self.0.iter().find(|annotation| annotation.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn iter(&self) -> slice::Iter<'_, Annotation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Annotation>> for Annotations {
    fn from(annotations: Vec<Annotation>) -> Self {
        Annotations(annotations)
    }
}

impl<'a> IntoIterator for &'a Annotations {
    type Item = &'a Annotation;
    type IntoIter = slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Primitive {
    /// Looks up a primitive by its source spelling, e.g. `uint32`.
    pub fn from_name(name: &str) -> Option<Self> {
        PRIMITIVES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, primitive)| primitive)
    }

    pub fn name(self) -> &'static str {
        PRIMITIVES
            .iter()
            .find(|(_, p)| *p == self)
            .map(|&(name, _)| name)
            .unwrap_or_default()
    }

    /// Returns true if this type may be used as the key of a map.
    pub fn is_map_key(self) -> bool {
        self != Primitive::Bool
    }

    /// All primitives which may be used as the key of a map, in a stable order.
    pub(crate) fn map_key_names() -> impl Iterator<Item = &'static str> {
        PRIMITIVES
            .iter()
            .filter(|(_, p)| p.is_map_key())
            .map(|&(name, _)| name)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(primitive) => write!(f, "{}", primitive),
            Type::Array(ty) => write!(f, "array<{}>", ty),
            Type::Map { key, value } => write!(f, "map<{},{}>", key, value),
            Type::Unresolved(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Lexically normalizes an import path: repeated separators and `.` segments are removed
/// and `..` segments cancel the preceding segment where there is one.
pub(crate) fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            part => parts.push(part),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_owned(),
        (false, false) => joined,
    }
}

#[test]
fn clean_import_paths() {
    assert_eq!(clean_path("foo"), "foo");
    assert_eq!(clean_path("./foo"), "foo");
    assert_eq!(clean_path("a//b/./c"), "a/b/c");
    assert_eq!(clean_path("a/b/../c"), "a/c");
    assert_eq!(clean_path("../a"), "../a");
    assert_eq!(clean_path("../../a/.."), "../..");
    assert_eq!(clean_path("/../a"), "/a");
    assert_eq!(clean_path(""), ".");
}

#[test]
fn primitive_names() {
    for (name, primitive) in PRIMITIVES {
        assert_eq!(Primitive::from_name(name), Some(primitive));
        assert_eq!(primitive.name(), name);
    }
    assert_eq!(Primitive::from_name("Company"), None);
    assert!(!Primitive::Bool.is_map_key());
    assert!(!Primitive::map_key_names().any(|name| name == "bool"));
}

#[test]
fn type_display() {
    let ty = Type::Map {
        key: Primitive::Uint8,
        value: Box::new(Type::Array(Box::new(Type::Unresolved("foo.Bar".to_owned())))),
    };
    assert_eq!(ty.to_string(), "map<uint8,array<foo.Bar>>");
}
