use std::{fs, path::Path};

use tempfile::TempDir;

use super::*;

fn write(dir: &Path, name: &str, source: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, source).unwrap();
    path
}

fn message_names(file_set: &FileSet) -> Vec<&str> {
    file_set
        .messages()
        .map(|message| message.name.as_str())
        .collect()
}

#[test]
fn empty_file_set() {
    let file_set = FileSet::new();
    assert_eq!(file_set.package(), None);
    assert!(file_set.files().is_empty());
    assert_eq!(file_set.messages().count(), 0);
    assert_eq!(file_set.services().count(), 0);
    assert!(file_set.find_message("Foo").is_none());
    assert!(!file_set.is_own_package("Foo"));
}

#[test]
fn load_with_extension_fallback() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "foo.yarp", "package foo;\nmessage Foo {}\n");

    let mut file_set = FileSet::new();
    file_set.load(dir.path().join("foo")).unwrap();

    assert_eq!(file_set.package(), Some("foo"));
    assert_eq!(message_names(&file_set), ["Foo"]);
    assert_eq!(
        file_set.files()[0].path(),
        Some(dir.path().join("foo.yarp").as_path())
    );
}

#[test]
fn load_custom_extension() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "foo.idl", "package foo;\nmessage Foo {}\n");

    let err = FileSet::new().load(dir.path().join("foo")).unwrap_err();
    assert!(err.is_file_not_found());

    let mut file_set = FileSet::new();
    file_set
        .extension("idl")
        .load(dir.path().join("foo"))
        .unwrap();
    assert_eq!(message_names(&file_set), ["Foo"]);
}

#[test]
fn load_prefers_file_over_directory() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("foo")).unwrap();
    write(dir.path(), "foo.yarp", "package foo;\nmessage Foo {}\n");

    let mut file_set = FileSet::new();
    file_set.load(dir.path().join("foo")).unwrap();
    assert_eq!(message_names(&file_set), ["Foo"]);
}

#[test]
fn load_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("foo");
    fs::create_dir(&path).unwrap();

    let err = FileSet::new().load(&path).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::IsDirectory { .. }));
    assert!(!err.is_file_not_found());
    assert_eq!(err.file(), Some(path.display().to_string().as_str()));
}

#[test]
fn load_not_found() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing");

    let err = FileSet::new().load(&path).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::FileNotFound { .. }));
    assert_eq!(
        format!("{:?}", err),
        format!("file '{}' not found", path.display())
    );
}

#[test]
fn load_twice() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "foo.yarp", "package foo;\nmessage Foo {}\n");

    let mut file_set = FileSet::new();
    file_set
        .load(dir.path().join("foo.yarp"))
        .unwrap()
        .load(dir.path().join("foo"))
        .unwrap()
        .load(dir.path().join(".").join("foo.yarp"))
        .unwrap();

    assert_eq!(file_set.files().len(), 1);
    assert_eq!(message_names(&file_set), ["Foo"]);
}

#[test]
fn diamond_imports() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "common.yarp", "package app;\nmessage Common {}\n");
    write(
        dir.path(),
        "left.yarp",
        "package app;\nimport \"common\";\nmessage Left {}\n",
    );
    write(
        dir.path(),
        "right.yarp",
        "package app;\nimport \"./common.yarp\";\nmessage Right {}\n",
    );
    let root = write(
        dir.path(),
        "root.yarp",
        "package app;\nimport \"left\";\nimport \"right\";\nmessage Root {}\n",
    );

    let file_set = crate::load([root]).unwrap();
    assert_eq!(file_set.files().len(), 4);
    assert_eq!(message_names(&file_set), ["Common", "Left", "Right", "Root"]);
}

#[test]
fn cyclic_imports() {
    let dir = TempDir::new().unwrap();
    let a = write(
        dir.path(),
        "a.yarp",
        "package app;\nimport \"b\";\nmessage A {\n    b B = 0;\n}\n",
    );
    write(
        dir.path(),
        "b.yarp",
        "package app;\nimport \"a\";\nmessage B {\n    a A = 0;\n}\n",
    );

    let file_set = crate::load([a]).unwrap();
    assert_eq!(file_set.files().len(), 2);
    assert_eq!(message_names(&file_set), ["B", "A"]);
    assert!(file_set.find_message("A").is_some());
    assert!(file_set.find_message("B").is_some());
}

#[test]
fn imports_relative_to_importer() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "nested/inner/common.yarp",
        "package app;\nmessage Common {}\n",
    );
    write(
        dir.path(),
        "nested/types.yarp",
        "package app;\nimport \"inner/common\";\nmessage Types {}\n",
    );
    let root = write(
        dir.path(),
        "root.yarp",
        "package app;\nimport \"nested/types\";\nmessage Root {}\n",
    );

    let file_set = crate::load([root]).unwrap();
    assert_eq!(message_names(&file_set), ["Common", "Types", "Root"]);
}

#[test]
fn imports_from_other_package() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "lib/common.yarp",
        "package lib.common;\n\
        message Timestamp {\n    seconds int64 = 0;\n}\n\
        service Clock {\n    now() -> Timestamp;\n}\n",
    );
    let root = write(
        dir.path(),
        "root.yarp",
        "package app;\n\
        import \"lib/common\";\n\
        message Event {\n    at lib.common.Timestamp = 0;\n}\n\
        service Clock {\n    next() -> Event;\n}\n",
    );

    let file_set = crate::load([root]).unwrap();
    assert_eq!(file_set.package(), Some("app"));
    assert_eq!(file_set.files().len(), 2);
    assert_eq!(file_set.files()[0].package(), "lib.common");

    assert_eq!(message_names(&file_set), ["Event"]);
    let services: Vec<_> = file_set
        .services()
        .map(|service| service.methods[0].name.as_str())
        .collect();
    assert_eq!(services, ["next"]);

    assert_eq!(
        file_set.find_message("lib.common.Timestamp").unwrap().name,
        "Timestamp"
    );
    assert!(file_set.find_message("Timestamp").is_none());
    assert!(!file_set.is_own_package("lib.common.Timestamp"));
    assert!(file_set.is_own_package("Event"));
    assert!(file_set.is_own_package("app.Event"));
}

#[test]
fn find_message() {
    let dir = TempDir::new().unwrap();
    let root = write(
        dir.path(),
        "root.yarp",
        "package org.example;\nmessage User {}\nservice Users {\n    get() -> User;\n}\n",
    );

    let file_set = crate::load([root]).unwrap();
    assert_eq!(file_set.find_message("User").unwrap().name, "User");
    assert_eq!(
        file_set.find_message("org.example.User").unwrap().name,
        "User"
    );
    assert!(file_set.find_message("example.User").is_none());
    assert!(file_set.find_message("Users").is_none());
    assert!(!file_set.is_own_package("Users"));
    assert!(!file_set.is_own_package("Missing"));
}

#[test]
fn mixed_packages() {
    let dir = TempDir::new().unwrap();
    let foo = write(dir.path(), "foo.yarp", "package foo;\nmessage Foo {}\n");
    let bar = write(dir.path(), "bar.yarp", "package bar;\nmessage Bar {}\n");

    let mut file_set = FileSet::new();
    file_set.load(&foo).unwrap();
    let err = file_set.load(&bar).unwrap_err();

    assert!(err.is_mixed_packages());
    assert_eq!(err.file(), Some(bar.display().to_string().as_str()));
    assert_eq!(
        format!("{:?}", err),
        format!(
            "{bar}:1:1: mixed packages in source (reading '{bar}'): found both 'foo' and 'bar'",
            bar = bar.display()
        )
    );
}

#[test]
fn duplicate_message() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.yarp", "package foo;\nmessage User {}\n");
    let b = write(dir.path(), "b.yarp", "package foo;\n\nmessage User {}\n");

    let err = crate::load([&a, &b]).unwrap_err();
    assert!(err.is_duplicate_definition());
    match err.kind() {
        ErrorKind::DuplicateMessage { name, first, .. } => {
            assert_eq!(name, "foo.User");
            assert_eq!(first, &a.display().to_string());
        }
        kind => panic!("unexpected error {:?}", kind),
    }
    assert_eq!(
        format!("{:?}", err),
        format!("{}:3:1: duplicated definition of foo.User", b.display())
    );
}

#[test]
fn duplicate_service() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.yarp", "package foo;\nservice Users {}\n");
    let b = write(
        dir.path(),
        "b.yarp",
        "package foo;\nmessage User {}\nservice Users {}\n",
    );

    let mut file_set = FileSet::new();
    file_set.load(&a).unwrap();
    let err = file_set.load(&b).unwrap_err();
    assert!(err.is_duplicate_definition());
    assert_eq!(
        format!("{:?}", err),
        format!(
            "{b}:3:1: multiple declarations of service Users (duplicate found in '{b}')",
            b = b.display()
        )
    );

    // The failing file is not registered.
    assert!(file_set.find_message("User").is_none());
    assert_eq!(file_set.files().len(), 1);
}

#[test]
fn import_not_found() {
    let dir = TempDir::new().unwrap();
    let root = write(
        dir.path(),
        "root.yarp",
        "package foo;\nimport \"./missing\";\n",
    );

    let err = crate::load([&root]).unwrap_err();
    assert!(err.is_file_not_found());
    assert_eq!(err.file(), Some(root.display().to_string().as_str()));
    assert_eq!(
        format!("{:?}", err),
        format!(
            "{root}:2:1: import 'missing' not found (imported by '{root}')",
            root = root.display()
        )
    );
}

#[test]
fn import_parse_error() {
    let dir = TempDir::new().unwrap();
    let broken = write(dir.path(), "broken.yarp", "package foo;\nmessage {}\n");
    let root = write(dir.path(), "root.yarp", "package foo;\nimport \"broken\";\n");

    let err = crate::load([root]).unwrap_err();
    assert!(err.is_parse());
    assert_eq!(
        format!("{:?}", err),
        format!(
            "{}:2:9: expected a message name, but found '{{'",
            broken.display()
        )
    );
}

#[test]
fn split_components() {
    assert_eq!(
        super::split_components("io.libyarp.RandomBytesRequest"),
        ("io.libyarp", "RandomBytesRequest")
    );
    assert_eq!(super::split_components("Foo"), ("", "Foo"));
    assert_eq!(super::split_components(""), ("", ""));
}
