//! Loading and resolution of YARP interface description files.
//!
//! For convenient loading of a set of source files in a single function, see [`load()`].
//! For more options see [`FileSet`].
//!
//! # Examples
//!
//! ```
//! # use std::fs;
//! # let tempdir = tempfile::TempDir::new().unwrap();
//! # std::env::set_current_dir(&tempdir).unwrap();
//! fs::write("common.yarp", "
//! package org.example;
//!
//! message Company {
//!     name string = 0;
//! }
//! ").unwrap();
//! fs::write("contacts.yarp", r#"
//! package org.example;
//!
//! import "common";
//!
//! message Contact {
//!     @optional
//!     company Company = 0;
//! }
//!
//! service ContactsService {
//!     list_contacts() -> stream Contact;
//! }
//! "#).unwrap();
//!
//! let file_set = yarp_idl::load(["contacts"]).unwrap();
//!
//! assert_eq!(file_set.package(), Some("org.example"));
//! let messages: Vec<_> = file_set.messages().map(|message| message.name.as_str()).collect();
//! assert_eq!(messages, ["Company", "Contact"]);
//! assert!(file_set.find_message("org.example.Company").is_some());
//! assert!(file_set.is_own_package("Contact"));
//! ```
//!
//! ### Error messages
//!
//! This crate uses [`miette`](https://crates.io/crates/miette) to add additional details to errors. For nice error messages, add `miette` as a dependency with the `fancy` feature enabled and return a [`miette::Result`](https://docs.rs/miette/latest/miette/type.Result.html).
//!
//! Example error message:
//!
//! ```text
//! Error:
//!   × import 'bar' not found (imported by 'root.yarp')
//!    ╭─[root.yarp:1:1]
//!  1 │ package foo;
//!  2 │ import "bar";
//!    · ──────┬──────
//!    ·       ╰── imported here
//!    ╰────
//! ```
#![warn(missing_debug_implementations, missing_docs)]
#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/yarp-idl/0.1.0/")]

pub mod file;

mod error;
mod file_set;

use std::path::Path;

pub use yarp_idl_parse as parse;

pub use self::error::Error;
pub use self::file_set::{split_components, FileSet, DEFAULT_EXTENSION};

/// Loads a set of YARP files, along with everything they import.
///
/// All files must declare the same package. This function is equivalent to:
///
/// ```rust
/// # use yarp_idl::FileSet;
/// # fn main() -> Result<(), yarp_idl::Error> {
/// # let files: Vec<std::path::PathBuf> = vec![];
/// let mut file_set = FileSet::new();
/// file_set.load_files(files)?;
/// # Ok(())
/// # }
/// ```
///
/// Unlike [`FileSet::load()`], a partially loaded set is never returned.
pub fn load(paths: impl IntoIterator<Item = impl AsRef<Path>>) -> Result<FileSet, Error> {
    let mut file_set = FileSet::new();
    file_set.load_files(paths)?;
    Ok(file_set)
}
