//! importjson: JSON documents as live, importable class modules.
//!
//! This is the library root that exports all modules.
//!
//! # Pipeline
//!
//! A document is loaded in three stages:
//! - **Model**: the parsed JSON is walked into module, class and attribute models
//! - **Emit**: the model is rendered into a structural program (with a text listing)
//! - **Link**: the program becomes a live module of classes with constructors,
//!   constrained properties and string templates

// Allow some clippy lints that are stylistic and not critical
#![allow(clippy::module_inception)]
#![allow(clippy::result_large_err)]
#![allow(clippy::new_without_default)]
#![allow(clippy::type_complexity)]

pub mod config;
pub mod emit;
pub mod error;
pub mod interpreter;
pub mod loader;
pub mod model;

use std::path::Path;
use std::rc::Rc;

pub use config::{configure, get_configure, Configuration};
pub use error::ImportJsonError;
pub use interpreter::{Arguments, Class, Module, Value};
pub use loader::{JsonLoader, LoadState, Lookup};

/// Generate the program for the document at `path` without activating it.
pub fn generate(name: &str, path: &Path) -> Result<emit::CompiledModule, ImportJsonError> {
    loader::compile_document(name, path)
        .map(|(_, compiled)| compiled)
        .map_err(|cause| error::ImportError::activation(name, cause).into())
}

/// Generate the text listing for the document at `path`.
pub fn source(name: &str, path: &Path) -> Result<String, ImportJsonError> {
    generate(name, path).map(|compiled| emit::disassemble(&compiled))
}

/// Import `name` with a loader searching `IMPORTJSON_PATH` and the current directory.
pub fn load(name: &str) -> Result<Rc<Module>, ImportJsonError> {
    Ok(JsonLoader::from_env().import(name)?)
}
