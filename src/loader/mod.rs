//! Finding, activating and reloading JSON modules.
//!
//! A [`JsonLoader`] maps dotted names to documents through a
//! [`DocumentResolver`], generates a program for each document and links it
//! into a live [`Module`]. Live modules are kept per loader; the paths of
//! found documents are recorded process-wide.

pub mod resolver;


use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Mutex;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use serde_json::Value as Json;
use tracing::{debug, info, warn};

pub use resolver::DocumentResolver;

use crate::config::{current_configuration, Configuration};
use crate::emit::{disassemble, CodeEmitter, CompiledModule};
use crate::error::{ActivationCause, ImportError, ParseError};
use crate::interpreter::{link, Module};
use crate::model::ModuleModel;

/// Environment variable listing extra search roots.
pub const PATH_VAR: &str = "IMPORTJSON_PATH";

lazy_static! {
    /// Documents located by any loader, by dotted name.
    static ref FOUND_MODULES: Mutex<HashMap<String, PathBuf>> = Mutex::new(HashMap::new());
}

fn found_modules() -> std::sync::MutexGuard<'static, HashMap<String, PathBuf>> {
    FOUND_MODULES.lock().unwrap_or_else(|e| e.into_inner())
}

/// The recorded document for `name`, if any loader has found it.
pub fn found_path(name: &str) -> Option<PathBuf> {
    found_modules().get(name).cloned()
}

/// Drop the recorded document for `name`.
pub fn forget_found(name: &str) -> Option<PathBuf> {
    found_modules().remove(name)
}

fn record_found(name: &str, path: &Path) {
    found_modules().insert(name.to_string(), path.to_path_buf());
}

/// Outcome of looking a name up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(PathBuf),
    NotFound,
}

/// Where a name stands in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Unprobed,
    Found(PathBuf),
    /// `generation` is 1 after the first load and grows with every reload.
    Loaded { path: PathBuf, generation: u32 },
}

/// Read, parse and generate the program for the document at `path`.
pub fn compile_document(name: &str, path: &Path) -> Result<(Json, CompiledModule), ActivationCause> {
    let text = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let json: Json = serde_json::from_str(&text).map_err(|source| ParseError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let model = ModuleModel::build(name, path, &json)?;
    let compiled = CodeEmitter::new().emit(&model);
    Ok((json, compiled))
}

/// Loads JSON documents as live modules.
#[derive(Debug)]
pub struct JsonLoader {
    resolver: DocumentResolver,
    modules: RefCell<IndexMap<String, Rc<Module>>>,
}

impl Default for JsonLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonLoader {
    /// Search the current directory with the process-wide configuration.
    pub fn new() -> Self {
        Self::with_config(current_configuration())
    }

    pub fn with_config(config: Configuration) -> Self {
        Self {
            resolver: DocumentResolver::new(vec![PathBuf::from(".")], config.json_suffixes),
            modules: RefCell::new(IndexMap::new()),
        }
    }

    /// Replace the search roots.
    pub fn with_search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.resolver = DocumentResolver::new(
            paths.into_iter().map(Into::into).collect(),
            self.resolver.suffixes().to_vec(),
        );
        self
    }

    /// Search the roots in `IMPORTJSON_PATH`, then the current directory.
    pub fn from_env() -> Self {
        let mut roots: Vec<PathBuf> = std::env::var_os(PATH_VAR)
            .map(|value| std::env::split_paths(&value).collect())
            .unwrap_or_default();
        roots.push(PathBuf::from("."));
        Self::new().with_search_paths(roots)
    }

    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.resolver.add_search_path(path);
    }

    pub fn resolver(&self) -> &DocumentResolver {
        &self.resolver
    }

    /// Locate the document for `name`. Not finding one is not an error.
    pub fn find(&self, name: &str) -> Lookup {
        match self.resolver.resolve(name) {
            Some(path) => {
                debug!(module = name, path = %path.display(), "found document");
                record_found(name, &path);
                Lookup::Found(path)
            }
            None => Lookup::NotFound,
        }
    }

    /// The live module for `name`, activating it on first use.
    pub fn import(&self, name: &str) -> Result<Rc<Module>, ImportError> {
        match self.module(name) {
            Some(module) => Ok(module),
            None => self.activate(name),
        }
    }

    /// Find and (re)generate `name`. An already live module is updated in place.
    pub fn activate(&self, name: &str) -> Result<Rc<Module>, ImportError> {
        let path = match self.find(name) {
            Lookup::Found(path) => path,
            Lookup::NotFound => return Err(ImportError::NotFound(name.to_string())),
        };
        self.activate_at(name, &path, self.module(name))
    }

    /// Regenerate `module` in place from the document it was loaded from.
    /// On success `module` is the registered unit for its name, replacing
    /// any other module registered since.
    pub fn reload(&self, module: &Rc<Module>) -> Result<Rc<Module>, ImportError> {
        let path = module.file();
        self.activate_at(module.name(), &path, Some(Rc::clone(module)))
    }

    fn activate_at(
        &self,
        name: &str,
        path: &Path,
        existing: Option<Rc<Module>>,
    ) -> Result<Rc<Module>, ImportError> {
        let state = compile_document(name, path)
            .and_then(|(json, compiled)| link(compiled, json).map_err(ActivationCause::from));

        let state = match state {
            Ok(state) => state,
            Err(cause) => {
                if existing.is_none() {
                    warn!(module = name, path = %path.display(), error = %cause, "load failed, registration rolled back");
                    forget_found(name);
                } else {
                    warn!(module = name, path = %path.display(), error = %cause, "reload failed, previous module kept");
                }
                return Err(ImportError::activation(name, cause));
            }
        };

        let classes = state.classes.len();
        let attributes = state.attributes.len();
        let module = match existing {
            Some(module) => {
                module.replace(state);
                info!(module = name, path = %path.display(), classes, attributes, generation = module.generation(), "reloaded module");
                module
            }
            None => {
                let module = Rc::new(Module::new(name, state));
                info!(module = name, path = %path.display(), classes, attributes, "activated module");
                module
            }
        };
        record_found(name, path);
        let replaced = self
            .modules
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&module));
        if replaced.is_some_and(|previous| !Rc::ptr_eq(&previous, &module)) {
            debug!(module = name, "replaced a different registered module");
        }
        Ok(module)
    }

    /// JSON modules are never packages. Only names that were found can be asked about.
    pub fn is_package(&self, name: &str) -> Result<bool, ImportError> {
        if self.modules.borrow().contains_key(name) || found_path(name).is_some() {
            Ok(false)
        } else {
            Err(ImportError::NotFound(name.to_string()))
        }
    }

    /// The generated program for `name`, without activating it.
    pub fn compiled(&self, name: &str) -> Result<CompiledModule, ImportError> {
        let path = match self.find(name) {
            Lookup::Found(path) => path,
            Lookup::NotFound => return Err(ImportError::NotFound(name.to_string())),
        };
        compile_document(name, &path)
            .map(|(_, compiled)| compiled)
            .map_err(|cause| {
                if self.module(name).is_none() {
                    forget_found(name);
                }
                ImportError::activation(name, cause)
            })
    }

    /// The text listing of the generated program for `name`.
    pub fn source(&self, name: &str) -> Result<String, ImportError> {
        self.compiled(name).map(|compiled| disassemble(&compiled))
    }

    pub fn module(&self, name: &str) -> Option<Rc<Module>> {
        self.modules.borrow().get(name).cloned()
    }

    /// Names of live modules, in activation order.
    pub fn loaded_modules(&self) -> Vec<String> {
        self.modules.borrow().keys().cloned().collect()
    }

    /// Unregister a live module. Outstanding handles stay usable.
    pub fn forget(&self, name: &str) -> Option<Rc<Module>> {
        self.modules.borrow_mut().shift_remove(name)
    }

    pub fn state(&self, name: &str) -> LoadState {
        if let Some(module) = self.module(name) {
            return LoadState::Loaded {
                path: module.file(),
                generation: module.generation(),
            };
        }
        match found_path(name) {
            Some(path) => LoadState::Found(path),
            None => LoadState::Unprobed,
        }
    }
}
