//! A live, importable module.

use std::cell::{Cell, Ref, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::emit::CompiledModule;
use crate::error::RuntimeError;
use crate::interpreter::class::{Arguments, Class};
use crate::interpreter::value::Value;

/// Name and declared default of a module attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleAttributeInfo {
    pub name: String,
    pub default: Value,
}

/// A class of the module together with its parent.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub class: Rc<Class>,
    /// `None` for classes extending the generic base.
    pub parent_class: Option<Rc<Class>>,
}

/// Everything a module holds; swapped wholesale on reload.
#[derive(Debug)]
pub struct ModuleState {
    pub file: PathBuf,
    pub doc: String,
    pub json: Json,
    pub compiled: CompiledModule,
    pub attributes: IndexMap<String, Value>,
    pub classes: IndexMap<String, Rc<Class>>,
}

/// A live module. Reloading replaces the state in place, so every `Rc`
/// handed out for the module stays valid.
#[derive(Debug)]
pub struct Module {
    name: String,
    state: RefCell<ModuleState>,
    generation: Cell<u32>,
}

impl Module {
    pub fn new(name: impl Into<String>, state: ModuleState) -> Self {
        Self {
            name: name.into(),
            state: RefCell::new(state),
            generation: Cell::new(1),
        }
    }

    /// Install freshly linked state. Existing instances keep their classes.
    pub fn replace(&self, state: ModuleState) {
        *self.state.borrow_mut() = state;
        self.generation.set(self.generation.get() + 1);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 1 after the first load, incremented by every reload.
    pub fn generation(&self) -> u32 {
        self.generation.get()
    }

    pub fn file(&self) -> PathBuf {
        self.state.borrow().file.clone()
    }

    pub fn doc(&self) -> String {
        self.state.borrow().doc.clone()
    }

    /// The document the module was generated from.
    pub fn json(&self) -> Json {
        self.state.borrow().json.clone()
    }

    pub fn compiled(&self) -> Ref<'_, CompiledModule> {
        Ref::map(self.state.borrow(), |s| &s.compiled)
    }

    /// Module attribute or class by name. `__name__`, `__file__` and
    /// `__doc__` are also available.
    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        let state = self.state.borrow();
        match name {
            "__name__" => return Ok(Value::Str(self.name.clone())),
            "__file__" => return Ok(Value::Str(path_str(&state.file))),
            "__doc__" => return Ok(Value::Str(state.doc.clone())),
            _ => {}
        }
        if let Some(value) = state.attributes.get(name) {
            return Ok(value.clone());
        }
        state
            .classes
            .get(name)
            .map(|class| Value::Class(Rc::clone(class)))
            .ok_or_else(|| RuntimeError::no_such_attribute(format!("module {}", self.name), name))
    }

    /// Rebind a module attribute.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.state
            .borrow_mut()
            .attributes
            .insert(name.into(), value.into());
    }

    pub fn class(&self, name: &str) -> Result<Rc<Class>, RuntimeError> {
        let state = self.state.borrow();
        match state.classes.get(name) {
            Some(class) => Ok(Rc::clone(class)),
            None if state.attributes.contains_key(name) => Err(RuntimeError::NotAClass(name.to_string())),
            None => Err(RuntimeError::no_such_attribute(format!("module {}", self.name), name)),
        }
    }

    /// Instantiate one of the module's classes.
    pub fn instantiate(&self, class: &str, args: Arguments) -> Result<Value, RuntimeError> {
        let class = self.class(class)?;
        Class::instantiate(&class, args)
    }

    pub fn class_names(&self) -> Vec<String> {
        self.state.borrow().classes.keys().cloned().collect()
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.state.borrow().attributes.keys().cloned().collect()
    }

    /// Module attributes with the defaults the document declares.
    pub fn get_attributes(&self) -> Vec<ModuleAttributeInfo> {
        self.state
            .borrow()
            .compiled
            .attributes()
            .map(|(name, value)| ModuleAttributeInfo {
                name: name.to_string(),
                default: Value::from_constant(value),
            })
            .collect()
    }

    pub fn get_classes(&self) -> Vec<ClassInfo> {
        self.state
            .borrow()
            .classes
            .iter()
            .map(|(name, class)| ClassInfo {
                name: name.clone(),
                class: Rc::clone(class),
                parent_class: class.superclass.clone(),
            })
            .collect()
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
