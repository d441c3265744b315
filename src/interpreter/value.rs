//! Runtime values for generated modules.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::emit::Constant;
use crate::error::RuntimeError;
use crate::interpreter::class::{Arguments, Class, Instance};
use crate::model::template::Formattable;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Sequence value, shared by reference like the containers it models.
    List(Rc<RefCell<Vec<Value>>>),
    /// Mapping value, ordered by insertion.
    Dict(Rc<RefCell<IndexMap<String, Value>>>),
    Class(Rc<Class>),
    Instance(Rc<RefCell<Instance>>),
}

impl Value {
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn dict<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Dict(Rc::new(RefCell::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    /// Materialize a constant. Containers are always freshly allocated.
    pub fn from_constant(constant: &Constant) -> Self {
        match constant {
            Constant::Null => Value::Null,
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Int(i) => Value::Int(*i),
            Constant::Float(f) => Value::Float(*f),
            Constant::Str(s) => Value::Str(s.clone()),
            Constant::List(items) => Value::list(items.iter().map(Value::from_constant)),
            Constant::Dict(entries) => Value::dict(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_constant(v))),
            ),
        }
    }

    /// Convert a JSON value directly, without going through a compiled program.
    pub fn from_json(json: &Json) -> Self {
        Value::from_constant(&Constant::from_json(json))
    }

    /// Convert back to JSON. Classes and instances have no JSON form.
    pub fn to_json(&self) -> Option<Json> {
        match self {
            Value::Null => Some(Json::Null),
            Value::Bool(b) => Some(Json::Bool(*b)),
            Value::Int(i) => Some(Json::from(*i)),
            Value::Float(f) => serde_json::Number::from_f64(*f).map(Json::Number),
            Value::Str(s) => Some(Json::String(s.clone())),
            Value::List(items) => items
                .borrow()
                .iter()
                .map(Value::to_json)
                .collect::<Option<Vec<_>>>()
                .map(Json::Array),
            Value::Dict(entries) => entries
                .borrow()
                .iter()
                .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                .collect::<Option<serde_json::Map<_, _>>>()
                .map(Json::Object),
            Value::Class(_) | Value::Instance(_) => None,
        }
    }

    /// The kind name used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Dict(_) => "dict".to_string(),
            Value::Class(_) => "class".to_string(),
            Value::Instance(i) => i.borrow().class.name.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Value::List(_) | Value::Dict(_))
    }

    /// Numeric view used for range checks; booleans count as 0 and 1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Rc<RefCell<Instance>>> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Attribute lookup on instances and classes.
    pub fn get_attr(&self, name: &str) -> Result<Value, RuntimeError> {
        match self {
            Value::Instance(instance) => Instance::get_attribute(instance, name),
            Value::Class(class) => class.get_attribute(name),
            other => Err(RuntimeError::no_such_attribute(other.type_name(), name)),
        }
    }

    /// Attribute assignment: constrained on instances, unconstrained on classes.
    pub fn set_attr(&self, name: &str, value: impl Into<Value>) -> Result<(), RuntimeError> {
        match self {
            Value::Instance(instance) => Instance::set_attribute(instance, name, value.into()),
            Value::Class(class) => {
                class.set_class_attribute(name, value.into());
                Ok(())
            }
            other => Err(RuntimeError::no_such_attribute(other.type_name(), name)),
        }
    }

    /// Call a class to create an instance.
    pub fn call(&self, args: Arguments) -> Result<Value, RuntimeError> {
        match self {
            Value::Class(class) => Class::instantiate(class, args),
            other => Err(RuntimeError::NotAClass(other.type_name())),
        }
    }

    /// Unambiguous representation: JSON-like for data, templates for instances.
    pub fn repr(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => quote(s),
            Value::List(items) => {
                let items = items.borrow();
                let parts: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Dict(entries) => {
                let entries = entries.borrow();
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", quote(k), v.repr()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Class(class) => format!("<class '{}.{}'>", class.module_name, class.name),
            Value::Instance(instance) => Instance::repr(instance)
                .unwrap_or_else(|_| format!("<{} instance>", instance.borrow().class.name)),
        }
    }

    /// Readable representation: strings unquoted, instances through `__str__`.
    pub fn str(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Instance(instance) => Instance::str(instance)
                .unwrap_or_else(|_| format!("<{} instance>", instance.borrow().class.name)),
            other => other.repr(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => *a.borrow() == *b.borrow(),
            (Value::Dict(a), Value::Dict(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.str())
    }
}

impl Formattable for Value {
    fn format_str(&self) -> String {
        self.str()
    }

    fn format_repr(&self) -> String {
        self.repr()
    }

    fn as_number(&self) -> Option<f64> {
        self.as_f64()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Render a float so that integral values keep a trailing `.0`.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

/// Double-quote a string with JSON escapes.
pub fn quote(s: &str) -> String {
    Json::String(s.to_string()).to_string()
}
