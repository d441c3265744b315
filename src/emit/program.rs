//! The generated program: a structural form of a module that the linker
//! turns into live classes.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value as Json;

use crate::model::{Bound, FormatTemplate, TypeKind};

/// A literal value in the generated program.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Constant>),
    /// Key order is declaration order.
    Dict(Vec<(String, Constant)>),
}

impl Constant {
    /// The value-literalizer: render a JSON value as a constant, recursively.
    pub fn from_json(value: &Json) -> Self {
        match value {
            Json::Null => Constant::Null,
            Json::Bool(b) => Constant::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Constant::Int(i),
                None => Constant::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Constant::Str(s.clone()),
            Json::Array(items) => Constant::List(items.iter().map(Constant::from_json).collect()),
            Json::Object(map) => Constant::Dict(
                map.iter()
                    .map(|(k, v)| (k.clone(), Constant::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn is_mutable(&self) -> bool {
        matches!(self, Constant::List(_) | Constant::Dict(_))
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Int(i) => write!(f, "{}", i),
            Constant::Float(x) => write!(f, "{}", crate::interpreter::value::format_float(*x)),
            Constant::Str(s) => write!(f, "{}", crate::interpreter::value::quote(s)),
            Constant::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Constant::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", crate::interpreter::value::quote(key), value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// One step of a generated constraint checker.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOp {
    /// Run the nearest ancestor's checker for the same attribute first.
    DelegateToBase,
    /// Reject null.
    RejectNone,
    /// Accept null and stop.
    AcceptNone,
    /// Require the value to be of the given kind.
    RequireKind(TypeKind),
    /// Accept lists and dicts unchanged and stop.
    SkipCollections,
    /// `min <= value <= max`
    Between(Bound, Bound),
    /// `value >= min`
    AtLeast(Bound),
    /// `value <= max`
    AtMost(Bound),
}

/// How a constructor parameter obtains its value when not passed.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDefault {
    /// Immutable default bound directly.
    Value(Constant),
    /// Mutable default: a null sentinel, materialized fresh on every call.
    Fresh(Constant),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: ParamDefault,
}

/// Generated initializer: call the base initializer with unbound arguments,
/// then assign every parameter through its checker.
#[derive(Debug, Clone, PartialEq)]
pub struct Constructor {
    pub params: Vec<Param>,
}

/// Getter plus constrained setter for one instance attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProperty {
    pub name: String,
    pub read_only: bool,
    pub checks: Vec<CheckOp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledClass {
    pub name: String,
    /// `None` for the generic base.
    pub base: Option<String>,
    pub doc: Option<String>,
    pub class_attributes: Vec<(String, Constant)>,
    /// `None` when the class declares no instance attributes.
    pub constructor: Option<Constructor>,
    pub properties: Vec<CompiledProperty>,
    pub repr: FormatTemplate,
    /// Use the nearest ancestor's repr instead of `repr`.
    pub inherits_repr: bool,
    pub str: Option<FormatTemplate>,
}

impl CompiledClass {
    pub fn property(&self, name: &str) -> Option<&CompiledProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A top-level item of the generated module.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Attribute { name: String, value: Constant },
    Class(CompiledClass),
}

/// A complete generated module.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModule {
    pub name: String,
    pub file: PathBuf,
    pub doc: String,
    pub items: Vec<Item>,
}

impl CompiledModule {
    pub fn classes(&self) -> impl Iterator<Item = &CompiledClass> {
        self.items.iter().filter_map(|item| match item {
            Item::Class(class) => Some(class),
            Item::Attribute { .. } => None,
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Constant)> {
        self.items.iter().filter_map(|item| match item {
            Item::Attribute { name, value } => Some((name.as_str(), value)),
            Item::Class(_) => None,
        })
    }

    pub fn class(&self, name: &str) -> Option<&CompiledClass> {
        self.classes().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literalizer_preserves_key_order() {
        let constant = Constant::from_json(&json!({"b": [1, 2.5, "x"], "a": {"n": null}}));
        assert_eq!(constant.to_string(), r#"{"b": [1, 2.5, "x"], "a": {"n": null}}"#);
        assert!(constant.is_mutable());
    }

    #[test]
    fn test_scalars() {
        assert_eq!(Constant::from_json(&json!(3)), Constant::Int(3));
        assert_eq!(Constant::from_json(&json!(1.0)).to_string(), "1.0");
        assert_eq!(Constant::from_json(&json!(true)).to_string(), "true");
        assert!(!Constant::from_json(&json!("x")).is_mutable());
    }
}
