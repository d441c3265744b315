//! Constraint vocabulary for instance attributes.
//!
//! A `__constraints__` entry is resolved once, at model-build time, into a
//! [`ConstraintSet`]: an ordered list of [`Constraint`] variants carrying typed
//! parameters. Only the shape of the entry is checked here; values are checked
//! by the generated setters (see `interpreter::checker`).

use std::fmt;

use serde_json::{Map, Number, Value as Json};

use crate::error::StructuralError;

/// The kinds a `type` constraint may name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Bool,
    Str,
    List,
    Int,
    Float,
    Dict,
    /// A class declared in the same module.
    Class(String),
}

impl TypeKind {
    /// Resolve a type name against the builtin kinds and the module's class names.
    pub fn resolve(name: &str, class_names: &[String]) -> Option<Self> {
        if class_names.iter().any(|c| c == name) {
            return Some(TypeKind::Class(name.to_string()));
        }
        match name {
            "bool" => Some(TypeKind::Bool),
            "str" => Some(TypeKind::Str),
            "list" => Some(TypeKind::List),
            "int" => Some(TypeKind::Int),
            "float" => Some(TypeKind::Float),
            "dict" => Some(TypeKind::Dict),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TypeKind::Bool => "bool",
            TypeKind::Str => "str",
            TypeKind::List => "list",
            TypeKind::Int => "int",
            TypeKind::Float => "float",
            TypeKind::Dict => "dict",
            TypeKind::Class(name) => name,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A numeric range bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Int(i64),
    Float(f64),
}

impl Bound {
    fn from_number(n: &Number) -> Self {
        match n.as_i64() {
            Some(i) => Bound::Int(i),
            None => Bound::Float(n.as_f64().unwrap_or(f64::NAN)),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Bound::Int(i) => *i as f64,
            Bound::Float(f) => *f,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Int(i) => write!(f, "{}", i),
            Bound::Float(x) => write!(f, "{}", crate::interpreter::value::format_float(*x)),
        }
    }
}

/// Inclusive range constraints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeBound {
    Between(Bound, Bound),
    AtLeast(Bound),
    AtMost(Bound),
}

/// One resolved constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Assignment through the property setter is rejected.
    ReadOnly,
    /// Null is rejected.
    NotNone,
    /// Null is accepted and ends checking.
    AllowNone,
    Kind(TypeKind),
    Range(RangeBound),
}

/// The ordered constraints of one attribute.
///
/// Order always follows evaluation order: read-only, null handling, type, range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a `__constraints__` entry.
    ///
    /// A non-object entry means "no constraints". Keys outside the closed
    /// vocabulary are ignored.
    pub fn from_json(
        class: &str,
        attribute: &str,
        entry: &Json,
        class_names: &[String],
    ) -> Result<Self, StructuralError> {
        let map = match entry {
            Json::Object(map) if !map.is_empty() => map,
            _ => return Ok(Self::new()),
        };

        let mut constraints = Vec::new();

        if flag(class, attribute, map, "read_only")? {
            constraints.push(Constraint::ReadOnly);
        }

        if flag(class, attribute, map, "not_none")? {
            constraints.push(Constraint::NotNone);
        } else {
            constraints.push(Constraint::AllowNone);
        }

        if let Some(kind) = map.get("type") {
            let name = kind.as_str().ok_or_else(|| {
                StructuralError::invalid_constraint(class, attribute, "type must be a string")
            })?;
            let kind = TypeKind::resolve(name, class_names).ok_or_else(|| {
                StructuralError::invalid_constraint(
                    class,
                    attribute,
                    format!("unknown type '{}'", name),
                )
            })?;
            constraints.push(Constraint::Kind(kind));
        }

        let min = bound(class, attribute, map, "min")?;
        let max = bound(class, attribute, map, "max")?;
        match (min, max) {
            (Some(min), Some(max)) => {
                constraints.push(Constraint::Range(RangeBound::Between(min, max)))
            }
            (Some(min), None) => constraints.push(Constraint::Range(RangeBound::AtLeast(min))),
            (None, Some(max)) => constraints.push(Constraint::Range(RangeBound::AtMost(max))),
            (None, None) => {}
        }

        Ok(Self { constraints })
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn is_read_only(&self) -> bool {
        self.constraints.contains(&Constraint::ReadOnly)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }
}

fn flag(
    class: &str,
    attribute: &str,
    map: &Map<String, Json>,
    key: &str,
) -> Result<bool, StructuralError> {
    match map.get(key) {
        None => Ok(false),
        Some(Json::Bool(b)) => Ok(*b),
        Some(_) => Err(StructuralError::invalid_constraint(
            class,
            attribute,
            format!("{} must be true or false", key),
        )),
    }
}

fn bound(
    class: &str,
    attribute: &str,
    map: &Map<String, Json>,
    key: &str,
) -> Result<Option<Bound>, StructuralError> {
    match map.get(key) {
        None => Ok(None),
        Some(Json::Number(n)) => Ok(Some(Bound::from_number(n))),
        Some(_) => Err(StructuralError::invalid_constraint(
            class,
            attribute,
            format!("{} must be a number", key),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(entry: Json) -> Result<ConstraintSet, StructuralError> {
        ConstraintSet::from_json("classa", "a1", &entry, &["classb".to_string()])
    }

    #[test]
    fn test_malformed_entry_means_no_constraints() {
        assert!(build(json!(3)).unwrap().is_empty());
        assert!(build(json!([1, 2])).unwrap().is_empty());
        assert!(build(json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_evaluation_order() {
        let set = build(json!({"max": 5, "type": "int", "read_only": true, "min": 0})).unwrap();
        let order: Vec<&Constraint> = set.iter().collect();
        assert_eq!(
            order,
            vec![
                &Constraint::ReadOnly,
                &Constraint::AllowNone,
                &Constraint::Kind(TypeKind::Int),
                &Constraint::Range(RangeBound::Between(Bound::Int(0), Bound::Int(5))),
            ]
        );
        assert!(set.is_read_only());
    }

    #[test]
    fn test_not_none_replaces_allow_none() {
        let set = build(json!({"not_none": true})).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![&Constraint::NotNone]);
    }

    #[test]
    fn test_class_type_resolves() {
        let set = build(json!({"type": "classb"})).unwrap();
        assert!(set
            .iter()
            .any(|c| *c == Constraint::Kind(TypeKind::Class("classb".into()))));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let set = build(json!({"colour": "red", "max": 1.5})).unwrap();
        assert!(set
            .iter()
            .any(|c| *c == Constraint::Range(RangeBound::AtMost(Bound::Float(1.5)))));
    }

    #[test]
    fn test_shape_errors() {
        assert!(build(json!({"type": "complex"})).is_err());
        assert!(build(json!({"type": 3})).is_err());
        assert!(build(json!({"min": "0"})).is_err());
        assert!(build(json!({"read_only": "yes"})).is_err());
    }

    #[test]
    fn test_bound_display() {
        assert_eq!(Bound::Int(-1).to_string(), "-1");
        assert_eq!(Bound::Float(2.0).to_string(), "2.0");
        assert_eq!(Bound::Float(0.25).to_string(), "0.25");
    }
}
