//! Executes generated constraint checkers.

use std::cmp::Ordering;

use crate::emit::{CheckOp, CompiledProperty};
use crate::error::ValidationError;
use crate::interpreter::class::Class;
use crate::interpreter::value::Value;
use crate::model::{Bound, TypeKind};

/// Run `property`'s checker, declared on `class`, against `value`.
pub fn run(class: &Class, property: &CompiledProperty, value: &Value) -> Result<(), ValidationError> {
    let attribute = property.name.as_str();
    for op in &property.checks {
        match op {
            CheckOp::DelegateToBase => {
                if let Some(base) = &class.superclass {
                    base.validate(attribute, value)?;
                }
            }
            CheckOp::RejectNone => {
                if value.is_null() {
                    return Err(ValidationError::NoneNotAllowed(attribute.to_string()));
                }
            }
            CheckOp::AcceptNone => {
                if value.is_null() {
                    return Ok(());
                }
            }
            CheckOp::RequireKind(kind) => {
                if !accepts(kind, value) {
                    return Err(ValidationError::Type {
                        attribute: attribute.to_string(),
                        expected: kind.to_string(),
                        found: value.type_name(),
                    });
                }
            }
            CheckOp::SkipCollections => {
                if value.is_collection() {
                    return Ok(());
                }
            }
            CheckOp::Between(min, max) => {
                require_number(attribute, value)?;
                if below(value, min) || above(value, max) {
                    return Err(ValidationError::Between {
                        attribute: attribute.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                }
            }
            CheckOp::AtLeast(min) => {
                require_number(attribute, value)?;
                if below(value, min) {
                    return Err(ValidationError::AtLeast {
                        attribute: attribute.to_string(),
                        min: min.to_string(),
                    });
                }
            }
            CheckOp::AtMost(max) => {
                require_number(attribute, value)?;
                if above(value, max) {
                    return Err(ValidationError::AtMost {
                        attribute: attribute.to_string(),
                        max: max.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Whether `value` satisfies a `type` constraint.
pub fn accepts(kind: &TypeKind, value: &Value) -> bool {
    match (kind, value) {
        (TypeKind::Bool, Value::Bool(_) | Value::Int(_)) => true,
        (TypeKind::Int, Value::Int(_) | Value::Bool(_)) => true,
        (TypeKind::Float, Value::Float(_) | Value::Int(_) | Value::Bool(_)) => true,
        (TypeKind::Str, Value::Str(_)) => true,
        (TypeKind::List, Value::List(_)) => true,
        (TypeKind::Dict, Value::Dict(_)) => true,
        (TypeKind::Class(name), Value::Instance(instance)) => {
            instance.borrow().class.is_subclass_of(name)
        }
        _ => false,
    }
}

/// Integers compare exactly against integer bounds; anything else as `f64`.
fn compare(value: &Value, bound: &Bound) -> Option<Ordering> {
    match (value, bound) {
        (Value::Int(v), Bound::Int(b)) => Some(v.cmp(b)),
        _ => value.as_f64()?.partial_cmp(&bound.as_f64()),
    }
}

fn below(value: &Value, bound: &Bound) -> bool {
    compare(value, bound) == Some(Ordering::Less)
}

fn above(value: &Value, bound: &Bound) -> bool {
    compare(value, bound) == Some(Ordering::Greater)
}

fn require_number(attribute: &str, value: &Value) -> Result<(), ValidationError> {
    match value.as_f64() {
        Some(_) => Ok(()),
        None => Err(ValidationError::NotComparable {
            attribute: attribute.to_string(),
            found: value.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::CodeEmitter;
    use crate::interpreter::class::{Arguments, Instance};
    use crate::model::ModuleModel;
    use serde_json::json;
    use std::rc::Rc;

    fn leaf_class(document: serde_json::Value) -> Rc<Class> {
        let model = ModuleModel::build("checks", std::path::Path::new("checks.json"), &document).unwrap();
        let compiled = CodeEmitter::new().emit(&model);
        let mut linked: Vec<Rc<Class>> = Vec::new();
        for class in compiled.classes() {
            let base = class
                .base
                .as_ref()
                .and_then(|b| linked.iter().find(|c| &c.name == b).cloned());
            linked.push(Rc::new(Class::new(class.clone(), "checks", base)));
        }
        linked.pop().unwrap()
    }

    #[test]
    fn test_range_messages() {
        let class = leaf_class(json!({"classa": {
            "__constraints__": {"a": {"min": 0, "max": 5}, "b": {"min": 1.5}, "c": {"max": 2}},
            "a": 0, "b": 2, "c": 0
        }}));
        assert_eq!(
            class.validate("a", &Value::Int(6)).unwrap_err().to_string(),
            "Range Error : 'a' must be between 0 and 5"
        );
        assert_eq!(
            class.validate("b", &Value::Int(1)).unwrap_err().to_string(),
            "Range Error : 'b' must be >= 1.5"
        );
        assert_eq!(
            class.validate("c", &Value::Float(2.5)).unwrap_err().to_string(),
            "Range Error : 'c' must be <= 2"
        );
        assert!(class.validate("a", &Value::Int(5)).is_ok());
        assert!(class.validate("a", &Value::list([])).is_ok());
        assert!(class.validate("a", &Value::Null).is_ok());
        assert!(matches!(
            class.validate("a", &Value::from("3")),
            Err(ValidationError::NotComparable { .. })
        ));
    }

    #[test]
    fn test_large_integer_bounds_compare_exactly() {
        let class = leaf_class(json!({"classa": {
            "__constraints__": {"a": {"max": 9007199254740992_i64}, "b": {"min": -9007199254740992_i64}},
            "a": 0, "b": 0
        }}));
        assert!(matches!(
            class.validate("a", &Value::Int(9007199254740993)),
            Err(ValidationError::AtMost { .. })
        ));
        assert!(class.validate("a", &Value::Int(9007199254740992)).is_ok());
        assert!(matches!(
            class.validate("b", &Value::Int(-9007199254740993)),
            Err(ValidationError::AtLeast { .. })
        ));
        assert!(class.validate("a", &Value::Float(1.5)).is_ok());
    }

    #[test]
    fn test_not_none() {
        let class = leaf_class(json!({"classa": {
            "__constraints__": {"a": {"not_none": true}},
            "a": 0
        }}));
        assert_eq!(
            class.validate("a", &Value::Null).unwrap_err(),
            ValidationError::NoneNotAllowed("a".to_string())
        );
    }

    #[test]
    fn test_int_kind_accepts_booleans_only_besides_ints() {
        let class = leaf_class(json!({"classa": {
            "__constraints__": {"a": {"type": "int"}},
            "a": 0
        }}));
        for rejected in [Value::from("1"), Value::Float(1.5), Value::list([]), Value::dict(Vec::<(String, Value)>::new())] {
            let err = class.validate("a", &rejected).unwrap_err();
            assert!(err.is_type_error(), "{} should be rejected", rejected.repr());
        }
        assert!(class.validate("a", &Value::Bool(true)).is_ok());
        assert!(class.validate("a", &Value::Int(3)).is_ok());
    }

    #[test]
    fn test_class_kind_accepts_subclass_instances() {
        let leaf = leaf_class(json!({
            "shape": {},
            "square": {"__parent__": "shape", "side": 1},
            "holder": {"__parent__": "square", "__constraints__": {"item": {"type": "shape"}}, "item": null}
        }));
        let square = Rc::clone(leaf.superclass.as_ref().unwrap());
        let value = Class::instantiate(&square, Arguments::new()).unwrap();
        assert!(leaf.validate("item", &value).is_ok());
        let err = leaf.validate("item", &Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type Error : Attribute 'item' must be of type shape : int given"
        );
        let holder = Class::instantiate(&leaf, Arguments::new().kwarg("item", value)).unwrap();
        assert!(Instance::get_attribute(holder.as_instance().unwrap(), "item").is_ok());
    }

    #[test]
    fn test_inherited_checks_run_root_to_leaf() {
        let leaf = leaf_class(json!({
            "classa": {"__constraints__": {"a1": {"min": 0}}, "a1": 0},
            "classb": {"__parent__": "classa", "__constraints__": {"a1": {"max": 5}}, "a1": 0},
            "classc": {"__parent__": "classb", "__constraints__": {"a1": {"type": "int"}}, "a1": 0}
        }));
        assert!(matches!(leaf.validate("a1", &Value::Int(-1)), Err(ValidationError::AtLeast { .. })));
        assert!(matches!(leaf.validate("a1", &Value::Int(6)), Err(ValidationError::AtMost { .. })));
        assert!(matches!(leaf.validate("a1", &Value::Float(2.5)), Err(ValidationError::Type { .. })));
        assert!(leaf.validate("a1", &Value::Int(3)).is_ok());
    }
}
