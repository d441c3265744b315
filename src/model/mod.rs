//! Source model for a generated module.
//!
//! A parsed JSON document is walked once into a [`ModuleModel`] holding
//! [`ClassModel`]s and [`AttributeModel`]s. The model is the input of the
//! code emitter and is discarded once emission completes.
//!
//! - `attribute`: module, class and instance attributes
//! - `class`: class bodies and their reserved keys
//! - `constraint`: the closed constraint vocabulary
//! - `template`: `__repr__` / `__str__` format templates

pub mod attribute;
pub mod class;
pub mod constraint;
pub mod template;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value as Json};

pub use attribute::{AttributeModel, AttributeOwner};
pub use class::{ClassModel, GENERIC_BASE, RESERVED_CLASS_KEYS, TEMPLATE_NAMES};
pub use constraint::{Bound, Constraint, ConstraintSet, RangeBound, TypeKind};
pub use template::FormatTemplate;

use crate::error::StructuralError;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex");
}

/// Whether `name` can be used as a class or attribute name.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Reserved top-level key holding the module docstring.
pub const DOC_KEY: &str = "__doc__";
/// Reserved top-level key selecting the explicit dialect.
pub const CLASSES_KEY: &str = "__classes__";

/// How classes are declared in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Every object-valued top-level key is a class.
    Implicit,
    /// Only entries of `__classes__` are classes.
    Explicit,
}

impl Dialect {
    pub fn detect(document: &Map<String, Json>) -> Self {
        if document.contains_key(CLASSES_KEY) {
            Dialect::Explicit
        } else {
            Dialect::Implicit
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModuleModel {
    pub name: String,
    pub file: PathBuf,
    pub doc: String,
    pub dialect: Dialect,
    pub attributes: Vec<AttributeModel>,
    /// Ordered parents-first, otherwise in declaration order.
    pub classes: Vec<ClassModel>,
}

impl ModuleModel {
    pub fn build(name: &str, file: &Path, document: &Json) -> Result<Self, StructuralError> {
        let root = document.as_object().ok_or(StructuralError::RootNotObject)?;
        let dialect = Dialect::detect(root);

        let doc = match root.get(DOC_KEY) {
            Some(Json::String(doc)) => doc.clone(),
            Some(_) => return Err(StructuralError::not_a_string(DOC_KEY, "the module")),
            None => generated_doc(name, file),
        };

        let mut class_entries: Vec<(&String, &Json)> = Vec::new();
        let mut attributes = Vec::new();

        for (key, value) in root {
            if key == DOC_KEY {
                continue;
            }
            match dialect {
                Dialect::Explicit if key == CLASSES_KEY => {
                    let classes = value.as_object().ok_or(StructuralError::ClassesNotObject)?;
                    for (class_name, body) in classes {
                        if !body.is_object() {
                            return Err(StructuralError::ClassNotObject(class_name.clone()));
                        }
                        class_entries.push((class_name, body));
                    }
                }
                Dialect::Implicit if value.is_object() => class_entries.push((key, value)),
                _ => {
                    if !is_identifier(key) {
                        return Err(StructuralError::invalid_identifier(key, "module attributes"));
                    }
                    attributes.push(AttributeModel::module(key, value.clone()));
                }
            }
        }

        let class_names: Vec<String> = class_entries.iter().map(|(n, _)| (*n).clone()).collect();
        let classes = class_entries
            .into_iter()
            .map(|(class_name, body)| ClassModel::build(class_name, body, &class_names))
            .collect::<Result<Vec<_>, _>>()?;

        let model = Self {
            name: name.to_string(),
            file: file.to_path_buf(),
            doc,
            dialect,
            attributes,
            classes: order_parents_first(classes)?,
        };
        model.check_templates()?;
        Ok(model)
    }

    pub fn class(&self, name: &str) -> Option<&ClassModel> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn class_names(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.name.as_str()).collect()
    }

    /// The class itself followed by its ancestors, leaf to root.
    pub fn lineage<'a>(&'a self, class: &'a ClassModel) -> Vec<&'a ClassModel> {
        let mut chain = vec![class];
        let mut current = class;
        while let Some(parent) = current.base_name.as_deref().and_then(|b| self.class(b)) {
            if chain.iter().any(|c| c.name == parent.name) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Every placeholder must name something an instance of the class can render.
    fn check_templates(&self) -> Result<(), StructuralError> {
        for class in &self.classes {
            let visible: HashSet<&str> = self
                .lineage(class)
                .into_iter()
                .flat_map(|c| c.declared_names())
                .chain(TEMPLATE_NAMES)
                .collect();

            let templates = std::iter::once(("__repr__", &class.repr_format))
                .chain(class.str_format.as_ref().map(|t| ("__str__", t)));
            for (method, template) in templates {
                if let Some(unknown) = template.field_names().find(|f| !visible.contains(f)) {
                    return Err(StructuralError::InvalidTemplate {
                        class: class.name.clone(),
                        method: method.to_string(),
                        message: format!("unknown field '{}'", unknown),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Stable topological order: each class after its parent.
fn order_parents_first(classes: Vec<ClassModel>) -> Result<Vec<ClassModel>, StructuralError> {
    let names: HashSet<&str> = classes.iter().map(|c| c.name.as_str()).collect();
    for class in &classes {
        if let Some(parent) = &class.base_name {
            if parent == &class.name {
                return Err(StructuralError::InheritanceCycle(class.name.clone()));
            }
            if !names.contains(parent.as_str()) {
                return Err(StructuralError::UnknownParent {
                    class: class.name.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }

    let mut pending = classes;
    let mut ordered: Vec<ClassModel> = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let before = pending.len();
        let mut waiting = Vec::new();
        for class in pending {
            let ready = match &class.base_name {
                None => true,
                Some(parent) => ordered.iter().any(|c| &c.name == parent),
            };
            if ready {
                ordered.push(class);
            } else {
                waiting.push(class);
            }
        }
        if waiting.len() == before {
            return Err(StructuralError::InheritanceCycle(waiting[0].name.clone()));
        }
        pending = waiting;
    }
    Ok(ordered)
}

fn generated_doc(name: &str, file: &Path) -> String {
    let now = chrono::Local::now();
    format!(
        "Module {} - Created by JsonLoader v{}\n   Original json data : {}\n   Generated {} {}",
        name,
        env!("CARGO_PKG_VERSION"),
        file.display(),
        now.format("%a %d %b %Y %H:%M:%S"),
        now.format("(UTC %:z)"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(document: Json) -> Result<ModuleModel, StructuralError> {
        ModuleModel::build("sample", Path::new("/tmp/sample.json"), &document)
    }

    #[test]
    fn test_implicit_dialect_makes_objects_classes() {
        let model = build(json!({"version": 1, "classa": {"x": 1}, "tags": ["a"]})).unwrap();
        assert_eq!(model.dialect, Dialect::Implicit);
        assert_eq!(model.class_names(), vec!["classa"]);
        let attrs: Vec<&str> = model.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(attrs, vec!["version", "tags"]);
    }

    #[test]
    fn test_explicit_dialect_keeps_objects_as_attributes() {
        let model = build(json!({
            "settings": {"key1": 0, "key2": []},
            "__classes__": {"classa": {"x": 1}}
        }))
        .unwrap();
        assert_eq!(model.dialect, Dialect::Explicit);
        assert_eq!(model.class_names(), vec!["classa"]);
        assert_eq!(model.attributes.len(), 1);
        assert_eq!(model.attributes[0].default_value, json!({"key1": 0, "key2": []}));
    }

    #[test]
    fn test_explicit_shape_errors() {
        assert!(matches!(
            build(json!({"__classes__": [1]})),
            Err(StructuralError::ClassesNotObject)
        ));
        assert!(matches!(
            build(json!({"__classes__": {"classa": 3}})),
            Err(StructuralError::ClassNotObject(name)) if name == "classa"
        ));
    }

    #[test]
    fn test_root_must_be_object() {
        assert!(matches!(build(json!([])), Err(StructuralError::RootNotObject)));
    }

    #[test]
    fn test_doc_override_and_generated_doc() {
        let model = build(json!({"__doc__": "Override documentation string"})).unwrap();
        assert_eq!(model.doc, "Override documentation string");

        let model = build(json!({"x": 0})).unwrap();
        assert!(model.doc.starts_with("Module sample - Created by JsonLoader"));
        assert!(model.doc.contains("Original json data : /tmp/sample.json"));
    }

    #[test]
    fn test_parents_ordered_first() {
        let model = build(json!({
            "classc": {"__parent__": "classb"},
            "classb": {"__parent__": "classa"},
            "classa": {},
            "other": {}
        }))
        .unwrap();
        assert_eq!(model.class_names(), vec!["classa", "other", "classb", "classc"]);
        let classc = model.class("classc").unwrap();
        let lineage: Vec<&str> = model.lineage(classc).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(lineage, vec!["classc", "classb", "classa"]);
    }

    #[test]
    fn test_unknown_parent_and_cycles() {
        assert!(matches!(
            build(json!({"classa": {"__parent__": "missing"}})),
            Err(StructuralError::UnknownParent { .. })
        ));
        assert!(matches!(
            build(json!({"classa": {"__parent__": "classb"}, "classb": {"__parent__": "classa"}})),
            Err(StructuralError::InheritanceCycle(_))
        ));
    }

    #[test]
    fn test_template_fields_may_use_inherited_attributes() {
        assert!(build(json!({
            "classa": {"x": 1},
            "classb": {"__parent__": "classa", "y": 2, "__str__": "{module_name}.{class_name} {x} {y}"}
        }))
        .is_ok());

        assert!(matches!(
            build(json!({"classa": {"x": 1, "__repr__": "{z}"}})),
            Err(StructuralError::InvalidTemplate { .. })
        ));
    }

    #[test]
    fn test_identifier() {
        assert!(is_identifier("_attr1"));
        assert!(!is_identifier("1attr"));
        assert!(!is_identifier("attr one"));
    }
}
