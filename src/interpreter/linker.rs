//! Links a compiled module into live classes and values.

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value as Json;
use tracing::debug;

use crate::emit::{CompiledModule, Item};
use crate::error::LinkError;
use crate::interpreter::class::Class;
use crate::interpreter::module::ModuleState;
use crate::interpreter::value::Value;

/// Link `compiled` into module state. Bases must be linked before the
/// classes that extend them.
pub fn link(compiled: CompiledModule, json: Json) -> Result<ModuleState, LinkError> {
    let mut attributes: IndexMap<String, Value> = IndexMap::new();
    let mut classes: IndexMap<String, Rc<Class>> = IndexMap::new();

    for item in &compiled.items {
        match item {
            Item::Attribute { name, value } => {
                if attributes.contains_key(name) || classes.contains_key(name) {
                    return Err(LinkError::DuplicateName(name.clone()));
                }
                attributes.insert(name.clone(), Value::from_constant(value));
            }
            Item::Class(class) => {
                if attributes.contains_key(&class.name) || classes.contains_key(&class.name) {
                    return Err(LinkError::DuplicateName(class.name.clone()));
                }
                let superclass = match &class.base {
                    None => None,
                    Some(base) => Some(classes.get(base).cloned().ok_or_else(|| {
                        LinkError::UnknownBase {
                            class: class.name.clone(),
                            base: base.clone(),
                        }
                    })?),
                };
                debug!(module = %compiled.name, class = %class.name, "linking class");
                let live = Class::new(class.clone(), &compiled.name, superclass);
                classes.insert(class.name.clone(), Rc::new(live));
            }
        }
    }

    Ok(ModuleState {
        file: compiled.file.clone(),
        doc: compiled.doc.clone(),
        json,
        compiled,
        attributes,
        classes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{CodeEmitter, CompiledClass, Constant};
    use crate::model::{FormatTemplate, ModuleModel};
    use serde_json::json;
    use std::path::{Path, PathBuf};

    fn compile(document: &Json) -> CompiledModule {
        let model = ModuleModel::build("linked", Path::new("linked.json"), document).unwrap();
        CodeEmitter::new().emit(&model)
    }

    fn bare_class(name: &str, base: Option<&str>) -> CompiledClass {
        CompiledClass {
            name: name.to_string(),
            base: base.map(str::to_string),
            doc: None,
            class_attributes: Vec::new(),
            constructor: None,
            properties: Vec::new(),
            repr: FormatTemplate::default_repr([]),
            inherits_repr: true,
            str: None,
        }
    }

    #[test]
    fn test_link_wires_superclasses() {
        let document = json!({"classa": {"x": 1}, "classb": {"__parent__": "classa"}, "n": 1});
        let state = link(compile(&document), document.clone()).unwrap();
        let classb = &state.classes["classb"];
        assert_eq!(classb.superclass.as_ref().map(|c| c.name.as_str()), Some("classa"));
        assert_eq!(state.attributes["n"], Value::Int(1));
        assert_eq!(state.json, document);
    }

    #[test]
    fn test_link_rejects_duplicate_names() {
        let document = json!({"classa": 1, "__classes__": {"classa": {}}});
        let err = link(compile(&document), document).unwrap_err();
        assert!(matches!(err, LinkError::DuplicateName(name) if name == "classa"));
    }

    #[test]
    fn test_link_rejects_unlinked_base() {
        let compiled = CompiledModule {
            name: "linked".to_string(),
            file: PathBuf::from("linked.json"),
            doc: String::new(),
            items: vec![
                Item::Class(bare_class("child", Some("parent"))),
                Item::Attribute {
                    name: "parent".to_string(),
                    value: Constant::Null,
                },
            ],
        };
        let err = link(compiled, Json::Null).unwrap_err();
        assert!(matches!(err, LinkError::UnknownBase { .. }));
    }
}
