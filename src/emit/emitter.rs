//! Code emitter: transforms the source model into a [`CompiledModule`].

use tracing::debug;

use crate::emit::program::{
    CheckOp, CompiledClass, CompiledModule, CompiledProperty, Constant, Constructor, Item, Param,
    ParamDefault,
};
use crate::model::{
    AttributeModel, ClassModel, Constraint, ConstraintSet, ModuleModel, RangeBound,
};

/// Renders a model tree into a program. Output is deterministic for a given model.
#[derive(Debug, Default)]
pub struct CodeEmitter {
    classes_emitted: usize,
}

impl CodeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of classes emitted by this emitter so far.
    pub fn classes_emitted(&self) -> usize {
        self.classes_emitted
    }

    pub fn emit(&mut self, model: &ModuleModel) -> CompiledModule {
        let mut items: Vec<Item> = model
            .attributes
            .iter()
            .map(|attr| Item::Attribute {
                name: attr.name.clone(),
                value: Constant::from_json(&attr.default_value),
            })
            .collect();

        for class in &model.classes {
            items.push(Item::Class(self.emit_class(class)));
        }

        CompiledModule {
            name: model.name.clone(),
            file: model.file.clone(),
            doc: model.doc.clone(),
            items,
        }
    }

    fn emit_class(&mut self, class: &ClassModel) -> CompiledClass {
        debug!(
            class = %class.name,
            base = class.base_display(),
            attributes = class.instance_attributes.len(),
            "emitting class"
        );
        self.classes_emitted += 1;

        let class_attributes = class
            .class_attributes
            .iter()
            .map(|attr| (attr.name.clone(), Constant::from_json(&attr.default_value)))
            .collect();

        let constructor = if class.instance_attributes.is_empty() {
            None
        } else {
            Some(Constructor {
                params: class.instance_attributes.iter().map(emit_param).collect(),
            })
        };

        let properties = class
            .instance_attributes
            .iter()
            .map(|attr| CompiledProperty {
                name: attr.name.clone(),
                read_only: attr.constraints.is_read_only(),
                checks: compile_checks(&attr.constraints),
            })
            .collect();

        CompiledClass {
            name: class.name.clone(),
            base: class.base_name.clone(),
            doc: class.doc.clone(),
            class_attributes,
            constructor,
            properties,
            repr: class.repr_format.clone(),
            inherits_repr: class.inherits_repr,
            str: class.str_format.clone(),
        }
    }
}

fn emit_param(attr: &AttributeModel) -> Param {
    let constant = Constant::from_json(&attr.default_value);
    let default = if attr.has_mutable_default() {
        ParamDefault::Fresh(constant)
    } else {
        ParamDefault::Value(constant)
    };
    Param {
        name: attr.name.clone(),
        default,
    }
}

/// Render a constraint set as checker steps.
///
/// Every checker delegates to its base first; read-only is enforced by the
/// setter and does not appear here, so construction stays unaffected.
pub fn compile_checks(constraints: &ConstraintSet) -> Vec<CheckOp> {
    let mut ops = vec![CheckOp::DelegateToBase];
    for constraint in constraints.iter() {
        match constraint {
            Constraint::ReadOnly => {}
            Constraint::NotNone => ops.push(CheckOp::RejectNone),
            Constraint::AllowNone => ops.push(CheckOp::AcceptNone),
            Constraint::Kind(kind) => ops.push(CheckOp::RequireKind(kind.clone())),
            Constraint::Range(range) => {
                ops.push(CheckOp::SkipCollections);
                ops.push(match *range {
                    RangeBound::Between(min, max) => CheckOp::Between(min, max),
                    RangeBound::AtLeast(min) => CheckOp::AtLeast(min),
                    RangeBound::AtMost(max) => CheckOp::AtMost(max),
                });
            }
        }
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bound, TypeKind};
    use serde_json::json;
    use std::path::Path;

    fn emit(document: serde_json::Value) -> CompiledModule {
        let model = ModuleModel::build("sample", Path::new("sample.json"), &document).unwrap();
        CodeEmitter::new().emit(&model)
    }

    #[test]
    fn test_constructor_params_follow_declaration_order() {
        let module = emit(json!({"classa": {"b": 1, "a": [1], "c": {"k": 1}}}));
        let class = module.class("classa").unwrap();
        let params = &class.constructor.as_ref().unwrap().params;
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(params[0].default, ParamDefault::Value(Constant::Int(1)));
        assert!(matches!(params[1].default, ParamDefault::Fresh(Constant::List(_))));
        assert!(matches!(params[2].default, ParamDefault::Fresh(Constant::Dict(_))));
    }

    #[test]
    fn test_class_without_instance_attributes_has_no_constructor() {
        let module = emit(json!({"classa": {"__class_attributes__": {"n": 1}}}));
        let class = module.class("classa").unwrap();
        assert!(class.constructor.is_none());
        assert_eq!(class.class_attributes, vec![("n".to_string(), Constant::Int(1))]);
    }

    #[test]
    fn test_checks_follow_evaluation_order() {
        let module = emit(json!({"classa": {
            "__constraints__": {"a1": {"min": 0, "max": 5, "type": "int", "read_only": true}},
            "a1": 0
        }}));
        let property = module.class("classa").unwrap().property("a1").unwrap();
        assert!(property.read_only);
        assert_eq!(
            property.checks,
            vec![
                CheckOp::DelegateToBase,
                CheckOp::AcceptNone,
                CheckOp::RequireKind(TypeKind::Int),
                CheckOp::SkipCollections,
                CheckOp::Between(Bound::Int(0), Bound::Int(5)),
            ]
        );
    }

    #[test]
    fn test_unconstrained_property_only_delegates() {
        let module = emit(json!({"classa": {"a1": 0}}));
        let property = module.class("classa").unwrap().property("a1").unwrap();
        assert_eq!(property.checks, vec![CheckOp::DelegateToBase]);
        assert!(!property.read_only);
    }

    #[test]
    fn test_attributes_precede_classes() {
        let module = emit(json!({"classa": {}, "version": 2}));
        assert!(matches!(&module.items[0], Item::Attribute { name, .. } if name == "version"));
        assert!(matches!(&module.items[1], Item::Class(c) if c.name == "classa"));
    }
}
