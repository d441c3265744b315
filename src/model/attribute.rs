//! Attribute model: one module-, class- or instance-level attribute.

use serde_json::Value as Json;

use super::constraint::ConstraintSet;

/// Where an attribute is declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOwner {
    Module,
    Class(String),
}

#[derive(Debug, Clone)]
pub struct AttributeModel {
    pub name: String,
    pub default_value: Json,
    pub owner: AttributeOwner,
    pub is_class_level: bool,
    pub constraints: ConstraintSet,
}

impl AttributeModel {
    pub fn module(name: impl Into<String>, value: Json) -> Self {
        Self {
            name: name.into(),
            default_value: value,
            owner: AttributeOwner::Module,
            is_class_level: false,
            constraints: ConstraintSet::new(),
        }
    }

    pub fn class_level(name: impl Into<String>, value: Json, class: &str) -> Self {
        Self {
            name: name.into(),
            default_value: value,
            owner: AttributeOwner::Class(class.to_string()),
            is_class_level: true,
            constraints: ConstraintSet::new(),
        }
    }

    pub fn instance(
        name: impl Into<String>,
        value: Json,
        class: &str,
        constraints: ConstraintSet,
    ) -> Self {
        Self {
            name: name.into(),
            default_value: value,
            owner: AttributeOwner::Class(class.to_string()),
            is_class_level: false,
            constraints,
        }
    }

    /// Mapping and sequence defaults must be copied for every instance.
    pub fn has_mutable_default(&self) -> bool {
        matches!(self.default_value, Json::Array(_) | Json::Object(_))
    }
}
