//! Class model: one synthesized class built by scanning a JSON object.

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use super::attribute::AttributeModel;
use super::constraint::ConstraintSet;
use super::is_identifier;
use super::template::FormatTemplate;
use crate::error::StructuralError;

/// Keys of a class body that never become instance attributes.
pub const RESERVED_CLASS_KEYS: [&str; 6] = [
    "__parent__",
    "__doc__",
    "__class_attributes__",
    "__constraints__",
    "__repr__",
    "__str__",
];

/// Placeholder names every template may use.
pub const TEMPLATE_NAMES: [&str; 2] = ["class_name", "module_name"];

/// Name of the generic base class.
pub const GENERIC_BASE: &str = "object";

#[derive(Debug, Clone)]
pub struct ClassModel {
    pub name: String,
    /// `None` means the generic base.
    pub base_name: Option<String>,
    pub doc: Option<String>,
    pub class_attributes: Vec<AttributeModel>,
    pub instance_attributes: Vec<AttributeModel>,
    pub constraints: IndexMap<String, ConstraintSet>,
    pub repr_format: FormatTemplate,
    /// The class declares no instance attributes and no `__repr__`, so
    /// instances render with the nearest ancestor's repr.
    pub inherits_repr: bool,
    /// `None` means `str()` renders like `repr()`.
    pub str_format: Option<FormatTemplate>,
}

impl ClassModel {
    /// Build a class from its JSON body.
    ///
    /// `class_names` lists every class of the module, so that `type`
    /// constraints may name any of them.
    pub fn build(name: &str, body: &Json, class_names: &[String]) -> Result<Self, StructuralError> {
        let body = body
            .as_object()
            .ok_or_else(|| StructuralError::ClassNotObject(name.to_string()))?;

        if !is_identifier(name) || name == GENERIC_BASE {
            return Err(StructuralError::invalid_identifier(name, "class names"));
        }

        let context = format!("class '{}'", name);
        let base_name = match optional_string(body, "__parent__", &context)? {
            Some(parent) if parent == GENERIC_BASE => None,
            other => other,
        };
        let doc = optional_string(body, "__doc__", &context)?;

        let class_attributes = match body.get("__class_attributes__") {
            None => Vec::new(),
            Some(Json::Object(attrs)) => attrs
                .iter()
                .map(|(attr, value)| {
                    check_attribute_name(name, attr)?;
                    Ok(AttributeModel::class_level(attr, value.clone(), name))
                })
                .collect::<Result<Vec<_>, StructuralError>>()?,
            Some(_) => return Err(StructuralError::ClassAttributesNotObject(name.to_string())),
        };

        let declared = match body.get("__constraints__") {
            Some(Json::Object(map)) => Some(map),
            _ => None,
        };

        let mut constraints = IndexMap::new();
        let mut instance_attributes = Vec::new();
        for (attr, value) in body {
            if RESERVED_CLASS_KEYS.contains(&attr.as_str()) {
                continue;
            }
            check_attribute_name(name, attr)?;
            if class_attributes.iter().any(|a| &a.name == attr) {
                return Err(StructuralError::DuplicateAttribute {
                    class: name.to_string(),
                    name: attr.clone(),
                });
            }

            let set = match declared.and_then(|map| map.get(attr)) {
                Some(entry) => ConstraintSet::from_json(name, attr, entry, class_names)?,
                None => ConstraintSet::new(),
            };
            if !set.is_empty() {
                constraints.insert(attr.clone(), set.clone());
            }
            instance_attributes.push(AttributeModel::instance(attr, value.clone(), name, set));
        }

        let explicit_repr = optional_string(body, "__repr__", &context)?;
        let inherits_repr = explicit_repr.is_none() && instance_attributes.is_empty();
        let repr_format = match explicit_repr {
            Some(source) => parse_template(name, "__repr__", &source)?,
            None => FormatTemplate::default_repr(
                instance_attributes.iter().map(|a| a.name.as_str()),
            ),
        };
        let str_format = optional_string(body, "__str__", &context)?
            .map(|source| parse_template(name, "__str__", &source))
            .transpose()?;

        Ok(Self {
            name: name.to_string(),
            base_name,
            doc,
            class_attributes,
            instance_attributes,
            constraints,
            repr_format,
            inherits_repr,
            str_format,
        })
    }

    /// A class with no attributes of either kind.
    pub fn is_empty(&self) -> bool {
        self.class_attributes.is_empty() && self.instance_attributes.is_empty()
    }

    pub fn constraints_for(&self, attribute: &str) -> Option<&ConstraintSet> {
        self.constraints.get(attribute)
    }

    pub fn base_display(&self) -> &str {
        self.base_name.as_deref().unwrap_or(GENERIC_BASE)
    }

    /// Names this class itself declares, of both kinds.
    pub fn declared_names(&self) -> impl Iterator<Item = &str> {
        self.class_attributes
            .iter()
            .chain(self.instance_attributes.iter())
            .map(|a| a.name.as_str())
    }
}

fn optional_string(
    body: &Map<String, Json>,
    key: &str,
    context: &str,
) -> Result<Option<String>, StructuralError> {
    match body.get(key) {
        None => Ok(None),
        Some(Json::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(StructuralError::not_a_string(key, context)),
    }
}

fn check_attribute_name(class: &str, attr: &str) -> Result<(), StructuralError> {
    if !is_identifier(attr) {
        return Err(StructuralError::invalid_identifier(
            attr,
            format!("class '{}'", class),
        ));
    }
    if TEMPLATE_NAMES.contains(&attr) {
        return Err(StructuralError::ReservedName {
            class: class.to_string(),
            name: attr.to_string(),
        });
    }
    Ok(())
}

fn parse_template(class: &str, method: &str, source: &str) -> Result<FormatTemplate, StructuralError> {
    FormatTemplate::parse(source).map_err(|message| StructuralError::InvalidTemplate {
        class: class.to_string(),
        method: method.to_string(),
        message,
    })
}
