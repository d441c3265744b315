//! Live classes and instances linked from a compiled module.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::emit::{CompiledClass, CompiledProperty, Constant, Constructor, ParamDefault};
use crate::error::{RuntimeError, ValidationError};
use crate::interpreter::checker;
use crate::interpreter::value::Value;
use crate::model::FormatTemplate;

/// Name and declared default of one class or instance attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name: String,
    pub default: Value,
}

/// Constructor arguments.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    pub positional: Vec<Value>,
    pub keyword: IndexMap<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Add a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

/// A generated class.
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub module_name: String,
    pub doc: Option<String>,
    /// `None` for classes extending the generic base.
    pub superclass: Option<Rc<Class>>,
    class_attributes: RefCell<IndexMap<String, Value>>,
    class_attribute_defaults: Vec<(String, Constant)>,
    constructor: Option<Constructor>,
    properties: IndexMap<String, CompiledProperty>,
    repr: FormatTemplate,
    inherits_repr: bool,
    str: Option<FormatTemplate>,
}

impl Class {
    pub fn new(compiled: CompiledClass, module_name: &str, superclass: Option<Rc<Class>>) -> Self {
        let class_attributes = compiled
            .class_attributes
            .iter()
            .map(|(name, value)| (name.clone(), Value::from_constant(value)))
            .collect();
        Self {
            name: compiled.name,
            module_name: module_name.to_string(),
            doc: compiled.doc,
            superclass,
            class_attributes: RefCell::new(class_attributes),
            class_attribute_defaults: compiled.class_attributes,
            constructor: compiled.constructor,
            properties: compiled
                .properties
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
            repr: compiled.repr,
            inherits_repr: compiled.inherits_repr,
            str: compiled.str,
        }
    }

    /// Create an instance: base initializers run first, then this class's own
    /// parameters are assigned through their checkers.
    pub fn instantiate(class: &Rc<Class>, args: Arguments) -> Result<Value, RuntimeError> {
        let mut instance = Instance {
            class: Rc::clone(class),
            fields: IndexMap::new(),
        };
        class.initialize(class, &mut instance, args)?;
        Ok(Value::Instance(Rc::new(RefCell::new(instance))))
    }

    fn initialize(&self, leaf: &Class, instance: &mut Instance, args: Arguments) -> Result<(), RuntimeError> {
        let constructor = match &self.constructor {
            Some(constructor) => constructor,
            None => {
                return match &self.superclass {
                    Some(base) => base.initialize(leaf, instance, args),
                    None => reject_leftovers(leaf, args),
                }
            }
        };

        let Arguments {
            mut positional,
            keyword,
        } = args;
        let own = constructor.params.len();
        let rest = if positional.len() > own {
            positional.split_off(own)
        } else {
            Vec::new()
        };
        let mut bound: Vec<Option<Value>> = positional.into_iter().map(Some).collect();
        bound.resize(own, None);

        let mut forwarded = IndexMap::new();
        for (name, value) in keyword {
            match constructor.params.iter().position(|p| p.name == name) {
                Some(index) if bound[index].is_some() => {
                    return Err(RuntimeError::DuplicateArgument {
                        class: leaf.name.clone(),
                        argument: name,
                    })
                }
                Some(index) => bound[index] = Some(value),
                None => {
                    forwarded.insert(name, value);
                }
            }
        }

        let forwarded = Arguments {
            positional: rest,
            keyword: forwarded,
        };
        match &self.superclass {
            Some(base) => base.initialize(leaf, instance, forwarded)?,
            None => reject_leftovers(leaf, forwarded)?,
        }

        for (param, value) in constructor.params.iter().zip(bound) {
            let value = match (&param.default, value) {
                (ParamDefault::Fresh(default), None | Some(Value::Null)) => {
                    Value::from_constant(default)
                }
                (ParamDefault::Value(default), None) => Value::from_constant(default),
                (_, Some(value)) => value,
            };
            self.validate(&param.name, &value)?;
            instance.fields.insert(param.name.clone(), value);
        }
        Ok(())
    }

    /// Run the checker of the nearest class in the chain declaring `attribute`.
    pub fn validate(&self, attribute: &str, value: &Value) -> Result<(), ValidationError> {
        match self.properties.get(attribute) {
            Some(property) => checker::run(self, property, value),
            None => match &self.superclass {
                Some(base) => base.validate(attribute, value),
                None => Ok(()),
            },
        }
    }

    /// Whether any class in the chain declares a property named `name`.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
            || self.superclass.as_ref().is_some_and(|b| b.has_property(name))
    }

    /// Read-only as declared by the nearest class declaring the property.
    /// A redeclaration without `read_only` makes it assignable again.
    pub fn is_read_only(&self, name: &str) -> bool {
        match self.properties.get(name) {
            Some(property) => property.read_only,
            None => self.superclass.as_ref().is_some_and(|b| b.is_read_only(name)),
        }
    }

    /// Whether this class is `name` or derives from it.
    pub fn is_subclass_of(&self, name: &str) -> bool {
        self.name == name
            || self
                .superclass
                .as_ref()
                .is_some_and(|b| b.is_subclass_of(name))
    }

    /// Class names from this class up to the root.
    pub fn lineage(&self) -> Vec<String> {
        let mut names = vec![self.name.clone()];
        let mut current = self.superclass.as_ref();
        while let Some(class) = current {
            names.push(class.name.clone());
            current = class.superclass.as_ref();
        }
        names
    }

    /// Number of constructor parameters along the whole chain.
    pub fn param_count(&self) -> usize {
        self.constructor.as_ref().map_or(0, |c| c.params.len())
            + self.superclass.as_ref().map_or(0, |b| b.param_count())
    }

    /// Look up a class attribute, searching ancestors.
    pub fn get_class_attribute(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.class_attributes.borrow().get(name) {
            return Some(value.clone());
        }
        self.superclass
            .as_ref()
            .and_then(|b| b.get_class_attribute(name))
    }

    /// Assign a class attribute on this class. Subclasses that do not
    /// declare the name see the new value.
    pub fn set_class_attribute(&self, name: impl Into<String>, value: Value) {
        self.class_attributes.borrow_mut().insert(name.into(), value);
    }

    pub fn get_attribute(&self, name: &str) -> Result<Value, RuntimeError> {
        self.get_class_attribute(name)
            .ok_or_else(|| RuntimeError::no_such_attribute(&self.name, name))
    }

    /// Class attributes declared by this class, with their declared defaults.
    pub fn get_class_attributes(&self) -> Vec<AttributeInfo> {
        self.class_attribute_defaults
            .iter()
            .map(|(name, value)| AttributeInfo {
                name: name.clone(),
                default: Value::from_constant(value),
            })
            .collect()
    }

    /// Instance attributes declared by this class, with their declared defaults.
    pub fn get_instance_attributes(&self) -> Vec<AttributeInfo> {
        self.constructor
            .iter()
            .flat_map(|c| c.params.iter())
            .map(|param| AttributeInfo {
                name: param.name.clone(),
                default: match &param.default {
                    ParamDefault::Value(value) | ParamDefault::Fresh(value) => {
                        Value::from_constant(value)
                    }
                },
            })
            .collect()
    }

    /// This class's repr, or the nearest ancestor's when it inherits one.
    pub fn repr_template(&self) -> &FormatTemplate {
        match &self.superclass {
            Some(base) if self.inherits_repr => base.repr_template(),
            _ => &self.repr,
        }
    }

    /// The nearest explicit `__str__` in the chain, else the repr.
    pub fn str_template(&self) -> &FormatTemplate {
        let mut current = Some(self);
        while let Some(class) = current {
            if let Some(template) = &class.str {
                return template;
            }
            current = class.superclass.as_deref();
        }
        self.repr_template()
    }
}

fn reject_leftovers(leaf: &Class, args: Arguments) -> Result<(), RuntimeError> {
    if let Some(name) = args.keyword.keys().next() {
        return Err(RuntimeError::UnexpectedArgument {
            class: leaf.name.clone(),
            argument: name.clone(),
        });
    }
    if !args.positional.is_empty() {
        let expected = leaf.param_count();
        return Err(RuntimeError::TooManyArguments {
            class: leaf.name.clone(),
            expected,
            given: expected + args.positional.len(),
        });
    }
    Ok(())
}

/// A class instance.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    fields: IndexMap<String, Value>,
}

impl Instance {
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    /// Instance attribute, then class attribute.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.fields.get(name) {
            Some(value) => Some(value.clone()),
            None => self.class.get_class_attribute(name),
        }
    }

    pub fn get_attribute(this: &Rc<RefCell<Instance>>, name: &str) -> Result<Value, RuntimeError> {
        let instance = this.borrow();
        instance
            .get(name)
            .ok_or_else(|| RuntimeError::no_such_attribute(&instance.class.name, name))
    }

    /// Assign through the property setter: read-only gate, then the checker.
    /// A rejected value leaves the instance unchanged.
    pub fn set_attribute(
        this: &Rc<RefCell<Instance>>,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let class = Rc::clone(&this.borrow().class);
        if !class.has_property(name) {
            return Err(RuntimeError::no_such_attribute(&class.name, name));
        }
        if class.is_read_only(name) {
            return Err(ValidationError::ReadOnly {
                class: class.name.clone(),
                attribute: name.to_string(),
            }
            .into());
        }
        class.validate(name, &value)?;
        this.borrow_mut().fields.insert(name.to_string(), value);
        Ok(())
    }

    pub fn repr(this: &Rc<RefCell<Instance>>) -> Result<String, RuntimeError> {
        let instance = this.borrow();
        instance.render(instance.class.repr_template())
    }

    pub fn str(this: &Rc<RefCell<Instance>>) -> Result<String, RuntimeError> {
        let instance = this.borrow();
        instance.render(instance.class.str_template())
    }

    fn render(&self, template: &FormatTemplate) -> Result<String, RuntimeError> {
        template.render(|name| match name {
            "class_name" => Ok(Value::Str(self.class.name.clone())),
            "module_name" => Ok(Value::Str(self.class.module_name.clone())),
            _ => self
                .get(name)
                .ok_or_else(|| RuntimeError::no_such_attribute(&self.class.name, name)),
        })
    }
}
