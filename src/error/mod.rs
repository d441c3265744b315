//! Error types for all generation and runtime phases.

use std::path::PathBuf;

use thiserror::Error;

/// Shape violations of the declarative format, detected while building the model.
#[derive(Debug, Error)]
pub enum StructuralError {
    #[error("Top level of json file must be a dictionary")]
    RootNotObject,

    #[error("__classes__ must be a dictionary of class definitions")]
    ClassesNotObject,

    #[error("Expecting dictionary for class '{0}'")]
    ClassNotObject(String),

    #[error("__class_attributes__ must be a dictionary for class '{0}'")]
    ClassAttributesNotObject(String),

    #[error("{key} must be a string in {context}")]
    NotAString { key: String, context: String },

    #[error("Class '{class}' names unknown parent class '{parent}'")]
    UnknownParent { class: String, parent: String },

    #[error("Inheritance cycle detected at class '{0}'")]
    InheritanceCycle(String),

    #[error("'{name}' is not a valid identifier in {context}")]
    InvalidIdentifier { name: String, context: String },

    #[error("'{name}' is reserved and cannot be used as an attribute of class '{class}'")]
    ReservedName { class: String, name: String },

    #[error("'{name}' is declared as both a class attribute and an instance attribute of class '{class}'")]
    DuplicateAttribute { class: String, name: String },

    #[error("Invalid constraint on '{class}.{attribute}': {message}")]
    InvalidConstraint {
        class: String,
        attribute: String,
        message: String,
    },

    #[error("Invalid {method} template for class '{class}': {message}")]
    InvalidTemplate {
        class: String,
        method: String,
        message: String,
    },
}

impl StructuralError {
    pub fn not_a_string(key: impl Into<String>, context: impl Into<String>) -> Self {
        Self::NotAString {
            key: key.into(),
            context: context.into(),
        }
    }

    pub fn invalid_identifier(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            name: name.into(),
            context: context.into(),
        }
    }

    pub fn invalid_constraint(
        class: impl Into<String>,
        attribute: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidConstraint {
            class: class.into(),
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}

/// The document could not be read or is not valid JSON.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid json file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures while linking a compiled module into live classes.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Class '{class}' extends '{base}' which is not defined before it")]
    UnknownBase { class: String, base: String },

    #[error("Name '{0}' is defined more than once in the module")]
    DuplicateName(String),
}

/// Constraint violations raised by generated setters and constructors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{class}.{attribute} is read only")]
    ReadOnly { class: String, attribute: String },

    #[error("Range Error : '{0}' cannot be None")]
    NoneNotAllowed(String),

    #[error("Type Error : Attribute '{attribute}' must be of type {expected} : {found} given")]
    Type {
        attribute: String,
        expected: String,
        found: String,
    },

    #[error("Range Error : '{attribute}' must be between {min} and {max}")]
    Between {
        attribute: String,
        min: String,
        max: String,
    },

    #[error("Range Error : '{attribute}' must be >= {min}")]
    AtLeast { attribute: String, min: String },

    #[error("Range Error : '{attribute}' must be <= {max}")]
    AtMost { attribute: String, max: String },

    #[error("Type Error : '{attribute}' cannot be compared with a numeric bound : {found} given")]
    NotComparable { attribute: String, found: String },
}

impl ValidationError {
    /// The attribute the violation was raised for.
    pub fn attribute(&self) -> &str {
        match self {
            Self::ReadOnly { attribute, .. } => attribute,
            Self::NoneNotAllowed(attribute) => attribute,
            Self::Type { attribute, .. } => attribute,
            Self::Between { attribute, .. } => attribute,
            Self::AtLeast { attribute, .. } => attribute,
            Self::AtMost { attribute, .. } => attribute,
            Self::NotComparable { attribute, .. } => attribute,
        }
    }

    /// True for type violations, false for range/read-only violations.
    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::Type { .. } | Self::NotComparable { .. })
    }
}

/// Errors raised while calling into a live module.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("'{type_name}' has no attribute '{attribute}'")]
    NoSuchAttribute {
        type_name: String,
        attribute: String,
    },

    #[error("{class}() got an unexpected keyword argument '{argument}'")]
    UnexpectedArgument { class: String, argument: String },

    #[error("{class}() got multiple values for argument '{argument}'")]
    DuplicateArgument { class: String, argument: String },

    #[error("{class}() takes {expected} positional arguments but {given} were given")]
    TooManyArguments {
        class: String,
        expected: usize,
        given: usize,
    },

    #[error("'{0}' is not a class")]
    NotAClass(String),
}

impl RuntimeError {
    pub fn no_such_attribute(type_name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::NoSuchAttribute {
            type_name: type_name.into(),
            attribute: attribute.into(),
        }
    }

    /// The constraint violation behind this error, if any.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Configuration store errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown Configuration Item : {0}")]
    Unknown(String),

    #[error("Obsolete Configuration Item : {key} ({reason})")]
    Obsolete { key: String, reason: String },

    #[error("Invalid value for {key} : {message}")]
    InvalidValue { key: String, message: String },
}

/// The proximate cause of a failed activation.
#[derive(Debug, Error)]
pub enum ActivationCause {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Import failures surfaced by the loader.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unable to import '{0}' : Cannot find module")]
    NotFound(String),

    #[error("Error importing {name} : {cause}")]
    Activation {
        name: String,
        #[source]
        cause: ActivationCause,
    },
}

impl ImportError {
    pub fn activation(name: impl Into<String>, cause: impl Into<ActivationCause>) -> Self {
        Self::Activation {
            name: name.into(),
            cause: cause.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// The wrapped cause of an activation failure.
    pub fn cause(&self) -> Option<&ActivationCause> {
        match self {
            Self::Activation { cause, .. } => Some(cause),
            Self::NotFound(_) => None,
        }
    }
}

/// A unified error type for all phases.
#[derive(Debug, Error)]
pub enum ImportJsonError {
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
