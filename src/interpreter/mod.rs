//! Runtime for generated modules.
//!
//! The linker turns a [`CompiledModule`](crate::emit::CompiledModule) into a
//! live [`Module`]: classes with constructors, constrained properties and
//! templates, instantiated on demand.

pub mod checker;
pub mod class;
pub mod linker;
pub mod module;
pub mod value;

pub use class::{Arguments, AttributeInfo, Class, Instance};
pub use linker::link;
pub use module::{ClassInfo, Module, ModuleAttributeInfo, ModuleState};
pub use value::Value;
