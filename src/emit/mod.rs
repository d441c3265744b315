//! Program generation for JSON modules.
//!
//! The emitter turns a [`ModuleModel`](crate::model::ModuleModel) into a
//! structural program that the interpreter links into live classes.
//!
//! - `program`: the generated program (constants, constructors, checkers)
//! - `emitter`: transforms the model into a program
//! - `disassembler`: text listing of a program

pub mod disassembler;
pub mod emitter;
pub mod program;

pub use disassembler::{disassemble, print_disassembly};
pub use emitter::{compile_checks, CodeEmitter};
pub use program::{
    CheckOp, CompiledClass, CompiledModule, CompiledProperty, Constant, Constructor, Item, Param,
    ParamDefault,
};
