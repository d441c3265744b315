//! Text listing of a compiled module, for inspection.

use std::fmt::{self, Write};

use crate::emit::program::{CheckOp, CompiledClass, CompiledModule, Item, ParamDefault};
use crate::interpreter::value::quote;

/// Disassemble a compiled module into human-readable output.
pub fn disassemble(module: &CompiledModule) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail.
    let _ = write_module(module, &mut output);
    output
}

/// Print disassembly to stdout.
pub fn print_disassembly(module: &CompiledModule) {
    print!("{}", disassemble(module));
}

fn write_module(module: &CompiledModule, output: &mut String) -> fmt::Result {
    writeln!(output, "== module {} ==", module.name)?;
    writeln!(output, "file {}", module.file.display())?;
    writeln!(output, "doc  {}", quote(&module.doc))?;

    for (offset, item) in module.items.iter().enumerate() {
        match item {
            Item::Attribute { name, value } => {
                writeln!(output, "{:04} Attribute {} = {}", offset, name, value)?;
            }
            Item::Class(class) => {
                writeln!(
                    output,
                    "{:04} Class {} ({})",
                    offset,
                    class.name,
                    class.base.as_deref().unwrap_or("object")
                )?;
                write_class(class, output)?;
            }
        }
    }
    Ok(())
}

fn write_class(class: &CompiledClass, output: &mut String) -> fmt::Result {
    if let Some(doc) = &class.doc {
        writeln!(output, "   | Doc {}", quote(doc))?;
    }
    for (name, value) in &class.class_attributes {
        writeln!(output, "   | ClassAttribute {} = {}", name, value)?;
    }

    match &class.constructor {
        Some(constructor) => {
            writeln!(output, "   | Init {}", constructor.params.len())?;
            for param in &constructor.params {
                match &param.default {
                    ParamDefault::Value(value) => {
                        writeln!(output, "   |   Param {} = {}", param.name, value)?
                    }
                    ParamDefault::Fresh(value) => {
                        writeln!(output, "   |   Param {} = null -> fresh {}", param.name, value)?
                    }
                }
            }
        }
        None => writeln!(output, "   | Init inherited")?,
    }

    for property in &class.properties {
        writeln!(
            output,
            "   | Property {}{}",
            property.name,
            if property.read_only { " read_only" } else { "" }
        )?;
        for op in &property.checks {
            writeln!(output, "   |   {}", op_str(op))?;
        }
    }

    if class.inherits_repr {
        writeln!(output, "   | Repr inherited")?;
    } else {
        writeln!(output, "   | Repr {}", quote(class.repr.source()))?;
    }
    if let Some(template) = &class.str {
        writeln!(output, "   | Str {}", quote(template.source()))?;
    }
    Ok(())
}

fn op_str(op: &CheckOp) -> String {
    match op {
        CheckOp::DelegateToBase => "DelegateToBase".to_string(),
        CheckOp::RejectNone => "RejectNone".to_string(),
        CheckOp::AcceptNone => "AcceptNone".to_string(),
        CheckOp::RequireKind(kind) => format!("RequireKind {}", kind),
        CheckOp::SkipCollections => "SkipCollections".to_string(),
        CheckOp::Between(min, max) => format!("Between {} {}", min, max),
        CheckOp::AtLeast(min) => format!("AtLeast {}", min),
        CheckOp::AtMost(max) => format!("AtMost {}", max),
    }
}
