use std::fmt;

use sable_core::bytecode::Slot;
use smol_str::SmolStr;

use super::ExprValue;
use crate::{
    compile::{builder::EmitContext, resolve::ResolveContext},
    error::CompileResult,
    position::SourcePosition,
};

/// Type as written in the source, looked up during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub name: SmolStr,
    pub position: SourcePosition,
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `const x: T = value;` or `mut x = value;`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: SmolStr,
    pub slot: Slot,
    pub is_mutable: bool,
    pub declared_type: Option<TypeName>,
    pub value: ExprValue,
    pub position: SourcePosition,
}

impl VariableDeclaration {
    pub fn resolve_types(&mut self, cx: &mut ResolveContext) -> CompileResult<()> {
        let ty = self.value.resolve_type(cx, self.position)?;

        if let Some(declared) = &self.declared_type {
            let expected = cx.lookup_type(&declared.name, declared.position)?;
            cx.expect_type(expected, ty, self.position)?;
        }
        cx.variables.set_type(self.slot, ty);

        Ok(())
    }

    pub fn emit_bytecode(&self, cx: &mut EmitContext) -> CompileResult<()> {
        self.value.emit_into(cx, self.slot, self.position)
    }
}

impl fmt::Display for VariableDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = if self.is_mutable { "mut" } else { "const" };
        write!(f, "{} ${}", keyword, self.slot)?;
        if let Some(ty) = &self.declared_type {
            write!(f, ": {}", ty)?;
        }
        write!(f, " = {}", self.value)
    }
}

/// `x = value;`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableAssignment {
    pub slot: Slot,
    pub value: ExprValue,
    pub position: SourcePosition,
}

impl VariableAssignment {
    pub fn resolve_types(&mut self, cx: &mut ResolveContext) -> CompileResult<()> {
        cx.expect_mutable(self.slot, self.position)?;

        let expected = cx.slot_type(self.slot, self.position)?;
        let ty = self.value.resolve_type(cx, self.position)?;
        cx.expect_type(expected, ty, self.position)
    }

    pub fn emit_bytecode(&self, cx: &mut EmitContext) -> CompileResult<()> {
        self.value.emit_into(cx, self.slot, self.position)
    }
}

impl fmt::Display for VariableAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${} = {}", self.slot, self.value)
    }
}
