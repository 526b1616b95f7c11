use std::fmt;

use itertools::Itertools;
use sable_core::bytecode::Slot;
use smol_str::SmolStr;

use super::{Block, TypeName};
use crate::{
    compile::{deps::FunctionDependencies, symbol::StackVariables},
    position::SourcePosition,
};

/// Items of one source file.
#[derive(Debug, Default)]
pub struct FileNode<'a> {
    pub structs: Vec<StructNode>,
    pub functions: Vec<FunctionNode<'a>>,
}

impl<'a> fmt::Display for FileNode<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.structs {
            writeln!(f, "{}", item)?;
        }
        for item in &self.functions {
            writeln!(f, "{}", item)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: SmolStr,
    pub ty: TypeName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructNode {
    pub name: SmolStr,
    pub fields: Vec<StructField>,
    pub position: SourcePosition,
}

impl fmt::Display for StructNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "struct {} {{ {} }}",
            self.name,
            self.fields
                .iter()
                .map(|field| format!("{}: {}", field.name, field.ty))
                .join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: SmolStr,
    pub slot: Slot,
    pub is_mutable: bool,
    pub ty: TypeName,
}

#[derive(Debug)]
pub struct FunctionNode<'a> {
    pub name: &'a str,
    pub position: SourcePosition,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeName>,
    pub body: Block,
    pub variables: StackVariables,
    pub dependencies: FunctionDependencies<'a>,
    /// The body had a syntax error, only the dependencies are usable.
    pub parse_failed: bool,
}

impl<'a> fmt::Display for FunctionNode<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parameters = self
            .parameters
            .iter()
            .map(|param| {
                let keyword = if param.is_mutable { "mut " } else { "" };
                format!("{}${}: {}", keyword, param.slot, param.ty)
            })
            .join(", ");

        write!(f, "fn {}({})", self.name, parameters)?;
        if let Some(ty) = &self.return_type {
            write!(f, " -> {}", ty)?;
        }
        write!(f, " {}", self.body)
    }
}
