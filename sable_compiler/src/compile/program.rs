//! Output of a successful compile.
use std::fmt;

use sable_core::{
    bytecode::Bytecode,
    disasm::Disassembler,
    types::{TypeHandle, TypeRegistry},
};
use smol_str::SmolStr;

#[derive(Debug)]
pub struct CompiledProgram {
    pub types: TypeRegistry,
    /// Functions in processing order, callees before callers.
    pub functions: Vec<CompiledFunction>,
}

impl CompiledProgram {
    pub fn function(&self, name: &str) -> Option<&CompiledFunction> {
        self.functions.iter().find(|function| function.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub name: SmolStr,
    pub parameters: Vec<TypeHandle>,
    pub return_type: Option<TypeHandle>,
    pub code: Vec<Bytecode>,
    /// String constants referenced by `LOADK`.
    pub constants: Vec<SmolStr>,
    /// Number of frame slots, parameters first.
    pub slot_count: usize,
    /// Dependency layer the function was compiled in.
    pub layer: usize,
}

impl CompiledFunction {
    /// Human readable listing of the function's instructions.
    pub fn disassemble(&self) -> Result<String, fmt::Error> {
        Disassembler::new(&self.code)
            .with_constants(&self.constants)
            .to_text()
    }
}
