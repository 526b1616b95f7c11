//! Instruction buffer of a function under construction.
use sable_core::{
    bytecode::{Bytecode, Immediate, Slot},
    types::TypeHandle,
};
use smol_str::SmolStr;

use crate::{
    compile::symbol::StackVariables,
    error::{CompileError, CompileErrorKind, CompileResult},
    position::{SourceLocation, SourcePosition},
};

/// Append-only instruction buffer with backpatching of forward jumps.
#[derive(Debug, Default)]
pub struct BytecodeBuilder {
    code: Vec<Bytecode>,
    constants: Vec<SmolStr>,
}

impl BytecodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction, returning its index.
    #[inline]
    pub fn push(&mut self, bytecode: Bytecode) -> usize {
        self.code.push(bytecode);
        self.code.len() - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    #[inline]
    pub fn code(&self) -> &[Bytecode] {
        &self.code
    }

    /// Emit an unconditional jump to be patched later.
    pub fn emit_placeholder_jump(&mut self) -> usize {
        self.push(Bytecode::jump(0))
    }

    /// Emit a conditional jump to be patched later.
    pub fn emit_placeholder_jump_if_false(&mut self, condition: Slot) -> usize {
        self.push(Bytecode::jump_if_false(condition, 0))
    }

    /// Point the jump at `index` to the next instruction to be emitted.
    pub fn patch_jump(&mut self, index: usize) -> Result<(), CompileErrorKind> {
        let distance = self.code.len() - index;
        let offset = i32::try_from(distance).map_err(|_| CompileErrorKind::JumpTooFar { distance })?;

        if let Some(word) = self.code.get_mut(index) {
            *word = word.with_offset(offset);
        }
        Ok(())
    }

    /// Emit a jump back to an earlier instruction.
    pub fn emit_jump_back(&mut self, target: usize) -> Result<usize, CompileErrorKind> {
        let distance = self.code.len() - target;
        let offset = i32::try_from(distance)
            .map(|offset| -offset)
            .map_err(|_| CompileErrorKind::JumpTooFar { distance })?;
        Ok(self.push(Bytecode::jump(offset)))
    }

    /// Load a literal into a slot, choosing the narrow form when it fits.
    pub fn load_immediate(&mut self, dst: Slot, value: Immediate) {
        match value.narrow() {
            Some(imm) => {
                self.push(Bytecode::load_immediate(dst, value.kind(), imm));
            }
            None => {
                self.push(Bytecode::load_immediate_wide(dst, value.kind()));
                self.push(Bytecode::payload(value.bits()));
            }
        }
    }

    /// Intern a string in the constant pool.
    pub fn add_string_constant(&mut self, value: &str) -> Result<u16, CompileErrorKind> {
        if let Some(index) = self.constants.iter().position(|existing| existing.as_str() == value) {
            return Ok(index as u16);
        }

        let index = u16::try_from(self.constants.len()).map_err(|_| CompileErrorKind::TooManyConstants)?;
        self.constants.push(SmolStr::new(value));
        Ok(index)
    }

    pub fn finish(self) -> (Vec<Bytecode>, Vec<SmolStr>) {
        (self.code, self.constants)
    }
}

/// State threaded through bytecode emission of one function.
pub struct EmitContext<'c> {
    pub builder: &'c mut BytecodeBuilder,
    pub variables: &'c mut StackVariables,
    pub source_name: &'c str,
    pub function: &'c str,
}

impl<'c> EmitContext<'c> {
    #[cold]
    pub fn error(&self, kind: CompileErrorKind, position: SourcePosition) -> CompileError {
        CompileError::new(kind, SourceLocation::new(self.source_name, position))
    }

    /// Allocate a typed temporary for a value produced during emission.
    pub fn temporary(&mut self, ty: TypeHandle, position: SourcePosition) -> CompileResult<Slot> {
        let slot = self.variables.push_temporary().ok_or_else(|| {
            self.error(
                CompileErrorKind::TooManyVariables {
                    function: SmolStr::new(self.function),
                },
                position,
            )
        })?;
        self.variables.set_type(slot, ty);
        Ok(slot)
    }

    /// Attach the source position to a builder error.
    pub fn at<T>(&self, result: Result<T, CompileErrorKind>, position: SourcePosition) -> CompileResult<T> {
        result.map_err(|kind| self.error(kind, position))
    }
}
