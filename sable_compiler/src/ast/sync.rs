use std::fmt;

use itertools::Itertools;
use sable_core::bytecode::{Bytecode, Slot};
use smol_str::SmolStr;

use super::Block;
use crate::{
    compile::{builder::EmitContext, resolve::ResolveContext},
    error::CompileResult,
    position::SourcePosition,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SyncVariable {
    pub name: SmolStr,
    pub slot: Slot,
    /// Writers take the lock exclusively, readers share it.
    pub exclusive: bool,
}

impl fmt::Display for SyncVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exclusive {
            write!(f, "mut ${}", self.slot)
        } else {
            write!(f, "${}", self.slot)
        }
    }
}

/// `sync a, mut b { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct SyncBlock {
    pub variables: Vec<SyncVariable>,
    pub body: Block,
    pub position: SourcePosition,
}

impl SyncBlock {
    pub fn resolve_types(&mut self, cx: &mut ResolveContext) -> CompileResult<()> {
        self.body.resolve_types(cx)
    }

    pub fn emit_bytecode(&self, cx: &mut EmitContext) -> CompileResult<()> {
        for variable in &self.variables {
            cx.builder
                .push(Bytecode::sync_acquire(variable.slot, variable.exclusive));
        }

        self.body.emit_bytecode(cx)?;

        cx.builder
            .push(Bytecode::sync_release(self.variables.len() as u16));
        Ok(())
    }
}

impl fmt::Display for SyncBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sync {} {}", self.variables.iter().join(", "), self.body)
    }
}
