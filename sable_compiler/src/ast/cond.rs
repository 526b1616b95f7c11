use std::fmt;

use sable_core::types::TypeHandle;

use super::{Block, ExprValue};
use crate::{
    compile::{builder::EmitContext, resolve::ResolveContext},
    error::CompileResult,
    position::SourcePosition,
};

/// `if (c0) {b0} else if (c1) {b1} ... else {bN}`
///
/// Holds one block per condition, plus one trailing block when there
/// is a final `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub conditions: Vec<ExprValue>,
    pub blocks: Vec<Block>,
    pub position: SourcePosition,
}

impl Conditional {
    #[inline]
    pub fn has_else(&self) -> bool {
        self.blocks.len() > self.conditions.len()
    }

    pub fn resolve_types(&mut self, cx: &mut ResolveContext) -> CompileResult<()> {
        for condition in self.conditions.iter_mut() {
            let ty = condition.resolve_type(cx, self.position)?;
            cx.expect_type(TypeHandle::BOOL, ty, self.position)?;
        }

        for block in self.blocks.iter_mut() {
            block.resolve_types(cx)?;
        }

        Ok(())
    }

    pub fn emit_bytecode(&self, cx: &mut EmitContext) -> CompileResult<()> {
        let mut end_jumps = Vec::with_capacity(self.conditions.len());

        for (condition, block) in self.conditions.iter().zip(&self.blocks) {
            let slot = condition.materialize(cx, self.position)?;
            let skip = cx.builder.emit_placeholder_jump_if_false(slot);

            block.emit_bytecode(cx)?;
            end_jumps.push(cx.builder.emit_placeholder_jump());

            let patched = cx.builder.patch_jump(skip);
            cx.at(patched, self.position)?;
        }

        if let Some(otherwise) = self.blocks.get(self.conditions.len()) {
            otherwise.emit_bytecode(cx)?;
        }

        for jump in end_jumps {
            let patched = cx.builder.patch_jump(jump);
            cx.at(patched, self.position)?;
        }

        Ok(())
    }

    pub fn ends_with_return(&self) -> bool {
        self.has_else() && self.blocks.iter().all(Block::ends_with_return)
    }
}

impl fmt::Display for Conditional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (condition, block)) in self.conditions.iter().zip(&self.blocks).enumerate() {
            if i > 0 {
                write!(f, " else ")?;
            }
            write!(f, "if ({}) {}", condition, block)?;
        }
        if let Some(otherwise) = self.blocks.get(self.conditions.len()) {
            write!(f, " else {}", otherwise)?;
        }
        Ok(())
    }
}
