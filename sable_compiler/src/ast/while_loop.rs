use std::fmt;

use sable_core::types::TypeHandle;

use super::{Block, ExprValue};
use crate::{
    compile::{builder::EmitContext, resolve::ResolveContext},
    error::CompileResult,
    position::SourcePosition,
};

/// `while (condition) { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct WhileLoop {
    pub condition: ExprValue,
    pub body: Block,
    pub position: SourcePosition,
}

impl WhileLoop {
    pub fn resolve_types(&mut self, cx: &mut ResolveContext) -> CompileResult<()> {
        let ty = self.condition.resolve_type(cx, self.position)?;
        cx.expect_type(TypeHandle::BOOL, ty, self.position)?;
        self.body.resolve_types(cx)
    }

    pub fn emit_bytecode(&self, cx: &mut EmitContext) -> CompileResult<()> {
        let start = cx.builder.len();

        // The condition is evaluated on every iteration.
        let slot = self.condition.materialize(cx, self.position)?;
        let exit = cx.builder.emit_placeholder_jump_if_false(slot);

        self.body.emit_bytecode(cx)?;

        let back = cx.builder.emit_jump_back(start);
        cx.at(back, self.position)?;
        let patched = cx.builder.patch_jump(exit);
        cx.at(patched, self.position)
    }
}

impl fmt::Display for WhileLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "while ({}) {}", self.condition, self.body)
    }
}
