use std::fmt;

use sable_core::bytecode::Bytecode;

use super::ExprValue;
use crate::{
    compile::{builder::EmitContext, resolve::ResolveContext},
    error::{CompileErrorKind, CompileResult},
    position::SourcePosition,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub value: Option<ExprValue>,
    /// Locks held by the enclosing sync blocks, released before returning.
    pub sync_locks: u16,
    pub position: SourcePosition,
}

impl Return {
    pub fn resolve_types(&mut self, cx: &mut ResolveContext) -> CompileResult<()> {
        let found = match &mut self.value {
            Some(value) => Some(value.resolve_type(cx, self.position)?),
            None => None,
        };

        if found == cx.return_type {
            Ok(())
        } else {
            Err(cx.error(
                CompileErrorKind::TypeMismatch {
                    expected: cx.type_name(cx.return_type),
                    found: cx.type_name(found),
                },
                self.position,
            ))
        }
    }

    pub fn emit_bytecode(&self, cx: &mut EmitContext) -> CompileResult<()> {
        // The value is read before the locks protecting it are released.
        let src = match &self.value {
            Some(value) => Some(value.materialize(cx, self.position)?),
            None => None,
        };

        if self.sync_locks > 0 {
            cx.builder.push(Bytecode::sync_release(self.sync_locks));
        }

        match src {
            Some(src) => cx.builder.push(Bytecode::ret_value(src)),
            None => cx.builder.push(Bytecode::ret()),
        };

        Ok(())
    }
}

impl fmt::Display for Return {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "return {}", value),
            None => write!(f, "return"),
        }
    }
}
