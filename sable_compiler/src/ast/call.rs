use std::fmt;

use itertools::Itertools;
use smol_str::SmolStr;

use super::ExprValue;
use crate::{
    compile::{builder::EmitContext, resolve::ResolveContext},
    error::{CompileErrorKind, CompileResult},
    position::SourcePosition,
};

/// `name(arguments)`
///
/// Calls are parsed so the callee is recorded as a dependency, but the
/// calling convention isn't settled yet so they don't compile.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: SmolStr,
    pub arguments: Vec<ExprValue>,
    pub position: SourcePosition,
}

impl FunctionCall {
    pub fn resolve_types(&mut self, cx: &mut ResolveContext) -> CompileResult<()> {
        Err(cx.error(
            CompileErrorKind::UnsupportedConstruct {
                construct: "Function call",
            },
            self.position,
        ))
    }

    pub fn emit_bytecode(&self, cx: &mut EmitContext) -> CompileResult<()> {
        Err(cx.error(
            CompileErrorKind::UnsupportedConstruct {
                construct: "Function call",
            },
            self.position,
        ))
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.arguments.iter().join(", "))
    }
}
