//! State threaded through type resolution of one function.
use sable_core::{
    bytecode::Slot,
    types::{TypeHandle, TypeRegistry},
};
use smol_str::SmolStr;

use crate::{
    compile::symbol::StackVariables,
    error::{CompileError, CompileErrorKind, CompileResult},
    position::{SourceLocation, SourcePosition},
};

pub struct ResolveContext<'c> {
    pub types: &'c TypeRegistry,
    pub variables: &'c mut StackVariables,
    pub source_name: &'c str,
    pub function: &'c str,
    /// `None` for functions that don't return a value.
    pub return_type: Option<TypeHandle>,
}

impl<'c> ResolveContext<'c> {
    #[cold]
    pub fn error(&self, kind: CompileErrorKind, position: SourcePosition) -> CompileError {
        CompileError::new(kind, SourceLocation::new(self.source_name, position))
    }

    /// Name of a type for error messages.
    pub fn type_name(&self, ty: Option<TypeHandle>) -> SmolStr {
        match ty {
            Some(ty) => SmolStr::new(self.types.name(ty)),
            None => SmolStr::new("void"),
        }
    }

    /// Type of a variable, which must be resolved by now.
    pub fn slot_type(&self, slot: Slot, position: SourcePosition) -> CompileResult<TypeHandle> {
        self.variables.type_of(slot).ok_or_else(|| {
            let name = self
                .variables
                .get(slot)
                .map(|variable| variable.name.clone())
                .unwrap_or_default();
            self.error(CompileErrorKind::UnresolvedType { name }, position)
        })
    }

    /// Look up a type named in the source.
    pub fn lookup_type(&self, name: &str, position: SourcePosition) -> CompileResult<TypeHandle> {
        self.types.lookup(name).ok_or_else(|| {
            self.error(
                CompileErrorKind::UnknownType {
                    name: SmolStr::new(name),
                },
                position,
            )
        })
    }

    pub fn expect_type(&self, expected: TypeHandle, found: TypeHandle, position: SourcePosition) -> CompileResult<()> {
        if expected == found {
            Ok(())
        } else {
            Err(self.error(
                CompileErrorKind::TypeMismatch {
                    expected: self.type_name(Some(expected)),
                    found: self.type_name(Some(found)),
                },
                position,
            ))
        }
    }

    /// Fail unless the slot may be written to.
    pub fn expect_mutable(&self, slot: Slot, position: SourcePosition) -> CompileResult<()> {
        match self.variables.get(slot) {
            Some(variable) if !variable.is_mutable => Err(self.error(
                CompileErrorKind::ImmutableAssignment {
                    name: variable.name.clone(),
                },
                position,
            )),
            _ => Ok(()),
        }
    }
}
