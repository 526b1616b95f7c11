use std::fmt;

use sable_core::{
    bytecode::{Bytecode, Slot},
    types::TypeHandle,
};
use smol_str::SmolStr;

use super::ExprValue;
use crate::{
    compile::{builder::EmitContext, resolve::ResolveContext},
    error::{CompileErrorKind, CompileResult},
    position::SourcePosition,
};

/// One step of a member chain: `destination = object.member`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberProjection {
    pub member: SmolStr,
    pub destination: Slot,
    /// Field index, known after type resolution.
    pub field: Option<u16>,
    pub position: SourcePosition,
}

/// `source.m1.m2...` with one temporary per member.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccess {
    pub source: Slot,
    pub members: Vec<MemberProjection>,
    pub position: SourcePosition,
}

impl MemberAccess {
    /// Slot holding the value of the whole chain.
    pub fn result_slot(&self) -> Slot {
        self.members
            .last()
            .map(|projection| projection.destination)
            .unwrap_or(self.source)
    }

    pub fn resolve_types(&mut self, cx: &mut ResolveContext) -> CompileResult<()> {
        let mut ty = cx.slot_type(self.source, self.position)?;

        for projection in self.members.iter_mut() {
            let (field, field_ty) = resolve_field(cx, ty, &projection.member, projection.position)?;
            projection.field = Some(field);
            cx.variables.set_type(projection.destination, field_ty);
            ty = field_ty;
        }

        Ok(())
    }

    pub fn emit_bytecode(&self, cx: &mut EmitContext) -> CompileResult<()> {
        let mut object = self.source;

        for projection in &self.members {
            let field = unresolved_field(cx, projection.field, projection.position)?;
            cx.builder
                .push(Bytecode::member_load(projection.destination, object, field));
            object = projection.destination;
        }

        Ok(())
    }
}

impl fmt::Display for MemberAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.source)?;
        for projection in &self.members {
            write!(f, ".{}", projection.member)?;
        }
        Ok(())
    }
}

/// Find a field of a struct type.
fn resolve_field(
    cx: &ResolveContext,
    ty: TypeHandle,
    member: &str,
    position: SourcePosition,
) -> CompileResult<(u16, TypeHandle)> {
    if !cx.types.is_struct(ty) {
        return Err(cx.error(
            CompileErrorKind::NotAStruct {
                ty: cx.type_name(Some(ty)),
                member: SmolStr::new(member),
            },
            position,
        ));
    }

    cx.types.field(ty, member).ok_or_else(|| {
        cx.error(
            CompileErrorKind::UnknownMember {
                ty: cx.type_name(Some(ty)),
                member: SmolStr::new(member),
            },
            position,
        )
    })
}

/// Emission only runs after a successful resolve, which sets every field.
fn unresolved_field(cx: &EmitContext, field: Option<u16>, position: SourcePosition) -> CompileResult<u16> {
    field.ok_or_else(|| {
        cx.error(
            CompileErrorKind::UnresolvedType {
                name: SmolStr::new("member"),
            },
            position,
        )
    })
}

/// `root.m1...mN = value`.
///
/// The object holding `mN` is projected into `target`, structs have
/// reference semantics so the store reaches the root variable.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberAssign {
    pub target: MemberAccess,
    pub member: SmolStr,
    pub field: Option<u16>,
    pub value: ExprValue,
    pub position: SourcePosition,
}

impl MemberAssign {
    pub fn resolve_types(&mut self, cx: &mut ResolveContext) -> CompileResult<()> {
        cx.expect_mutable(self.target.source, self.position)?;
        self.target.resolve_types(cx)?;

        let object = cx.slot_type(self.target.result_slot(), self.position)?;
        let (field, field_ty) = resolve_field(cx, object, &self.member, self.position)?;
        self.field = Some(field);

        let value = self.value.resolve_type(cx, self.position)?;
        cx.expect_type(field_ty, value, self.position)
    }

    pub fn emit_bytecode(&self, cx: &mut EmitContext) -> CompileResult<()> {
        self.target.emit_bytecode(cx)?;
        let src = self.value.materialize(cx, self.position)?;
        let field = unresolved_field(cx, self.field, self.position)?;
        cx.builder
            .push(Bytecode::member_store(self.target.result_slot(), field, src));
        Ok(())
    }
}

impl fmt::Display for MemberAssign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} = {}", self.target, self.member, self.value)
    }
}
