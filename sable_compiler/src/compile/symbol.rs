use sable_core::{bytecode::Slot, types::TypeHandle};
use smol_str::SmolStr;

/// Variable occupying one slot of a function frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StackVariable {
    pub name: SmolStr,
    /// Synthesized by the compiler to hold an intermediate result.
    pub is_temporary: bool,
    pub is_mutable: bool,
    /// `None` until type resolution reaches the variable.
    pub ty: Option<TypeHandle>,
}

/// Append-only table of the variables of a function.
///
/// The slot returned by a push is permanent. Names are not unique,
/// shadowing is handled by the scope stack.
#[derive(Debug, Default, Clone)]
pub struct StackVariables {
    variables: Vec<StackVariable>,
}

impl StackVariables {
    /// Upper bound on slots, limited by the operand width.
    pub const MAX_VARIABLES: usize = Slot::MAX as usize + 1;

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named variable.
    ///
    /// Returns `None` when the frame is full.
    pub fn push(&mut self, name: &str, is_mutable: bool, ty: Option<TypeHandle>) -> Option<Slot> {
        self.push_variable(StackVariable {
            name: SmolStr::new(name),
            is_temporary: false,
            is_mutable,
            ty,
        })
    }

    /// Add an anonymous immutable variable for an intermediate result.
    ///
    /// Its generated name starts with `$`, which can't appear in a
    /// source identifier.
    pub fn push_temporary(&mut self) -> Option<Slot> {
        let name = format!("$t{}", self.variables.len());
        self.push_variable(StackVariable {
            name: SmolStr::new(name),
            is_temporary: true,
            is_mutable: false,
            ty: None,
        })
    }

    fn push_variable(&mut self, variable: StackVariable) -> Option<Slot> {
        if self.variables.len() >= Self::MAX_VARIABLES {
            return None;
        }

        let slot = self.variables.len() as Slot;
        self.variables.push(variable);
        Some(slot)
    }

    #[inline]
    pub fn get(&self, slot: Slot) -> Option<&StackVariable> {
        self.variables.get(slot as usize)
    }

    #[inline]
    pub fn type_of(&self, slot: Slot) -> Option<TypeHandle> {
        self.get(slot).and_then(|variable| variable.ty)
    }

    pub fn set_type(&mut self, slot: Slot, ty: TypeHandle) {
        if let Some(variable) = self.variables.get_mut(slot as usize) {
            variable.ty = Some(ty);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StackVariable> {
        self.variables.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_slots_are_stable() {
        let mut vars = StackVariables::new();
        let a = vars.push("a", true, None).unwrap();
        let t = vars.push_temporary().unwrap();
        let a2 = vars.push("a", false, Some(TypeHandle::INT)).unwrap();

        assert_eq!((a, t, a2), (0, 1, 2));
        assert_eq!(vars.get(t).unwrap().name, "$t1");
        assert!(vars.get(t).unwrap().is_temporary);
        assert_eq!(vars.type_of(a), None);
        assert_eq!(vars.type_of(a2), Some(TypeHandle::INT));

        vars.set_type(a, TypeHandle::BOOL);
        assert_eq!(vars.type_of(a), Some(TypeHandle::BOOL));
    }

    #[test]
    fn test_frame_limit() {
        let mut vars = StackVariables::new();
        for _ in 0..StackVariables::MAX_VARIABLES {
            assert!(vars.push_temporary().is_some());
        }
        assert_eq!(vars.push_temporary(), None);
        assert_eq!(vars.get(Slot::MAX).map(|v| v.is_temporary), Some(true));
    }
}
