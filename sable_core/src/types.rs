//! Type contexts and their registry.
use smol_str::SmolStr;

/// Opaque handle to a type context owned by a [`TypeRegistry`].
///
/// Handles are compared by identity. The primitive types occupy the
/// first slots of every registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeHandle(u32);

impl TypeHandle {
    pub const BOOL: TypeHandle = TypeHandle(0);
    pub const INT: TypeHandle = TypeHandle(1);
    pub const FLOAT: TypeHandle = TypeHandle(2);
    pub const STRING: TypeHandle = TypeHandle(3);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        self == Self::INT || self == Self::FLOAT
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeContext {
    pub name: SmolStr,
    pub kind: TypeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Bool,
    Int,
    Float,
    String,
    Struct { fields: Vec<StructField> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: SmolStr,
    pub ty: TypeHandle,
}

#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: Vec<TypeContext>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let builtin = |name: &str, kind: TypeKind| TypeContext {
            name: SmolStr::new(name),
            kind,
        };

        Self {
            types: vec![
                builtin("bool", TypeKind::Bool),
                builtin("int", TypeKind::Int),
                builtin("float", TypeKind::Float),
                builtin("string", TypeKind::String),
            ],
        }
    }

    pub fn get(&self, handle: TypeHandle) -> Option<&TypeContext> {
        self.types.get(handle.index())
    }

    /// Name of the type, or `"<unknown>"` for a foreign handle.
    pub fn name(&self, handle: TypeHandle) -> &str {
        self.get(handle).map(|ty| ty.name.as_str()).unwrap_or("<unknown>")
    }

    pub fn lookup(&self, name: &str) -> Option<TypeHandle> {
        self.types
            .iter()
            .position(|ty| ty.name == name)
            .map(|index| TypeHandle(index as u32))
    }

    /// Declare a struct type without fields.
    ///
    /// Returns `None` when the name is already taken.
    pub fn declare_struct(&mut self, name: &str) -> Option<TypeHandle> {
        if self.lookup(name).is_some() {
            return None;
        }

        let handle = TypeHandle(self.types.len() as u32);
        self.types.push(TypeContext {
            name: SmolStr::new(name),
            kind: TypeKind::Struct { fields: Vec::new() },
        });
        Some(handle)
    }

    /// Replace the fields of a declared struct.
    pub fn set_fields(&mut self, handle: TypeHandle, new_fields: Vec<StructField>) {
        if let Some(TypeContext {
            kind: TypeKind::Struct { fields },
            ..
        }) = self.types.get_mut(handle.index())
        {
            *fields = new_fields;
        }
    }

    /// Look up a struct field, returning its index and type.
    pub fn field(&self, handle: TypeHandle, name: &str) -> Option<(u16, TypeHandle)> {
        match &self.get(handle)?.kind {
            TypeKind::Struct { fields } => {
                let index = fields.iter().position(|field| field.name == name)?;
                Some((u16::try_from(index).ok()?, fields[index].ty))
            }
            _ => None,
        }
    }

    pub fn is_struct(&self, handle: TypeHandle) -> bool {
        matches!(
            self.get(handle).map(|ty| &ty.kind),
            Some(TypeKind::Struct { .. })
        )
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtins() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.lookup("int"), Some(TypeHandle::INT));
        assert_eq!(registry.lookup("string"), Some(TypeHandle::STRING));
        assert_eq!(registry.name(TypeHandle::FLOAT), "float");
        assert!(!registry.is_struct(TypeHandle::BOOL));
    }

    #[test]
    fn test_struct_fields() {
        let mut registry = TypeRegistry::new();
        let point = registry.declare_struct("Point").unwrap();
        assert!(registry.declare_struct("Point").is_none());
        assert!(registry.declare_struct("int").is_none());

        registry.set_fields(
            point,
            vec![
                StructField { name: "x".into(), ty: TypeHandle::INT },
                StructField { name: "y".into(), ty: TypeHandle::FLOAT },
            ],
        );

        assert!(registry.is_struct(point));
        assert_eq!(registry.field(point, "y"), Some((1, TypeHandle::FLOAT)));
        assert_eq!(registry.field(point, "z"), None);
        assert_eq!(registry.field(TypeHandle::INT, "x"), None);
    }

    #[test]
    fn test_field_index_past_u16() {
        let mut registry = TypeRegistry::new();
        let wide = registry.declare_struct("Wide").unwrap();
        let fields = (0..=usize::from(u16::MAX) + 1)
            .map(|i| StructField { name: format!("f{i}").into(), ty: TypeHandle::INT })
            .collect();
        registry.set_fields(wide, fields);

        assert_eq!(registry.field(wide, "f65535"), Some((u16::MAX, TypeHandle::INT)));
        assert_eq!(registry.field(wide, "f65536"), None);
    }
}
