//! Type graph entities.
//!
//! Every entity is one variant of the closed [`Type`] sum type. Entities
//! reference each other through [`TypeId`] handles into the owning
//! [`TypeStore`] arena, which allows mutually recursive declarations without
//! shared ownership.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::directives::Directive;
use crate::types::key::TypeKey;
use crate::types::store::TypeStore;

/// Handle of an entity inside a [`TypeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Discriminant of a [`Type`], for callers that only need the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Primitive,
    Enum,
    Struct,
    Union,
    FuncPointer,
    Alias,
    Pointer,
    Array,
    String,
    Placeholder,
}

impl TypeKind {
    pub fn value(&self) -> &str {
        match self {
            TypeKind::Primitive => "primitive",
            TypeKind::Enum => "enum",
            TypeKind::Struct => "struct",
            TypeKind::Union => "union",
            TypeKind::FuncPointer => "function",
            TypeKind::Alias => "typedef",
            TypeKind::Pointer => "pointer",
            TypeKind::Array => "array",
            TypeKind::String => "string",
            TypeKind::Placeholder => "placeholder",
        }
    }
}

/// A built-in scalar type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primitive {
    pub key: TypeKey,
    pub size: u32,
}

/// Enumeration type with a sparse value to name mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub key: TypeKey,
    pub size: u32,
    pub elements: BTreeMap<u32, String>,
}

/// A member of a struct or union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructMember {
    pub name: String,
    pub ty: TypeId,
    pub offset: u32,
    pub size: u32,
    pub comment: Option<String>,
    pub directives: Vec<Directive>,
}

impl StructMember {
    pub fn new(name: String, ty: TypeId, offset: u32, size: u32, comment: Option<String>) -> Self {
        Self {
            name,
            ty,
            offset,
            size,
            comment,
            directives: Vec::new(),
        }
    }

    /// Resolve the member type and every attached directive.
    pub fn resolve(&mut self, store: &mut TypeStore) -> bool {
        let mut changed = false;
        for directive in &mut self.directives {
            changed |= directive.resolve(store);
        }
        changed | store.resolve_ref(&mut self.ty)
    }
}

/// Struct or union layout. Sizes are declared, never computed from members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    pub key: TypeKey,
    pub size: u32,
    pub members: Vec<StructMember>,
}

impl StructType {
    /// Member names in `[name]` form, in declaration order.
    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|m| format!("[{}]", m.name)).collect()
    }

    pub fn member(&self, name: &str) -> Option<&StructMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// One parameter of a function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncParameter {
    pub ordinal: u32,
    pub name: String,
    pub size: u32,
    pub ty: TypeId,
}

/// Function signature type (function pointer target).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncSignature {
    pub key: TypeKey,
    pub return_type: TypeId,
    pub parameters: Vec<FuncParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAlias {
    pub key: TypeKey,
    pub target: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerType {
    pub key: TypeKey,
    pub pointee: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    pub key: TypeKey,
    pub element: TypeId,
    pub count: u32,
}

/// Any entity of the type graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Primitive(Primitive),
    Enum(EnumType),
    Struct(StructType),
    Union(StructType),
    FuncPointer(FuncSignature),
    Alias(TypeAlias),
    Pointer(PointerType),
    Array(ArrayType),
    String(TypeKey),
    /// Zero-size stand-in for a key with no declaration (yet).
    Placeholder(TypeKey),
}

impl Type {
    pub fn key(&self) -> &TypeKey {
        match self {
            Type::Primitive(t) => &t.key,
            Type::Enum(t) => &t.key,
            Type::Struct(t) | Type::Union(t) => &t.key,
            Type::FuncPointer(t) => &t.key,
            Type::Alias(t) => &t.key,
            Type::Pointer(t) => &t.key,
            Type::Array(t) => &t.key,
            Type::String(key) | Type::Placeholder(key) => key,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            Type::Primitive(_) => TypeKind::Primitive,
            Type::Enum(_) => TypeKind::Enum,
            Type::Struct(_) => TypeKind::Struct,
            Type::Union(_) => TypeKind::Union,
            Type::FuncPointer(_) => TypeKind::FuncPointer,
            Type::Alias(_) => TypeKind::Alias,
            Type::Pointer(_) => TypeKind::Pointer,
            Type::Array(_) => TypeKind::Array,
            Type::String(_) => TypeKind::String,
            Type::Placeholder(_) => TypeKind::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Type::Placeholder(_))
    }

    /// Struct or union layout, if this is one.
    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            Type::Struct(t) | Type::Union(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn as_struct_mut(&mut self) -> Option<&mut StructType> {
        match self {
            Type::Struct(t) | Type::Union(t) => Some(t),
            _ => None,
        }
    }

    /// Replace every placeholder slot with the store's current entity for its key.
    ///
    /// Returns whether any slot changed.
    pub fn resolve(&mut self, store: &mut TypeStore) -> bool {
        match self {
            Type::Struct(t) | Type::Union(t) => {
                let mut changed = false;
                for member in &mut t.members {
                    changed |= member.resolve(store);
                }
                changed
            }
            Type::FuncPointer(t) => {
                let mut changed = store.resolve_ref(&mut t.return_type);
                for parameter in &mut t.parameters {
                    changed |= store.resolve_ref(&mut parameter.ty);
                }
                changed
            }
            Type::Alias(t) => store.resolve_ref(&mut t.target),
            Type::Pointer(t) => store.resolve_ref(&mut t.pointee),
            Type::Array(t) => store.resolve_ref(&mut t.element),
            Type::Primitive(_) | Type::Enum(_) | Type::String(_) | Type::Placeholder(_) => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind().value(), self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_key() {
        let t = Type::Primitive(Primitive {
            key: TypeKey::root("int"),
            size: 4,
        });
        assert_eq!(t.kind(), TypeKind::Primitive);
        assert_eq!(t.key().name(), "int");
        assert_eq!(t.to_string(), "primitive /int");
        assert!(!t.is_placeholder());
        assert!(Type::Placeholder(TypeKey::root("x")).is_placeholder());
    }

    #[test]
    fn test_member_names() {
        let s = StructType {
            key: TypeKey::root("pair"),
            size: 8,
            members: vec![
                StructMember::new("first".into(), TypeId(0), 0, 4, None),
                StructMember::new("second".into(), TypeId(0), 4, 4, None),
            ],
        };
        assert_eq!(s.member_names(), vec!["[first]", "[second]"]);
        assert_eq!(s.member("second").map(|m| m.offset), Some(4));
        assert!(s.member("third").is_none());
    }
}
