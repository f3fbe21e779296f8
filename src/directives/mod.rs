//! Cross-reference directives embedded in struct member comments.
//!
//! A member comment such as `next block @ptr(Albion/Memory/alloc_t)` attaches a
//! [`Directive`] to the member. Directives that name a type hold a [`TypeId`]
//! obtained from the store while parsing, so they take part in the same
//! resolution pass as member types.

pub mod parser;

pub use parser::DirectiveParser;

use crate::types::{TypeId, TypeStore};

/// A typed cross reference attached to a struct or union member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `@ptr(path)`: the member points at the type named by `path`.
    PointsTo { path: String, target: TypeId },
    /// `@as(path)`: the member should be read as the type named by `path`.
    Reinterpret { path: String, target: TypeId },
    /// `@len(member)`: element count of this buffer lives in sibling `member`.
    LengthFrom { member: String },
    /// `@child(path, directive)`: applies `directive` to a nested member.
    TargetChild {
        path: String,
        directive: Box<Directive>,
    },
}

impl Directive {
    /// The path this directive names.
    pub fn path(&self) -> &str {
        match self {
            Directive::PointsTo { path, .. }
            | Directive::Reinterpret { path, .. }
            | Directive::TargetChild { path, .. } => path,
            Directive::LengthFrom { member } => member,
        }
    }

    /// The referenced type, looking through `@child` wrappers.
    pub fn target(&self) -> Option<TypeId> {
        match self {
            Directive::PointsTo { target, .. } | Directive::Reinterpret { target, .. } => {
                Some(*target)
            }
            Directive::TargetChild { directive, .. } => directive.target(),
            Directive::LengthFrom { .. } => None,
        }
    }

    /// Swap a placeholder type reference for the declared type.
    pub fn resolve(&mut self, store: &mut TypeStore) -> bool {
        match self {
            Directive::PointsTo { target, .. } | Directive::Reinterpret { target, .. } => {
                store.resolve_ref(target)
            }
            Directive::TargetChild { directive, .. } => directive.resolve(store),
            Directive::LengthFrom { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StructType, Type, TypeKey};

    #[test]
    fn test_resolve_nested_target() {
        let mut store = TypeStore::default();
        let key = TypeKey::new("game", "party_t");
        let placeholder = store.get(&key);
        let mut directive = Directive::TargetChild {
            path: "members.first".to_string(),
            directive: Box::new(Directive::PointsTo {
                path: "game/party_t".to_string(),
                target: placeholder,
            }),
        };

        let real = store.add(Type::Struct(StructType {
            key,
            size: 12,
            members: Vec::new(),
        }));
        assert!(directive.resolve(&mut store));
        assert_eq!(directive.target(), Some(real));
        assert_eq!(directive.path(), "members.first");
    }

    #[test]
    fn test_length_has_no_target() {
        let mut store = TypeStore::default();
        let mut directive = Directive::LengthFrom {
            member: "count".to_string(),
        };
        assert!(!directive.resolve(&mut store));
        assert_eq!(directive.target(), None);
    }
}
