//! Built-in types seeded into every store before declarations load.

use crate::types::key::TypeKey;
use crate::types::ty::{Primitive, Type};

/// Name of the built-in variable-length string type.
pub const STRING_TYPE_NAME: &str = "string";

/// Synthetic name that always denotes a pointer to [`STRING_TYPE_NAME`].
pub const CHAR_POINTER_NAME: &str = "char *";

/// Built-in primitives with a fixed size independent of the platform.
const FIXED_PRIMITIVES: &[(&str, u32)] = &[
    ("bool", 1),
    ("sbyte", 1),
    ("word", 2),
    ("short", 2),
    ("int", 4),
    ("long", 4),
    ("dword", 4),
    ("longlong", 8),
    ("qword", 8),
    ("byte", 1),
    ("uchar", 1),
    ("ushort", 2),
    ("uint", 4),
    ("ulong", 4),
    ("ulonglong", 8),
    ("undefined", 1),
    ("undefined1", 1),
    ("undefined2", 2),
    ("undefined4", 4),
    ("undefined6", 6),
    ("undefined8", 8),
    ("char", 1),
    ("float", 4),
    ("double", 8),
    ("float10", 10),
    ("void", 0),
    ("va_list", 0),
    ("ImageBaseOffset32", 4),
    ("pointer32", 4),
];

/// Primitives sized like a pointer on the target platform.
const POINTER_SIZED_PRIMITIVES: &[&str] = &["pointer", "size_t"];

/// All built-in types for a platform with the given pointer size.
pub fn builtin_types(pointer_size: u32) -> Vec<Type> {
    let mut types = Vec::with_capacity(FIXED_PRIMITIVES.len() + POINTER_SIZED_PRIMITIVES.len() + 1);
    types.push(Type::String(TypeKey::root(STRING_TYPE_NAME)));
    types.extend(FIXED_PRIMITIVES.iter().map(|(name, size)| {
        Type::Primitive(Primitive {
            key: TypeKey::root(*name),
            size: *size,
        })
    }));
    types.extend(POINTER_SIZED_PRIMITIVES.iter().map(|name| {
        Type::Primitive(Primitive {
            key: TypeKey::root(*name),
            size: pointer_size,
        })
    }));
    types
}
