//! Type graph: keys, entities, the store and the resolution pass.

pub mod key;
pub mod primitives;
pub mod resolve;
pub mod store;
pub mod ty;

pub use key::TypeKey;
pub use resolve::unswizzle;
pub use store::TypeStore;
pub use ty::{
    ArrayType, EnumType, FuncParameter, FuncSignature, PointerType, Primitive, StructMember,
    StructType, Type, TypeAlias, TypeId, TypeKind,
};
