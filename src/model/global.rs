//! Global data items.

use crate::types::{TypeId, TypeKey, TypeStore};

/// A defined data item at a fixed address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    pub address: u32,
    pub size: u32,
    pub ty: TypeId,
    /// Key of the symbol at `address`, if there is one.
    pub key: Option<TypeKey>,
}

impl Global {
    pub fn new(address: u32, size: u32, ty: TypeId) -> Self {
        Self {
            address,
            size,
            ty,
            key: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.key.as_ref().map(|k| k.name())
    }

    pub fn resolve(&mut self, store: &mut TypeStore) -> bool {
        store.resolve_ref(&mut self.ty)
    }
}
