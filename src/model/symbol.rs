//! Symbols: named addresses and what owns them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::TypeKey;

/// Which entity owns a symbol's address. A lookup key, not an owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolContext {
    /// Function with this key, see [`crate::ProgramData::function_by_key`].
    Function(TypeKey),
    /// Global with this key, see [`crate::ProgramData::global_by_key`].
    Global(TypeKey),
}

/// A named address from the export's symbol table or a function entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub address: u32,
    pub key: TypeKey,
    pub context: Option<SymbolContext>,
}

impl Symbol {
    pub fn new(address: u32, namespace: &str, name: &str) -> Self {
        Self {
            address,
            key: TypeKey::new(namespace, name),
            context: None,
        }
    }

    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub fn namespace(&self) -> &str {
        self.key.namespace()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x} {}", self.address, self.key)
    }
}
