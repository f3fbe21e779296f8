//! Functions and the address regions they cover.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::types::TypeKey;

/// Position of a function in the address-ordered function list.
pub type FunctionId = usize;

/// Contiguous address range owned by a function, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub start: u32,
    pub end: u32,
}

impl Region {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, address: u32) -> bool {
        address >= self.start && address <= self.end
    }
}

/// Represents a function of the analysed program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub key: TypeKey,

    /// Entry point address
    pub address: u32,

    /// Address ranges in declaration order; split functions have several
    pub regions: Vec<Region>,

    /// Position in address order
    pub index: FunctionId,

    /// Excluded by the caller's function filter; never recorded as a callee
    pub ignored: bool,

    /// Functions that call this function
    pub callers: BTreeSet<FunctionId>,

    /// Functions called by this function
    pub callees: BTreeSet<FunctionId>,
}

impl Function {
    pub fn new(key: TypeKey, address: u32) -> Self {
        Self {
            key,
            address,
            regions: Vec::new(),
            index: 0,
            ignored: false,
            callers: BTreeSet::new(),
            callees: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.key.name()
    }

    /// Whether any region covers `address`.
    pub fn contains(&self, address: u32) -> bool {
        self.regions.iter().any(|r| r.contains(address))
    }

    /// Total bytes covered by all regions.
    pub fn size(&self) -> u64 {
        self.regions
            .iter()
            .map(|r| u64::from(r.end.saturating_sub(r.start)) + 1)
            .sum()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x} {}", self.address, self.key)
    }
}
