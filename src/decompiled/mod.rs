//! Random access into a decompiled source dump.
//!
//! The dump is a text file in which each function's code is preceded by a
//! marker line:
//!
//! ```text
//! //!L! 00401000 ACB[BA]D-
//! int __cdecl main(void)
//! {
//!   return 0;
//! }
//! ```
//!
//! The marker holds the entry address as eight hex digits followed by the
//! packed address deltas of the lines that follow (see [`offsets`]). One
//! forward scan records where each marker starts, after which any function
//! can be read back with a single seek.

pub mod lines;
pub mod offsets;
mod source;

use serde::{Deserialize, Serialize};

pub use source::{write_function_block, DecompiledSource};

/// Prefix of every function marker line.
pub const MARKER: &str = "//!L! ";

/// Hex digits of the entry address that follow [`MARKER`].
pub const ADDRESS_DIGITS: usize = 8;

/// Code lines of one function together with the address each came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompiledFunction {
    pub address: u32,
    pub lines: Vec<String>,
    pub line_addresses: Vec<u32>,
}

impl DecompiledFunction {
    /// Lines paired with their addresses.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.line_addresses
            .iter()
            .copied()
            .zip(self.lines.iter().map(String::as_str))
    }

    /// Lines whose address is exactly `address`.
    pub fn lines_at(&self, address: u32) -> Vec<&str> {
        self.iter()
            .filter(|(a, _)| *a == address)
            .map(|(_, line)| line)
            .collect()
    }
}
