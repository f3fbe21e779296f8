//! Function call graph construction.
//!
//! The disassembly trace is reduced to `(address, target)` call records which
//! are then matched against function regions by [`populate_calls`].

pub mod builder;
pub mod trace;

pub use builder::{populate_calls, CallGraphStats};
pub use trace::{parse_call_line, read_calls, CallRecord};
