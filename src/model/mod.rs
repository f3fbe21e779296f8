//! Program model: functions, globals, symbols, namespaces and the frozen
//! [`ProgramData`] that ties them together.

pub mod function;
pub mod global;
pub mod namespace;
pub mod nearest;
pub mod program;
pub mod symbol;

pub use function::{Function, FunctionId, Region};
pub use global::Global;
pub use namespace::{Namespace, NamespaceId, NamespaceTree};
pub use nearest::find_nearest;
pub use program::{ProgramData, SymbolOwner};
pub use symbol::{Symbol, SymbolContext};
