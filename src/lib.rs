//! Cross-referenced model of a reverse-engineered program.
//!
//! [`ProgramData`] is loaded from an [`ExportDocument`] describing a binary's
//! types, symbols, data and functions, optionally together with a
//! disassembly trace for the call graph. [`DecompiledSource`] indexes a dump
//! of decompiled code for per-function random access.

/// Call trace parsing and call graph construction
pub mod callgraph;
/// Loader configuration
pub mod config;
/// Decompiled source index and packed line offsets
pub mod decompiled;
/// Member comment directives
pub mod directives;
/// Error types
pub mod error;
/// Export record feed
pub mod export;
/// Staged load pipeline
pub mod loader;
/// Logging and tracing setup
pub mod logging;
/// Functions, globals, symbols and namespaces
pub mod model;
/// Type graph and resolution
pub mod types;

pub use callgraph::{CallGraphStats, CallRecord};
pub use config::{CallTargetConfig, LoaderConfig};
pub use decompiled::{DecompiledFunction, DecompiledSource};
pub use directives::Directive;
pub use error::{ProgramDataError, Result};
pub use export::{ExportDocument, Record, RecordKind};
pub use loader::ProgramDataLoader;
pub use model::{Function, Global, NamespaceTree, ProgramData, Symbol, SymbolContext};
pub use types::{Type, TypeId, TypeKey, TypeStore};
