//! The fully cross-referenced program model.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::callgraph::CallGraphStats;
use crate::config::LoaderConfig;
use crate::error::Result;
use crate::export::ExportDocument;
use crate::loader::ProgramDataLoader;
use crate::model::function::{Function, FunctionId};
use crate::model::global::Global;
use crate::model::namespace::{NamespaceId, NamespaceTree};
use crate::model::nearest::find_nearest;
use crate::model::symbol::{Symbol, SymbolContext};
use crate::types::{Type, TypeKey, TypeStore};

/// A loaded program: types, globals, symbols and the call graph.
///
/// Produced once by [`ProgramDataLoader`] and immutable afterwards, so it can
/// be shared freely between threads.
#[derive(Debug, Clone)]
pub struct ProgramData {
    pub(crate) types: TypeStore,
    pub(crate) namespaces: NamespaceTree,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) functions: Vec<Function>,
    pub(crate) functions_by_key: HashMap<TypeKey, FunctionId>,
    pub(crate) globals: Vec<Global>,
    pub(crate) globals_by_key: HashMap<TypeKey, usize>,
    pub(crate) call_stats: Option<CallGraphStats>,
}

impl ProgramData {
    /// Load with the default configuration.
    ///
    /// `function_filter` receives each function name and returns whether the
    /// function takes part in the call graph.
    pub fn load(
        doc: &ExportDocument,
        disassembly: Option<&mut dyn BufRead>,
        function_filter: Option<&dyn Fn(&str) -> bool>,
    ) -> Result<Self> {
        let mut loader = ProgramDataLoader::new(LoaderConfig::default());
        if let Some(filter) = function_filter {
            loader = loader.with_function_filter(filter);
        }
        loader.load(doc, disassembly)
    }

    /// Load a JSON export and, optionally, a disassembly trace from disk.
    pub fn load_files<P: AsRef<Path>>(
        export_path: P,
        disassembly_path: Option<&Path>,
        function_filter: Option<&dyn Fn(&str) -> bool>,
    ) -> Result<Self> {
        let doc = ExportDocument::from_json_reader(BufReader::new(File::open(export_path)?))?;
        match disassembly_path {
            Some(path) => {
                let mut reader = BufReader::new(File::open(path)?);
                Self::load(&doc, Some(&mut reader as &mut dyn BufRead), function_filter)
            }
            None => Self::load(&doc, None, function_filter),
        }
    }

    pub fn types(&self) -> &TypeStore {
        &self.types
    }

    /// Type registered under a key string such as `Albion/Memory/alloc_t`.
    pub fn lookup_type(&self, key: &str) -> Option<&Type> {
        self.types.lookup_str(key).map(|id| &self.types[id])
    }

    /// Nearest symbol at or below `address`.
    pub fn lookup_symbol(&self, address: u32) -> Option<&Symbol> {
        find_nearest(&self.symbols, |s| s.address, address).map(|i| &self.symbols[i])
    }

    /// Nearest function entry at or below `address`.
    ///
    /// This is the function that *starts* closest below the address; use
    /// [`Function::contains`] to check the address actually lies inside it.
    pub fn lookup_function(&self, address: u32) -> Option<&Function> {
        find_nearest(&self.functions, |f| f.address, address).map(|i| &self.functions[i])
    }

    /// Symbols in address order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Functions in address order; a function's `index` is its position here.
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id)
    }

    pub fn function_by_key(&self, key: &TypeKey) -> Option<&Function> {
        self.functions_by_key.get(key).map(|&id| &self.functions[id])
    }

    /// Global data in address order.
    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    pub fn global_by_key(&self, key: &TypeKey) -> Option<&Global> {
        self.globals_by_key.get(key).map(|&i| &self.globals[i])
    }

    pub fn namespaces(&self) -> &NamespaceTree {
        &self.namespaces
    }

    /// Globals held directly by a namespace node, sorted by name then address.
    pub fn globals_in(&self, namespace: NamespaceId) -> impl Iterator<Item = &Global> {
        self.namespaces[namespace]
            .members
            .iter()
            .map(move |&i| &self.globals[i])
    }

    /// Function or global that owns a symbol.
    pub fn context_of(&self, symbol: &Symbol) -> Option<SymbolOwner<'_>> {
        match symbol.context.as_ref()? {
            SymbolContext::Function(key) => self.function_by_key(key).map(SymbolOwner::Function),
            SymbolContext::Global(key) => self.global_by_key(key).map(SymbolOwner::Global),
        }
    }

    pub fn callers_of<'a>(&'a self, function: &'a Function) -> impl Iterator<Item = &'a Function> {
        function.callers.iter().map(move |&id| &self.functions[id])
    }

    pub fn callees_of<'a>(&'a self, function: &'a Function) -> impl Iterator<Item = &'a Function> {
        function.callees.iter().map(move |&id| &self.functions[id])
    }

    /// Non-ignored functions nothing calls.
    pub fn root_functions(&self) -> impl Iterator<Item = &Function> {
        self.functions
            .iter()
            .filter(|f| !f.ignored && f.callers.is_empty())
    }

    /// Non-ignored functions that call nothing.
    pub fn leaf_functions(&self) -> impl Iterator<Item = &Function> {
        self.functions
            .iter()
            .filter(|f| !f.ignored && f.callees.is_empty())
    }

    /// Statistics of the call graph build, when a trace was supplied.
    pub fn call_stats(&self) -> Option<&CallGraphStats> {
        self.call_stats.as_ref()
    }
}

/// Borrowed owner of a symbol, see [`ProgramData::context_of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolOwner<'a> {
    Function(&'a Function),
    Global(&'a Global),
}
