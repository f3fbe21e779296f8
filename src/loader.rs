//! Staged load pipeline turning an export document into [`ProgramData`].
//!
//! Stages run strictly in order:
//!
//! 1. declarations (enums, typedefs, function signatures, structs, unions),
//!    symbols and defined data, all registered through the [`TypeStore`] so
//!    references to undeclared types become placeholders;
//! 2. member comment directives;
//! 3. the resolution pass over types, directives and globals;
//! 4. the namespace tree;
//! 5. functions and, when a disassembly trace is supplied, the call graph.
//!
//! Any fatal error aborts the load and no partial model is returned.

use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;
use tracing::{debug, info, info_span, warn};

use crate::callgraph::{populate_calls, read_calls};
use crate::config::LoaderConfig;
use crate::directives::DirectiveParser;
use crate::error::{ProgramDataError, Result};
use crate::export::{ExportDocument, Record, RecordKind};
use crate::model::function::{Function, FunctionId, Region};
use crate::model::global::Global;
use crate::model::namespace::NamespaceTree;
use crate::model::program::ProgramData;
use crate::model::symbol::{Symbol, SymbolContext};
use crate::types::{
    unswizzle, EnumType, FuncParameter, FuncSignature, StructMember, StructType, Type, TypeAlias,
    TypeKey, TypeStore,
};

/// Return type of function signatures that declare none.
const DEFAULT_RETURN_TYPE: &str = "void";

/// Prefix of switch-case labels in the symbol table.
const CASE_LABEL_PREFIX: &str = "case";

/// Loads [`ProgramData`] from an [`ExportDocument`].
pub struct ProgramDataLoader<'a> {
    config: LoaderConfig,
    function_filter: Option<&'a dyn Fn(&str) -> bool>,
}

impl<'a> ProgramDataLoader<'a> {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            function_filter: None,
        }
    }

    /// Functions whose name the filter rejects are marked ignored and never
    /// appear as callees.
    pub fn with_function_filter(mut self, filter: &'a dyn Fn(&str) -> bool) -> Self {
        self.function_filter = Some(filter);
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Run every stage and freeze the result.
    pub fn load(
        &self,
        doc: &ExportDocument,
        disassembly: Option<&mut dyn BufRead>,
    ) -> Result<ProgramData> {
        let span = info_span!("load_program", records = doc.records.len());
        let _guard = span.enter();

        let mut types = TypeStore::with_builtins(self.config.pointer_size);

        debug!(phase = "declarations", "registering types");
        load_enums(doc, &mut types)?;
        load_type_defs(doc, &mut types)?;
        load_function_defs(doc, &mut types)?;
        load_structs(doc, &mut types, RecordKind::Structure)?;
        load_structs(doc, &mut types, RecordKind::Union)?;

        let mut symbols = self.load_symbols(doc)?;
        let (mut globals, globals_by_key) = load_globals(doc, &mut types, &mut symbols)?;

        debug!(phase = "directives", "parsing member comments");
        let directives = attach_directives(&mut types);

        debug!(phase = "resolve", "resolving type references");
        unswizzle(&mut types);
        for global in &mut globals {
            global.resolve(&mut types);
        }

        debug!(phase = "namespaces", "building namespace tree");
        let namespaces = build_namespaces(&globals, &globals_by_key);

        debug!(phase = "functions", "loading functions");
        let (mut functions, functions_by_key) = self.load_functions(doc, &mut symbols)?;

        let call_stats = match disassembly {
            Some(reader) => {
                let calls = read_calls(reader)?;
                Some(populate_calls(
                    &mut functions,
                    &functions_by_key,
                    calls,
                    &self.config.call_targets,
                ))
            }
            None => None,
        };

        let unresolved = types.unresolved_keys().len();
        info!(
            types = types.len(),
            unresolved,
            directives,
            symbols = symbols.len(),
            globals = globals.len(),
            functions = functions.len(),
            namespaces = namespaces.len(),
            "Program loaded"
        );

        Ok(ProgramData {
            types,
            namespaces,
            symbols: symbols.into_values().collect(),
            functions,
            functions_by_key,
            globals,
            globals_by_key,
            call_stats,
        })
    }

    fn load_symbols(&self, doc: &ExportDocument) -> Result<BTreeMap<u32, Symbol>> {
        let mut symbols = BTreeMap::new();
        let mut skipped = 0usize;
        for record in doc.records_of(RecordKind::Symbol) {
            let Some(address) = record.hex_attr("ADDRESS")? else {
                continue;
            };
            let name = record.str_or_empty("NAME");
            if self.config.skip_case_symbols && name.starts_with(CASE_LABEL_PREFIX) {
                skipped += 1;
                continue;
            }
            symbols.insert(
                address,
                Symbol::new(address, record.str_or_empty("NAMESPACE"), name),
            );
        }
        debug!(count = symbols.len(), skipped, "Loaded symbols");
        Ok(symbols)
    }

    fn load_functions(
        &self,
        doc: &ExportDocument,
        symbols: &mut BTreeMap<u32, Symbol>,
    ) -> Result<(Vec<Function>, HashMap<TypeKey, FunctionId>)> {
        let mut functions: Vec<Function> = Vec::new();
        let mut seen: HashMap<TypeKey, u32> = HashMap::new();

        for record in doc.records_of(RecordKind::Function) {
            let Some(address) = record.hex_attr("ENTRY_POINT")? else {
                continue;
            };
            let key = record.key();

            let mut regions = Vec::new();
            for range in record.children_of(RecordKind::AddressRange) {
                if let (Some(start), Some(end)) = (range.hex_attr("START")?, range.hex_attr("END")?)
                {
                    regions.push(Region::new(start, end));
                }
            }

            if let Some(existing) = seen.get(&key) {
                warn!(%key, address, existing = *existing, "Function already exists");
                continue;
            }
            seen.insert(key.clone(), address);

            let symbol = symbols
                .entry(address)
                .or_insert_with(|| Symbol::new(address, key.namespace(), key.name()));
            symbol.context = Some(SymbolContext::Function(key.clone()));

            let mut function = Function::new(key, address);
            function.regions = regions;
            functions.push(function);
        }

        functions.sort_by_key(|f| f.address);

        let mut by_key = HashMap::with_capacity(functions.len());
        let mut ignored = 0usize;
        for (index, function) in functions.iter_mut().enumerate() {
            function.index = index;
            if let Some(filter) = self.function_filter {
                function.ignored = !filter(function.name());
                if function.ignored {
                    ignored += 1;
                }
            }
            by_key.insert(function.key.clone(), index);
        }

        debug!(count = functions.len(), ignored, "Loaded functions");
        Ok((functions, by_key))
    }
}

fn load_enums(doc: &ExportDocument, types: &mut TypeStore) -> Result<()> {
    let mut count = 0usize;
    for record in doc.records_of(RecordKind::Enum) {
        let mut elements = BTreeMap::new();
        for entry in record.children_of(RecordKind::EnumEntry) {
            elements.insert(
                entry.uint_attr("VALUE")?,
                entry.str_or_empty("NAME").to_string(),
            );
        }
        types.add(Type::Enum(EnumType {
            key: record.key(),
            size: record.uint_attr("SIZE")?,
            elements,
        }));
        count += 1;
    }
    debug!(count, "Loaded enums");
    Ok(())
}

fn load_type_defs(doc: &ExportDocument, types: &mut TypeStore) -> Result<()> {
    let mut count = 0usize;
    for record in doc.records_of(RecordKind::TypeDef) {
        let key = record.key();
        let target = types.get(&record.datatype_key());

        let existing = types.get(&key);
        if types.is_placeholder(existing) {
            types.add(Type::Alias(TypeAlias { key, target }));
            count += 1;
            continue;
        }
        match &types[existing] {
            // Typedefs that restate a built-in keep the built-in.
            Type::Primitive(_) => {}
            other => {
                return Err(ProgramDataError::ConflictingDeclaration {
                    key: key.to_string(),
                    existing: other.to_string(),
                });
            }
        }
    }
    debug!(count, "Loaded typedefs");
    Ok(())
}

fn load_function_defs(doc: &ExportDocument, types: &mut TypeStore) -> Result<()> {
    let mut count = 0usize;
    for record in doc.records_of(RecordKind::FunctionDef) {
        let return_type = match record.first_child(RecordKind::ReturnType) {
            Some(ret) => types.get(&ret.datatype_key()),
            None => types.get(&TypeKey::root(DEFAULT_RETURN_TYPE)),
        };

        let mut parameters = Vec::new();
        for parameter in record.children_of(RecordKind::Parameter) {
            parameters.push(FuncParameter {
                ordinal: parameter.uint_attr("ORDINAL")?,
                name: parameter.str_or_empty("NAME").to_string(),
                size: parameter.uint_attr("SIZE")?,
                ty: types.get(&parameter.datatype_key()),
            });
        }

        types.add(Type::FuncPointer(FuncSignature {
            key: record.key(),
            return_type,
            parameters,
        }));
        count += 1;
    }
    debug!(count, "Loaded function signatures");
    Ok(())
}

/// Load STRUCTURE or UNION records.
fn load_structs(doc: &ExportDocument, types: &mut TypeStore, kind: RecordKind) -> Result<()> {
    let mut count = 0usize;
    for record in doc.records_of(kind) {
        let mut members = Vec::new();
        for member in record.children_of(RecordKind::Member) {
            members.push(load_member(member, types, kind)?);
        }

        let layout = StructType {
            key: record.key(),
            size: record.uint_attr("SIZE")?,
            members,
        };
        types.add(match kind {
            RecordKind::Union => Type::Union(layout),
            _ => Type::Struct(layout),
        });
        count += 1;
    }
    debug!(kind = %kind, count, "Loaded layouts");
    Ok(())
}

fn load_member(member: &Record, types: &mut TypeStore, kind: RecordKind) -> Result<StructMember> {
    let ty = types.get(&member.datatype_key());
    let offset = member.uint_attr("OFFSET")?;
    let size = member.uint_attr("SIZE")?;

    let name = match member.str_attr("NAME") {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("unk{offset:X}"),
    };

    // Structure members carry comments as a child element, union members as
    // an attribute.
    let comment = match kind {
        RecordKind::Union => member.str_attr("COMMENT").map(str::to_string),
        _ => member
            .first_child(RecordKind::RegularCmt)
            .map(|c| c.text.clone().unwrap_or_default()),
    };

    Ok(StructMember::new(name, ty, offset, size, comment))
}

fn load_globals(
    doc: &ExportDocument,
    types: &mut TypeStore,
    symbols: &mut BTreeMap<u32, Symbol>,
) -> Result<(Vec<Global>, HashMap<TypeKey, usize>)> {
    let mut globals = Vec::new();
    for record in doc.records_of(RecordKind::DefinedData) {
        let Some(address) = record.hex_attr("ADDRESS")? else {
            continue;
        };
        let ty = types.get(&record.datatype_key());
        let mut global = Global::new(address, record.uint_attr("SIZE")?, ty);

        if let Some(symbol) = symbols.get_mut(&address) {
            global.key = Some(symbol.key.clone());
            symbol.context = Some(SymbolContext::Global(symbol.key.clone()));
        }
        globals.push(global);
    }

    globals.sort_by_key(|g| g.address);

    let mut by_key = HashMap::new();
    for (index, global) in globals.iter().enumerate() {
        if let Some(key) = &global.key {
            by_key.insert(key.clone(), index);
        }
    }

    debug!(count = globals.len(), named = by_key.len(), "Loaded globals");
    Ok((globals, by_key))
}

/// Parse member comments of every struct and union into directives.
///
/// Returns the number of directives attached.
fn attach_directives(types: &mut TypeStore) -> usize {
    let mut attached = 0usize;

    for key in types.all_keys() {
        let Some(id) = types.lookup(&key) else {
            continue;
        };
        let pending: Vec<(usize, String, String)> = match types[id].as_struct() {
            Some(layout) => layout
                .members
                .iter()
                .enumerate()
                .filter_map(|(i, m)| m.comment.as_ref().map(|c| (i, m.name.clone(), c.clone())))
                .collect(),
            None => continue,
        };
        if pending.is_empty() {
            continue;
        }

        let parsed: Vec<(usize, Vec<_>)> = {
            let mut parser = DirectiveParser::new(|key: &TypeKey| types.get(key));
            pending
                .iter()
                .map(|(index, name, comment)| (*index, parser.try_parse(comment, name)))
                .filter(|(_, directives)| !directives.is_empty())
                .collect()
        };

        if let Some(layout) = types.type_mut(id).as_struct_mut() {
            for (index, directives) in parsed {
                attached += directives.len();
                layout.members[index].directives.extend(directives);
            }
        }
    }

    debug!(count = attached, "Attached directives");
    attached
}

/// Place every keyed global in the node for its namespace.
fn build_namespaces(globals: &[Global], by_key: &HashMap<TypeKey, usize>) -> NamespaceTree {
    let mut tree = NamespaceTree::new();

    let mut keyed: Vec<(&TypeKey, usize)> = by_key.iter().map(|(k, &i)| (k, i)).collect();
    keyed.sort_by_key(|(_, i)| *i);
    for (key, index) in keyed {
        let node = tree.get_or_add(key.namespace());
        tree.add_member(node, index);
    }

    tree.sort(|a, b| {
        let (a, b) = (&globals[*a], &globals[*b]);
        a.name()
            .cmp(&b.name())
            .then(a.address.cmp(&b.address))
    });
    debug!(nodes = tree.len(), "Built namespace tree");
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(offset: u32, name: &str, datatype: &str, namespace: &str, size: u32) -> Record {
        Record::new(RecordKind::Member)
            .attr("OFFSET", format!("0x{offset:x}"))
            .attr("NAME", name)
            .attr("DATATYPE", datatype)
            .attr("DATATYPE_NAMESPACE", namespace)
            .attr("SIZE", format!("0x{size:x}"))
    }

    fn load(records: Vec<Record>) -> Result<ProgramData> {
        ProgramDataLoader::new(LoaderConfig::default()).load(&ExportDocument::new(records), None)
    }

    #[test]
    fn test_conflicting_typedef_is_fatal() {
        let typedef = Record::new(RecordKind::TypeDef)
            .attr("NAME", "thing")
            .attr("NAMESPACE", "/")
            .attr("DATATYPE", "int")
            .attr("DATATYPE_NAMESPACE", "/");
        let err = load(vec![typedef.clone(), typedef.attr("DATATYPE", "uint")]).unwrap_err();
        assert!(matches!(err, ProgramDataError::ConflictingDeclaration { .. }));
        assert_eq!(
            err.to_string(),
            "The type /thing is already defined as typedef /thing"
        );
    }

    #[test]
    fn test_typedef_over_primitive_keeps_primitive() {
        let p = load(vec![Record::new(RecordKind::TypeDef)
            .attr("NAME", "dword")
            .attr("NAMESPACE", "/")
            .attr("DATATYPE", "uint")
            .attr("DATATYPE_NAMESPACE", "/")])
        .unwrap();
        assert!(matches!(p.lookup_type("dword"), Some(Type::Primitive(_))));
    }

    #[test]
    fn test_unnamed_members_and_comments() {
        let p = load(vec![
            Record::new(RecordKind::Structure)
                .attr("NAME", "node_t")
                .attr("NAMESPACE", "/Lists")
                .attr("SIZE", "0x8")
                .child(member(0, "", "dword", "/", 4))
                .child(
                    member(4, "next", "pointer", "/", 4).child(
                        Record::new(RecordKind::RegularCmt).with_text("next @ptr(Lists/node_t)"),
                    ),
                ),
            Record::new(RecordKind::Union)
                .attr("NAME", "value_u")
                .attr("NAMESPACE", "/Lists")
                .attr("SIZE", "0x4")
                .child(member(0, "raw", "dword", "/", 4).attr("COMMENT", "@as(Lists/node_t)")),
        ])
        .unwrap();

        let node = p.lookup_type("Lists/node_t").and_then(Type::as_struct).unwrap();
        assert_eq!(node.member_names(), vec!["[unk0]", "[next]"]);
        assert_eq!(node.members[1].directives.len(), 1);
        let target = node.members[1].directives[0].target().unwrap();
        assert_eq!(p.types()[target].key(), &TypeKey::new("Lists", "node_t"));

        let value = p.lookup_type("Lists/value_u").and_then(Type::as_struct).unwrap();
        assert_eq!(value.members[0].comment.as_deref(), Some("@as(Lists/node_t)"));
        assert_eq!(value.members[0].directives.len(), 1);
    }

    #[test]
    fn test_missing_size_is_fatal() {
        let err = load(vec![Record::new(RecordKind::Enum).attr("NAME", "E")]).unwrap_err();
        assert_eq!(err.to_string(), "Attribute SIZE was not found on ENUM record");
    }

    #[test]
    fn test_symbols_and_globals() {
        let p = load(vec![
            Record::new(RecordKind::Symbol)
                .attr("ADDRESS", "00401000")
                .attr("NAME", "g_counter")
                .attr("NAMESPACE", "/Game"),
            Record::new(RecordKind::Symbol)
                .attr("ADDRESS", "00401010")
                .attr("NAME", "case_0x1"),
            Record::new(RecordKind::Symbol)
                .attr("ADDRESS", ".image::OTHER:00000000")
                .attr("NAME", "header"),
            Record::new(RecordKind::DefinedData)
                .attr("ADDRESS", "00401000")
                .attr("SIZE", "0x4")
                .attr("DATATYPE", "int")
                .attr("DATATYPE_NAMESPACE", "/"),
            Record::new(RecordKind::DefinedData)
                .attr("ADDRESS", "00400ff0")
                .attr("SIZE", "0x2")
                .attr("DATATYPE", "word")
                .attr("DATATYPE_NAMESPACE", "/"),
        ])
        .unwrap();

        assert_eq!(p.symbols().len(), 1);
        assert_eq!(p.globals().len(), 2);
        assert!(p.globals()[0].key.is_none());

        let counter = p.global_by_key(&TypeKey::new("Game", "g_counter")).unwrap();
        assert_eq!(counter.address, 0x401000);
        assert_eq!(p.types().size_of(counter.ty), Some(4));

        let game = p.namespaces().get("Game").unwrap();
        let names: Vec<_> = p.globals_in(game).filter_map(Global::name).collect();
        assert_eq!(names, vec!["g_counter"]);

        let symbol = p.lookup_symbol(0x401005).unwrap();
        assert_eq!(symbol.context, Some(SymbolContext::Global(symbol.key.clone())));
    }
}
