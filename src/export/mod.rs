//! Export record feed.
//!
//! The program export arrives as a tree of flat records, one per declared
//! entity, each carrying string attributes named after the Ghidra XML export
//! (`NAME`, `NAMESPACE`, `DATATYPE`, ...). Records can be built in code or
//! deserialised from JSON. Numeric parsing rules live here so every stage of
//! the loader applies them identically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

use crate::error::{ProgramDataError, Result};
use crate::types::TypeKey;

/// Kind of an export record, named after the export element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    Enum,
    EnumEntry,
    TypeDef,
    FunctionDef,
    ReturnType,
    Parameter,
    Structure,
    Union,
    Member,
    RegularCmt,
    Symbol,
    DefinedData,
    Function,
    AddressRange,
}

impl RecordKind {
    pub fn value(&self) -> &str {
        match self {
            RecordKind::Enum => "ENUM",
            RecordKind::EnumEntry => "ENUM_ENTRY",
            RecordKind::TypeDef => "TYPE_DEF",
            RecordKind::FunctionDef => "FUNCTION_DEF",
            RecordKind::ReturnType => "RETURN_TYPE",
            RecordKind::Parameter => "PARAMETER",
            RecordKind::Structure => "STRUCTURE",
            RecordKind::Union => "UNION",
            RecordKind::Member => "MEMBER",
            RecordKind::RegularCmt => "REGULAR_CMT",
            RecordKind::Symbol => "SYMBOL",
            RecordKind::DefinedData => "DEFINED_DATA",
            RecordKind::Function => "FUNCTION",
            RecordKind::AddressRange => "ADDRESS_RANGE",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

/// One export element: attributes, nested records and optional inner text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub kind: RecordKind,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Record {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Builder-style attribute setter.
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Builder-style child append.
    pub fn child(mut self, child: Record) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Children of one kind, in document order.
    pub fn children_of(&self, kind: RecordKind) -> impl Iterator<Item = &Record> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    pub fn first_child(&self, kind: RecordKind) -> Option<&Record> {
        self.children_of(kind).next()
    }

    /// Optional string attribute.
    pub fn str_attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// String attribute defaulting to empty when absent.
    pub fn str_or_empty(&self, name: &str) -> &str {
        self.str_attr(name).unwrap_or("")
    }

    /// Key built from the `NAMESPACE` and `NAME` attributes.
    pub fn key(&self) -> TypeKey {
        TypeKey::new(self.str_or_empty("NAMESPACE"), self.str_or_empty("NAME"))
    }

    /// Key of the referenced data type, trimmed.
    pub fn datatype_key(&self) -> TypeKey {
        TypeKey::new(
            self.str_or_empty("DATATYPE_NAMESPACE").trim(),
            self.str_or_empty("DATATYPE").trim(),
        )
    }

    fn required(&self, name: &str) -> Result<&str> {
        self.str_attr(name)
            .ok_or_else(|| ProgramDataError::MissingAttribute {
                element: self.kind.to_string(),
                attribute: name.to_string(),
            })
    }

    /// Required unsigned attribute, decimal or `0x`-prefixed hexadecimal.
    pub fn uint_attr(&self, name: &str) -> Result<u32> {
        let value = self.required(name)?;
        let parsed = match value.strip_prefix("0x") {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => value.parse::<u32>(),
        };
        parsed.map_err(|_| invalid_number(name, value))
    }

    /// Required bare-hex address attribute.
    ///
    /// Values containing `:` (e.g. `.image::OTHER:00000000`) are header
    /// pseudo-addresses and yield `None`.
    pub fn hex_attr(&self, name: &str) -> Result<Option<u32>> {
        let value = self.required(name)?;
        if value.contains(':') {
            return Ok(None);
        }
        u32::from_str_radix(value, 16)
            .map(Some)
            .map_err(|_| invalid_number(name, value))
    }
}

fn invalid_number(attribute: &str, value: &str) -> ProgramDataError {
    ProgramDataError::InvalidNumber {
        attribute: attribute.to_string(),
        value: value.to_string(),
    }
}

/// A complete export: top-level records of every kind, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub records: Vec<Record>,
}

impl ExportDocument {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Top-level records of one kind, in document order.
    pub fn records_of(&self, kind: RecordKind) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |r| r.kind == kind)
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uint_attr_formats() {
        let r = Record::new(RecordKind::Structure)
            .attr("SIZE", "0x12")
            .attr("COUNT", "17")
            .attr("BAD", "0xZZ");
        assert_eq!(r.uint_attr("SIZE").unwrap(), 18);
        assert_eq!(r.uint_attr("COUNT").unwrap(), 17);
        assert!(matches!(
            r.uint_attr("BAD"),
            Err(ProgramDataError::InvalidNumber { .. })
        ));
        assert!(matches!(
            r.uint_attr("MISSING"),
            Err(ProgramDataError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_hex_attr_pseudo_address() {
        let r = Record::new(RecordKind::Symbol)
            .attr("ADDRESS", "0040a1f0")
            .attr("HEADER", ".image::OTHER:00000000");
        assert_eq!(r.hex_attr("ADDRESS").unwrap(), Some(0x40a1f0));
        assert_eq!(r.hex_attr("HEADER").unwrap(), None);
        assert!(r.hex_attr("MISSING").is_err());
    }

    #[test]
    fn test_keys() {
        let r = Record::new(RecordKind::Member)
            .attr("NAMESPACE", "/Ns1/Ns2")
            .attr("NAME", "TwoInts")
            .attr("DATATYPE", " int ")
            .attr("DATATYPE_NAMESPACE", "/");
        assert_eq!(r.key(), TypeKey::new("Ns1/Ns2", "TwoInts"));
        assert_eq!(r.datatype_key(), TypeKey::root("int"));
    }

    #[test]
    fn test_json_document() {
        let json = r#"{
            "records": [
                {"kind": "ENUM", "attributes": {"NAME": "E", "SIZE": "0x1"},
                 "children": [{"kind": "ENUM_ENTRY", "attributes": {"NAME": "A", "VALUE": "0x0"}}]},
                {"kind": "SYMBOL", "attributes": {"ADDRESS": "00401000", "NAME": "main"}}
            ]
        }"#;
        let doc = ExportDocument::from_json_str(json).unwrap();
        assert_eq!(doc.records_of(RecordKind::Enum).count(), 1);
        let e = doc.records_of(RecordKind::Enum).next().unwrap();
        assert_eq!(e.children_of(RecordKind::EnumEntry).count(), 1);
        assert_eq!(doc.records_of(RecordKind::Symbol).count(), 1);
    }
}
