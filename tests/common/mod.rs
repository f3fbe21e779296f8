//! Common test utilities and helpers.
//!
//! `ExportBuilder` assembles an export document from records the way a front
//! end would deliver them, so integration tests can describe programs
//! declaratively.

#![allow(dead_code)]

use program_model::{ExportDocument, ProgramData, Record, RecordKind};
use std::io::{BufRead, Cursor, Write};
use tempfile::NamedTempFile;

/// Builder for export documents used across integration tests
#[derive(Default)]
pub struct ExportBuilder {
    records: Vec<Record>,
}

impl ExportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(mut self, record: Record) -> Self {
        self.records.push(record);
        self
    }

    pub fn records(mut self, records: impl IntoIterator<Item = Record>) -> Self {
        self.records.extend(records);
        self
    }

    pub fn build(self) -> ExportDocument {
        ExportDocument::new(self.records)
    }

    /// Load with the default configuration and no disassembly.
    pub fn load(self) -> ProgramData {
        ProgramData::load(&self.build(), None, None).unwrap()
    }

    /// Load together with a disassembly trace.
    pub fn load_with_trace(self, trace: &str, filter: Option<&dyn Fn(&str) -> bool>) -> ProgramData {
        let mut reader = Cursor::new(trace.as_bytes());
        ProgramData::load(&self.build(), Some(&mut reader as &mut dyn BufRead), filter).unwrap()
    }
}

/// `NAMESPACE`/`NAME` pair on a fresh record.
pub fn named(kind: RecordKind, namespace: &str, name: &str) -> Record {
    Record::new(kind)
        .attr("NAMESPACE", namespace)
        .attr("NAME", name)
}

pub fn member(offset: u32, name: &str, datatype: &str, namespace: &str, size: u32) -> Record {
    Record::new(RecordKind::Member)
        .attr("OFFSET", format!("0x{offset:x}"))
        .attr("DATATYPE", datatype)
        .attr("DATATYPE_NAMESPACE", namespace)
        .attr("NAME", name)
        .attr("SIZE", format!("0x{size:x}"))
}

pub fn structure(namespace: &str, name: &str, size: u32, members: Vec<Record>) -> Record {
    let mut record = named(RecordKind::Structure, namespace, name).attr("SIZE", format!("0x{size:x}"));
    record.children = members;
    record
}

pub fn enumeration(namespace: &str, name: &str, size: u32, entries: &[(&str, u32)]) -> Record {
    entries.iter().fold(
        named(RecordKind::Enum, namespace, name).attr("SIZE", format!("0x{size:x}")),
        |record, (entry, value)| {
            record.child(
                Record::new(RecordKind::EnumEntry)
                    .attr("NAME", *entry)
                    .attr("VALUE", format!("0x{value:x}")),
            )
        },
    )
}

pub fn datatype(kind: RecordKind, datatype: &str, namespace: &str) -> Record {
    Record::new(kind)
        .attr("DATATYPE", datatype)
        .attr("DATATYPE_NAMESPACE", namespace)
}

pub fn function(name: &str, entry: u32, ranges: &[(u32, u32)]) -> Record {
    ranges.iter().fold(
        named(RecordKind::Function, "/", name).attr("ENTRY_POINT", format!("{entry:08x}")),
        |record, (start, end)| {
            record.child(
                Record::new(RecordKind::AddressRange)
                    .attr("START", format!("{start:08x}"))
                    .attr("END", format!("{end:08x}")),
            )
        },
    )
}

/// One `CALL` line of a disassembly trace.
pub fn call_line(address: u32, target: &str) -> String {
    format!("{address:08x}  e8cf050000  CALL  {target}\n")
}

/// Creates a temporary file with the given content.
///
/// The file is removed when the returned `NamedTempFile` is dropped.
pub fn create_temp_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}
