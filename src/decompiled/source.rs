//! Marker index over a decompiled dump, block lookup and the block writer.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use super::lines::for_each_line_prefix;
use super::offsets::{decode, encode, to_absolute, to_offsets};
use super::{DecompiledFunction, ADDRESS_DIGITS, MARKER};
use crate::error::{ProgramDataError, Result};

/// Entry address encoded in a marker line prefix.
fn parse_marker(prefix: &[u8]) -> Option<u32> {
    let rest = prefix.strip_prefix(MARKER.as_bytes())?;
    let digits = rest.get(..ADDRESS_DIGITS)?;
    if !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let digits = std::str::from_utf8(digits).ok()?;
    u32::from_str_radix(digits, 16).ok()
}

/// One line without its terminator; `None` at end of input.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Index over a decompiled source dump.
///
/// Construction scans the whole input once; lookups then seek straight to
/// the requested function. The reader sits behind a mutex so a shared
/// `DecompiledSource` can serve lookups from several threads, one at a time.
#[derive(Debug)]
pub struct DecompiledSource<R> {
    offsets: HashMap<u32, u64>,
    reader: Mutex<BufReader<R>>,
}

impl DecompiledSource<File> {
    /// Open and index a dump on disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let source = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            functions = source.len(),
            "Indexed decompiled source"
        );
        Ok(source)
    }
}

impl<R: Read + Seek> DecompiledSource<R> {
    /// Index a dump from any seekable reader, starting at its beginning.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        reader.seek(SeekFrom::Start(0))?;

        let mut offsets = HashMap::new();
        let window = MARKER.len() + ADDRESS_DIGITS;
        for_each_line_prefix(&mut reader, window, |offset, prefix| {
            if let Some(address) = parse_marker(prefix) {
                offsets.insert(address, offset);
            }
        })?;
        debug!(functions = offsets.len(), "Scanned decompiled source");

        Ok(Self {
            offsets,
            reader: Mutex::new(reader),
        })
    }

    /// Number of indexed functions.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn contains(&self, address: u32) -> bool {
        self.offsets.contains_key(&address)
    }

    /// Indexed entry addresses in ascending order.
    pub fn addresses(&self) -> Vec<u32> {
        let mut addresses: Vec<u32> = self.offsets.keys().copied().collect();
        addresses.sort_unstable();
        addresses
    }

    /// Byte offset of the marker line for `address`.
    pub fn offset_of(&self, address: u32) -> Option<u64> {
        self.offsets.get(&address).copied()
    }

    /// Read back the function whose entry point is `address`.
    ///
    /// Returns `Ok(None)` when the address was not indexed, when the marker
    /// line no longer parses, or when the file ends before all lines were
    /// read.
    pub fn try_get_function(&self, address: u32) -> Result<Option<DecompiledFunction>> {
        let Some(offset) = self.offset_of(address) else {
            return Ok(None);
        };

        let mut reader = self
            .reader
            .lock()
            .map_err(|_| ProgramDataError::Internal("decompiled source reader poisoned".into()))?;
        reader.seek(SeekFrom::Start(offset))?;

        let Some(marker) = read_line(&mut *reader)? else {
            return Ok(None);
        };
        if !marker.starts_with(MARKER) || marker.len() < MARKER.len() + ADDRESS_DIGITS {
            return Ok(None);
        }

        let packed = marker.get(MARKER.len() + ADDRESS_DIGITS + 1..).unwrap_or("");
        let line_addresses = to_absolute(address, &decode(packed));

        let mut lines = Vec::with_capacity(line_addresses.len());
        while lines.len() < line_addresses.len() {
            match read_line(&mut *reader)? {
                Some(line) => lines.push(line),
                None => {
                    warn!(
                        address,
                        expected = line_addresses.len(),
                        found = lines.len(),
                        "Decompiled function truncated by end of file"
                    );
                    return Ok(None);
                }
            }
        }

        Ok(Some(DecompiledFunction {
            address,
            lines,
            line_addresses,
        }))
    }
}

/// Write one function block: the marker line followed by its code lines.
///
/// Each entry pairs a line with the address it was generated from. Lines
/// must not contain line feeds.
pub fn write_function_block<W: Write>(
    writer: &mut W,
    address: u32,
    lines: &[(u32, &str)],
) -> Result<()> {
    let absolute: Vec<u32> = lines.iter().map(|(a, _)| *a).collect();
    let packed = encode(&to_offsets(address, &absolute));
    writeln!(writer, "{MARKER}{address:08x} {packed}")?;
    for (_, line) in lines {
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn dump() -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"/* header */\n");
        write_function_block(
            &mut out,
            0x401000,
            &[
                (0x401000, "int main(void)"),
                (0x401000, "{"),
                (0x401003, "  return helper();"),
                (0x401100, "}"),
            ],
        )
        .unwrap();
        write_function_block(&mut out, 0x402000, &[(0x401ff0, "void helper(void) {}")]).unwrap();
        out
    }

    #[test]
    fn test_index_and_lookup() {
        let source = DecompiledSource::from_reader(Cursor::new(dump())).unwrap();
        assert_eq!(source.addresses(), vec![0x401000, 0x402000]);
        assert_eq!(source.offset_of(0x401000), Some(13));

        let main = source.try_get_function(0x401000).unwrap().unwrap();
        assert_eq!(main.lines.len(), 4);
        assert_eq!(main.lines[2], "  return helper();");
        assert_eq!(main.line_addresses, vec![0x401000, 0x401000, 0x401003, 0x401100]);
        assert_eq!(main.lines_at(0x401000), vec!["int main(void)", "{"]);

        let helper = source.try_get_function(0x402000).unwrap().unwrap();
        assert_eq!(helper.line_addresses, vec![0x401ff0]);

        assert!(source.try_get_function(0x403000).unwrap().is_none());
    }

    #[test]
    fn test_crlf_lines() {
        let text = "//!L! 0000abcd AB\r\nfirst\r\nsecond\r\n";
        let source = DecompiledSource::from_reader(Cursor::new(text.as_bytes().to_vec())).unwrap();
        let f = source.try_get_function(0xabcd).unwrap().unwrap();
        assert_eq!(f.lines, vec!["first", "second"]);
        assert_eq!(f.line_addresses, vec![0xabcd, 0xabce]);
    }

    #[test]
    fn test_truncated_block() {
        let text = "//!L! 00001000 BBB\nonly one line\n";
        let source = DecompiledSource::from_reader(Cursor::new(text.as_bytes().to_vec())).unwrap();
        assert!(source.contains(0x1000));
        assert!(source.try_get_function(0x1000).unwrap().is_none());
    }

    #[test]
    fn test_marker_requires_eight_digits() {
        let text = "//!L! 1000 B\nx\n//!L! 0000100g B\ny\n// plain comment\n";
        let source = DecompiledSource::from_reader(Cursor::new(text.as_bytes().to_vec())).unwrap();
        assert!(source.is_empty());
    }

    #[test]
    fn test_empty_function_block() {
        let mut out = Vec::new();
        write_function_block(&mut out, 0x500, &[]).unwrap();
        let source = DecompiledSource::from_reader(Cursor::new(out)).unwrap();
        let f = source.try_get_function(0x500).unwrap().unwrap();
        assert!(f.lines.is_empty());
        assert!(f.line_addresses.is_empty());
    }
}
