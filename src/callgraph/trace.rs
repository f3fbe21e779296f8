//! Disassembly trace reader.
//!
//! Only `CALL` lines matter:
//!
//! ```text
//! 00401a2c  e8 cf 05 00 00    CALL  FUN_00402000
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use tracing::debug;

use crate::error::Result;

static CALL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9a-fA-F]{8})\s+[0-9a-fA-F]+\s+CALL\s+(\S+)\s*$").expect("valid call line regex")
});

/// A call instruction and its textual target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub address: u32,
    pub target: String,
}

impl CallRecord {
    pub fn new(address: u32, target: impl Into<String>) -> Self {
        Self {
            address,
            target: target.into(),
        }
    }
}

/// Parse one trace line; `None` for anything that is not a call.
pub fn parse_call_line(line: &str) -> Option<CallRecord> {
    let caps = CALL_LINE.captures(line)?;
    let address = u32::from_str_radix(&caps[1], 16).ok()?;
    Some(CallRecord::new(address, &caps[2]))
}

/// Read every call record from a trace, in file order.
///
/// Lines are decoded lossily: listings carry string data in legacy code
/// pages, and only the ASCII `CALL` lines are of interest.
pub fn read_calls<R: BufRead>(mut reader: R) -> Result<Vec<CallRecord>> {
    let mut calls = Vec::new();
    let mut lines = 0usize;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        lines += 1;
        let line = String::from_utf8_lossy(&buf);
        if let Some(call) = parse_call_line(line.trim_end_matches(['\r', '\n'])) {
            calls.push(call);
        }
    }
    debug!(lines, calls = calls.len(), "Read disassembly trace");
    Ok(calls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_call_line() {
        let call = parse_call_line("00401a2c  e8cf050000  CALL  FUN_00402000  ").unwrap();
        assert_eq!(call, CallRecord::new(0x401a2c, "FUN_00402000"));

        assert!(parse_call_line("0040ABCD ff15 CALL dword ptr").is_none());
        assert!(parse_call_line("00401a31  8b45fc  MOV  EAX,dword ptr [EBP + -0x4]").is_none());
        assert!(parse_call_line("junk").is_none());
    }

    #[test]
    fn test_read_calls() {
        let trace = "\
00401000  55  PUSH  EBP
00401001  e8fa0f0000  CALL  FUN_00402000
00401006  ffd0  CALL  EAX
";
        let calls = read_calls(Cursor::new(trace)).unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].target, "EAX");
    }

    #[test]
    fn test_read_calls_skips_undecodable_lines() {
        let mut trace = b"00403000  81  ds  \"Gr".to_vec();
        trace.extend_from_slice(&[0x81, 0xe1]);
        trace.extend_from_slice(b"e\"\r\n00401001  e8fa0f0000  CALL  FUN_00402000\r\n");

        let calls = read_calls(Cursor::new(trace)).unwrap();
        assert_eq!(calls, vec![CallRecord::new(0x401001, "FUN_00402000")]);
    }
}
