//! Forward line scanner with a bounded prefix window.
//!
//! Indexing a multi-gigabyte dump only needs the first few bytes of each
//! line, so the scanner never buffers more than `window` bytes of a line
//! regardless of how long the line is.

use memchr::memchr;
use std::io::{self, BufRead};

/// Call `visit(offset, prefix)` for every line of `reader`.
///
/// `offset` is the byte offset of the first byte of the line and `prefix`
/// holds at most `window` bytes of it, excluding the line feed. A final line
/// without a terminator is still visited.
pub fn for_each_line_prefix<R, F>(mut reader: R, window: usize, mut visit: F) -> io::Result<()>
where
    R: BufRead,
    F: FnMut(u64, &[u8]),
{
    let mut prefix: Vec<u8> = Vec::with_capacity(window);
    let mut position = 0u64;
    let mut line_start = 0u64;

    loop {
        let consumed = {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                break;
            }

            let (chunk, consumed, line_done) = match memchr(b'\n', buf) {
                Some(pos) => (&buf[..pos], pos + 1, true),
                None => (buf, buf.len(), false),
            };

            let room = window.saturating_sub(prefix.len());
            prefix.extend_from_slice(&chunk[..chunk.len().min(room)]);

            if line_done {
                visit(line_start, &prefix);
                prefix.clear();
                line_start = position + consumed as u64;
            }
            consumed
        };

        reader.consume(consumed);
        position += consumed as u64;
    }

    if position > line_start {
        visit(line_start, &prefix);
    }
    Ok(())
}
