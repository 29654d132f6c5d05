//! Low-level line and byte reading utilities.

use std::borrow::Cow;
use std::io::{self, BufRead, Read};

use encoding_rs::UTF_8;
use log::trace;

/// Lines longer than this (after trimming) are noise and never parsed.
pub const MAX_LINE_LENGTH: usize = 1024;

/// Reads one raw line, terminator included, into `buf`.
///
/// Returns `false` at end of stream.
pub fn read_raw_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    Ok(reader.read_until(b'\n', buf)? > 0)
}

/// Outcome of reading one text line.
#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    Eof,
    /// The line was not valid UTF-8 and should be skipped.
    Undecodable,
    /// The decoded line with surrounding whitespace trimmed.
    Text(String),
}

/// Reads and decodes one line.
pub fn read_text_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Line> {
    if !read_raw_line(reader, buf)? {
        return Ok(Line::Eof);
    }
    Ok(match decode_line(buf) {
        Some(text) => Line::Text(text.into_owned()),
        None => {
            trace!("Skipping line that is not valid UTF-8");
            Line::Undecodable
        }
    })
}

/// Strictly decodes a raw line as UTF-8 and trims surrounding whitespace.
///
/// Returns `None` for malformed input so the caller can skip the line.
pub fn decode_line(raw: &[u8]) -> Option<Cow<'_, str>> {
    let decoded = UTF_8.decode_without_bom_handling_and_without_replacement(raw)?;
    Some(match decoded {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim()),
        Cow::Owned(s) => Cow::Owned(s.trim().to_owned()),
    })
}

/// Trims ASCII whitespace from both ends of a raw line.
pub fn trim_bytes(raw: &[u8]) -> &[u8] {
    raw.trim_ascii()
}

/// Splits `key: value` on the first colon, which must not be the first character.
pub fn split_pair(line: &str) -> Option<(&str, &str)> {
    match line.find(':') {
        Some(idx) if idx > 0 => Some((line[..idx].trim(), line[idx + 1..].trim())),
        _ => None,
    }
}

/// Reads up to `size` bytes, returning fewer only at end of stream.
pub fn read_up_to<R: Read>(reader: &mut R, size: u64) -> io::Result<Vec<u8>> {
    let mut data = Vec::with_capacity(size.min(1 << 20) as usize);
    reader.take(size).read_to_end(&mut data)?;
    Ok(data)
}

/// Drops a leading `\r\n` left by old writers that emitted a blank protocol
/// header line twice, refilling the tail from the stream so the payload
/// keeps its declared length.
pub fn shift_legacy_crlf<R: Read>(reader: &mut R, data: &mut Vec<u8>) -> io::Result<bool> {
    if !data.starts_with(b"\r\n") {
        return Ok(false);
    }
    let tail = read_up_to(reader, 2)?;
    data.drain(..2);
    data.extend_from_slice(&tail);
    Ok(true)
}
