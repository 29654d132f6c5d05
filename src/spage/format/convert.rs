//! Streaming spage → offpage conversion.
//!
//! Walks the spage layout with the same state machine as
//! [`SpageDecoder`](super::spage::SpageDecoder) but keeps bytes verbatim
//! instead of parsing them. Each record is re-emitted in the offpage layout
//! with one `snapshot` segment holding the zlib compressed http header block
//! followed by the (inflated) payload:
//!
//! ```text
//! <url>\n
//! <inner header lines except Store-Size / Original-Size>\n
//! Content-Type: snapshot, <store size>;\n
//! Original-Size: snapshot, <original size>;\n
//! \n
//! <compressed snapshot>\n
//! ```

use std::io::BufRead;
use std::iter::FusedIterator;
use std::mem;
use std::str;

use log::{debug, trace, warn};

use crate::spage::codec::boundary::{Boundary, UrlBoundary};
use crate::spage::codec::compression;
use crate::spage::codec::lines::{self, MAX_LINE_LENGTH};
use crate::spage::types::error::Result;
use crate::spage::types::models::keys;

/// Name of the single segment written by the converter.
pub const SNAPSHOT: &str = "snapshot";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InnerHeader,
    HttpHeader,
    Payload,
    Done,
}

enum Step {
    Continue,
    Emit(Vec<u8>),
    End,
}

/// Lazily converts spage records into encoded offpage records.
pub struct SpageToOffpageConverter<R, B = UrlBoundary> {
    reader: R,
    boundary: B,
    state: State,
    url: Option<Vec<u8>>,
    inner_header: Vec<u8>,
    has_inner_header: bool,
    store_size: i64,
    snapshot: Vec<u8>,
    http_lines: usize,
    lookahead_url: Option<Vec<u8>>,
    truncated: bool,
    line: Vec<u8>,
}

impl<R: BufRead> SpageToOffpageConverter<R> {
    pub fn new(reader: R) -> Self {
        Self::with_boundary(reader, UrlBoundary)
    }
}

impl<R: BufRead, B: Boundary> SpageToOffpageConverter<R, B> {
    pub fn with_boundary(reader: R, boundary: B) -> Self {
        Self {
            reader,
            boundary,
            state: State::InnerHeader,
            url: None,
            inner_header: Vec::new(),
            has_inner_header: false,
            store_size: 0,
            snapshot: Vec::new(),
            http_lines: 0,
            lookahead_url: None,
            truncated: false,
            line: Vec::new(),
        }
    }

    /// True if the sequence ended because a declared payload was missing.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    fn step(&mut self) -> Result<Step> {
        match self.state {
            State::InnerHeader => self.read_inner_header(),
            State::HttpHeader => self.read_http_header(),
            State::Payload => self.read_payload(),
            State::Done => Ok(Step::End),
        }
    }

    fn is_boundary(&self, line: &[u8]) -> bool {
        str::from_utf8(line).is_ok_and(|s| self.boundary.is_boundary(s))
    }

    fn read_inner_header(&mut self) -> Result<Step> {
        if !lines::read_raw_line(&mut self.reader, &mut self.line)? {
            return Ok(Step::End);
        }
        let line = lines::trim_bytes(&self.line).to_vec();

        if line.is_empty() {
            if self.has_inner_header && self.url.is_some() {
                self.state = State::HttpHeader;
            }
        } else if line.len() > MAX_LINE_LENGTH {
            debug!("Ignoring {} byte line in inner header", line.len());
        } else if self.is_boundary(&line) {
            if self.url.is_some() && self.has_inner_header {
                self.lookahead_url = Some(line);
                self.state = State::Payload;
            } else {
                self.inner_header.clear();
                self.has_inner_header = false;
                self.store_size = 0;
                self.url = Some(line);
            }
        } else {
            self.has_inner_header = true;
            match lines::split_pair(&String::from_utf8_lossy(&line)) {
                Some((keys::ORIGINAL_SIZE, _)) => {}
                Some((keys::STORE_SIZE, size)) => {
                    self.store_size = size.parse().unwrap_or_else(|_| {
                        warn!("Unparsable {} {:?}, treating as empty payload", keys::STORE_SIZE, size);
                        0
                    });
                }
                _ => {
                    self.inner_header.extend_from_slice(&line);
                    self.inner_header.push(b'\n');
                }
            }
        }
        Ok(Step::Continue)
    }

    fn read_http_header(&mut self) -> Result<Step> {
        if !lines::read_raw_line(&mut self.reader, &mut self.line)? {
            return Ok(Step::End);
        }
        let trimmed = lines::trim_bytes(&self.line);

        if trimmed.is_empty() {
            self.snapshot.extend_from_slice(&self.line);
            self.state = State::Payload;
        } else if self.is_boundary(trimmed) {
            self.lookahead_url = Some(trimmed.to_vec());
            self.state = State::Payload;
        } else {
            self.snapshot.extend_from_slice(&self.line);
            self.http_lines += 1;
        }
        Ok(Step::Continue)
    }

    fn read_payload(&mut self) -> Result<Step> {
        if self.store_size <= 0 || self.lookahead_url.is_some() {
            return self.finish().map(Step::Emit);
        }

        let mut raw = lines::read_up_to(&mut self.reader, self.store_size as u64)?;
        if raw.is_empty() {
            warn!("Stream truncated: {} payload bytes declared, none left", self.store_size);
            self.truncated = true;
            return Ok(Step::End);
        }
        if self.http_lines == 0 && lines::shift_legacy_crlf(&mut self.reader, &mut raw)? {
            debug!("Shifted legacy leading CRLF out of the payload");
        }

        match compression::decompress(&raw) {
            Ok(inflated) => self.snapshot.extend_from_slice(&inflated),
            Err(e) => {
                // Flat or damaged payloads are carried over as stored.
                trace!("Keeping payload as stored: {}", e);
                self.snapshot.extend_from_slice(&raw);
            }
        }
        self.finish().map(Step::Emit)
    }

    /// Encodes the open record in the offpage layout and resets.
    fn finish(&mut self) -> Result<Vec<u8>> {
        let url = self.url.take().unwrap_or_default();
        let snapshot = mem::take(&mut self.snapshot);
        let stored = compression::compress(&snapshot)?;

        let mut out = Vec::with_capacity(url.len() + self.inner_header.len() + stored.len() + 128);
        out.extend_from_slice(&url);
        out.push(b'\n');
        out.extend_from_slice(&self.inner_header);
        out.extend_from_slice(
            format!(
                "{}: {}, {};\n{}: {}, {};\n\n",
                keys::CONTENT_TYPE,
                SNAPSHOT,
                stored.len(),
                keys::ORIGINAL_SIZE,
                SNAPSHOT,
                snapshot.len()
            )
            .as_bytes(),
        );
        out.extend_from_slice(&stored);
        out.push(b'\n');

        self.inner_header.clear();
        self.has_inner_header = false;
        self.store_size = 0;
        self.http_lines = 0;
        self.url = self.lookahead_url.take();
        self.state = State::InnerHeader;
        trace!("Converted record of {} bytes", out.len());
        Ok(out)
    }
}

impl<R: BufRead, B: Boundary> Iterator for SpageToOffpageConverter<R, B> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.step() {
                Ok(Step::Continue) => {}
                Ok(Step::Emit(bytes)) => return Some(Ok(bytes)),
                Ok(Step::End) => {
                    self.state = State::Done;
                    return None;
                }
                Err(e) => {
                    self.state = State::Done;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<R: BufRead, B: Boundary> FusedIterator for SpageToOffpageConverter<R, B> {}
