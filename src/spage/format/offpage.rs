//! Keyed-segment (offpage) layout decoder.
//!
//! An offpage record has a single header block. Its `Content-Type` header
//! lists `name,size` pairs, and the payload that follows the blank line is
//! the concatenation of those segments in declared order:
//!
//! ```text
//! http://example.com/
//! Key1: Value1
//! Content-Type: A,10;B,11;C,12;
//!
//! <10 bytes of A><11 bytes of B><12 bytes of C>
//! ```

use std::io::BufRead;
use std::iter::FusedIterator;
use std::mem;

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::spage::codec::boundary::{Boundary, UrlBoundary};
use crate::spage::codec::lines::{self, Line, MAX_LINE_LENGTH};
use crate::spage::types::error::Result;
use crate::spage::types::models::{OffpageRecord, Segment, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Header,
    Payload,
    Done,
}

enum Step {
    Continue,
    Emit(OffpageRecord),
    End,
}

/// Lazily decodes offpage records from a buffered byte stream.
pub struct OffpageDecoder<R, B = UrlBoundary> {
    reader: R,
    boundary: B,
    state: State,
    url: Option<String>,
    header: IndexMap<String, String>,
    segments: Vec<Segment>,
    original_sizes: Vec<Segment>,
    lookahead_url: Option<String>,
    truncated: bool,
    line: Vec<u8>,
}

impl<R: BufRead> OffpageDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_boundary(reader, UrlBoundary)
    }
}

impl<R: BufRead, B: Boundary> OffpageDecoder<R, B> {
    pub fn with_boundary(reader: R, boundary: B) -> Self {
        Self {
            reader,
            boundary,
            state: State::Header,
            url: None,
            header: IndexMap::new(),
            segments: Vec::new(),
            original_sizes: Vec::new(),
            lookahead_url: None,
            truncated: false,
            line: Vec::new(),
        }
    }

    /// True if the sequence ended on a segment whose declared bytes were missing.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    fn step(&mut self) -> Result<Step> {
        match self.state {
            State::Header => self.read_header(),
            State::Payload => self.read_payload(),
            State::Done => Ok(Step::End),
        }
    }

    fn read_header(&mut self) -> Result<Step> {
        let line = match lines::read_text_line(&mut self.reader, &mut self.line)? {
            Line::Eof => return Ok(Step::End),
            Line::Undecodable => return Ok(Step::Continue),
            Line::Text(line) => line,
        };

        if line.is_empty() {
            if !self.header.is_empty() && self.url.is_some() {
                self.state = State::Payload;
            }
        } else if line.chars().count() > MAX_LINE_LENGTH {
            debug!("Ignoring {} byte line in offpage header", line.len());
        } else if self.boundary.is_boundary(&line) {
            if self.url.is_some() && !self.header.is_empty() {
                debug!("New record {} starts before {:?} finished", line, self.url);
                self.lookahead_url = Some(line);
                self.state = State::Payload;
            } else {
                self.clear_header();
                self.url = Some(line);
            }
        } else if let Some((key, value)) = lines::split_pair(&line) {
            match key {
                keys::CONTENT_TYPE => self.segments = OffpageRecord::parse_series(value),
                keys::ORIGINAL_SIZE => self.original_sizes = OffpageRecord::parse_series(value),
                _ => {}
            }
            self.header.insert(key.to_owned(), value.to_owned());
        }
        Ok(Step::Continue)
    }

    fn read_payload(&mut self) -> Result<Step> {
        let segments = mem::take(&mut self.segments);
        let data = if self.lookahead_url.is_some() {
            IndexMap::new()
        } else {
            match self.read_segments(&segments)? {
                Some(data) => data,
                None => return Ok(Step::End),
            }
        };
        self.segments = segments;
        Ok(Step::Emit(self.finish(data)))
    }

    /// Slices the payload per declared segment. `None` if the stream ran dry.
    fn read_segments(&mut self, segments: &[Segment]) -> Result<Option<IndexMap<String, Vec<u8>>>> {
        let mut data = IndexMap::new();
        for Segment { name, size } in segments {
            // A negative size means the payload was not stored at all.
            if *size < 0 {
                return Ok(Some(IndexMap::new()));
            }
            let bytes = lines::read_up_to(&mut self.reader, *size as u64)?;
            if *size > 0 && bytes.is_empty() {
                warn!("Stream truncated: segment {} of {:?} declares {} bytes, none left", name, self.url, size);
                self.truncated = true;
                return Ok(None);
            }
            data.insert(name.clone(), bytes);
        }
        Ok(Some(data))
    }

    fn clear_header(&mut self) {
        self.header.clear();
        self.segments.clear();
        self.original_sizes.clear();
    }

    fn finish(&mut self, data: IndexMap<String, Vec<u8>>) -> OffpageRecord {
        let record = OffpageRecord {
            url: self.url.take().unwrap_or_default(),
            header: mem::take(&mut self.header),
            segments: mem::take(&mut self.segments),
            original_sizes: mem::take(&mut self.original_sizes),
            data,
        };
        self.url = self.lookahead_url.take();
        self.state = State::Header;
        trace!("Decoded offpage record {} with {} segments", record.url, record.data.len());
        record
    }
}

impl<R: BufRead, B: Boundary> Iterator for OffpageDecoder<R, B> {
    type Item = Result<OffpageRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.step() {
                Ok(Step::Continue) => {}
                Ok(Step::Emit(record)) => return Some(Ok(record)),
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

impl<R: BufRead, B: Boundary> FusedIterator for OffpageDecoder<R, B> {}
