//! # Primary (spage) layout decoder
//!
//! The layout mixes text lines with raw payload bytes and never marks the end
//! of a record. The decoder is a small state machine:
//!
//! ```text
//! InnerHeader --blank line--> HttpHeader --blank line--> Payload --emit--> InnerHeader
//!      |                          |
//!      +--boundary line-----------+--boundary line (held as lookahead)--> Payload
//! ```
//!
//! A boundary line seen while a record is still open belongs to the *next*
//! record. It is held as a lookahead URL, the open record is emitted without
//! a payload, and the held URL seeds the following record.
//!
//! Payload bytes are returned exactly as stored; inflating `compressed`
//! records is left to the caller (see [`Record::decompressed_data`]).

use std::io::BufRead;
use std::iter::FusedIterator;
use std::mem;

use log::{debug, trace, warn};

use crate::spage::codec::boundary::{Boundary, UrlBoundary};
use crate::spage::codec::lines::{self, Line, MAX_LINE_LENGTH};
use crate::spage::types::error::Result;
use crate::spage::types::models::{HttpHeader, InnerHeader, Record, Value, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InnerHeader,
    HttpHeader,
    Payload,
    Done,
}

enum Step {
    Continue,
    Emit(Record),
    End,
}

/// Lazily decodes spage records from a buffered byte stream.
///
/// The decoder consumes its stream and cannot be restarted. End of stream
/// ends the sequence without emitting the unfinished record; an I/O error is
/// yielded once and also ends it.
pub struct SpageDecoder<R, B = UrlBoundary> {
    reader: R,
    boundary: B,
    state: State,
    url: Option<String>,
    inner_header: InnerHeader,
    http_header: HttpHeader,
    lookahead_url: Option<String>,
    truncated: bool,
    line: Vec<u8>,
}

impl<R: BufRead> SpageDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_boundary(reader, UrlBoundary)
    }
}

impl<R: BufRead, B: Boundary> SpageDecoder<R, B> {
    /// Creates a decoder with a custom record boundary predicate.
    pub fn with_boundary(reader: R, boundary: B) -> Self {
        Self {
            reader,
            boundary,
            state: State::InnerHeader,
            url: None,
            inner_header: InnerHeader::new(),
            http_header: HttpHeader::new(),
            lookahead_url: None,
            truncated: false,
            line: Vec::new(),
        }
    }

    /// True if the sequence ended because a record with a positive
    /// `Store-Size` found no payload bytes left in the stream.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn step(&mut self) -> Result<Step> {
        match self.state {
            State::InnerHeader => self.read_inner_header(),
            State::HttpHeader => self.read_http_header(),
            State::Payload => self.read_payload(),
            State::Done => Ok(Step::End),
        }
    }

    fn read_inner_header(&mut self) -> Result<Step> {
        let line = match lines::read_text_line(&mut self.reader, &mut self.line)? {
            Line::Eof => {
                if self.url.is_some() {
                    debug!("End of stream inside the inner header of {:?}", self.url);
                }
                return Ok(Step::End);
            }
            Line::Undecodable => return Ok(Step::Continue),
            Line::Text(line) => line,
        };

        if line.is_empty() {
            if !self.inner_header.is_empty() && self.url.is_some() {
                self.state = State::HttpHeader;
            }
        } else if line.chars().count() > MAX_LINE_LENGTH {
            debug!("Ignoring {} byte line in inner header", line.len());
        } else if self.boundary.is_boundary(&line) {
            if self.url.is_some() && !self.inner_header.is_empty() {
                debug!("New record {} starts before {:?} finished", line, self.url);
                self.lookahead_url = Some(line);
                self.state = State::Payload;
            } else {
                if !self.inner_header.is_empty() {
                    debug!("Dropping {} inner header fields with no url", self.inner_header.len());
                }
                self.inner_header.clear();
                self.url = Some(line);
            }
        } else if let Some((key, value)) = lines::split_pair(&line) {
            self.inner_header.insert(key.to_owned(), Value::Text(value.to_owned()));
        }
        Ok(Step::Continue)
    }

    fn read_http_header(&mut self) -> Result<Step> {
        let line = match lines::read_text_line(&mut self.reader, &mut self.line)? {
            Line::Eof => {
                debug!("End of stream inside the http header of {:?}", self.url);
                return Ok(Step::End);
            }
            Line::Undecodable => return Ok(Step::Continue),
            Line::Text(line) => line,
        };

        if line.is_empty() {
            self.state = State::Payload;
        } else if self.boundary.is_boundary(&line) {
            self.lookahead_url = Some(line);
            self.state = State::Payload;
        } else if let Some((key, value)) = lines::split_pair(&line) {
            self.http_header.insert(key.to_owned(), value.to_owned());
        }
        Ok(Step::Continue)
    }

    fn read_payload(&mut self) -> Result<Step> {
        let size = match self.inner_header.get(keys::STORE_SIZE) {
            None => -1,
            Some(value) => value.as_number().unwrap_or_else(|| {
                warn!("Unparsable {} {:?} for {:?}, treating as absent", keys::STORE_SIZE, value, self.url);
                -1
            }),
        };
        if size < 0 || self.lookahead_url.is_some() {
            return Ok(Step::Emit(self.finish(None)));
        }

        let mut data = lines::read_up_to(&mut self.reader, size as u64)?;
        if size > 0 && data.is_empty() {
            warn!("Stream truncated: {:?} declares {} payload bytes, none left", self.url, size);
            self.truncated = true;
            return Ok(Step::End);
        }

        if self.http_header.is_empty() && lines::shift_legacy_crlf(&mut self.reader, &mut data)? {
            debug!("Shifted legacy leading CRLF out of the payload of {:?}", self.url);
        }
        Ok(Step::Emit(self.finish(Some(data))))
    }

    /// Completes the open record and resets for the next one.
    fn finish(&mut self, data: Option<Vec<u8>>) -> Record {
        let record = Record {
            url: self.url.take().unwrap_or_default(),
            inner_header: mem::take(&mut self.inner_header),
            http_header: mem::take(&mut self.http_header),
            data,
        };
        self.url = self.lookahead_url.take();
        self.state = State::InnerHeader;
        trace!("Decoded record {}", record.url);
        record
    }
}

impl<R: BufRead, B: Boundary> Iterator for SpageDecoder<R, B> {
    type Item = Result<Record>;

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

impl<R: BufRead, B: Boundary> FusedIterator for SpageDecoder<R, B> {}
