//! Core data structures for spage and offpage records.
//!
//! This module defines the fundamental types used throughout the library:
//! - Records as written to and read from an archive
//! - Inner header values and the record `Type` enumeration
//! - Well-known inner header keys

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use indexmap::IndexMap;

use super::error::{Result, SpageError};
use crate::spage::codec::compression;

/// Human readable timestamp layout used for `Fetch-Time` style fields,
/// e.g. `Mon Jan 02 15:04:05 2006`.
pub const TIME_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Well-known inner header keys.
pub mod keys {
    pub const VERSION: &str = "Version";
    pub const TYPE: &str = "Type";
    pub const FETCH_TIME: &str = "Fetch-Time";
    pub const ORIGINAL_SIZE: &str = "Original-Size";
    pub const STORE_SIZE: &str = "Store-Size";
    pub const BATCH_ID: &str = "batchID";
    pub const ATTACH: &str = "attach";
    pub const IP_ADDRESS: &str = "IP-Address";
    pub const SPIDER_ADDRESS: &str = "Spider-Address";
    pub const DIGEST: &str = "Digest";
    pub const USER_AGENT: &str = "User-Agent";
    pub const FETCH_IP: &str = "Fetch-IP";
    pub const NODE_FETCH_TIME: &str = "Node-Fetch-Time";
    pub const ERROR_REASON: &str = "Error-Reason";

    /// Offpage header listing `name,size` segments of the payload.
    pub const CONTENT_TYPE: &str = "Content-Type";
}

/// A single inner header value.
///
/// Values read back from an archive are always [`Value::Text`]; the other
/// variants exist so callers and the record processor can supply typed values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(i64),
    Time(NaiveDateTime),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value. Text is parsed leniently (surrounding whitespace ignored).
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Time(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as i64)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(t: NaiveDateTime) -> Self {
        Value::Time(t)
    }
}

impl From<RecordType> for Value {
    fn from(t: RecordType) -> Self {
        Value::Text(t.as_str().to_owned())
    }
}

/// Ordered inner header mapping. Order only matters when encoding.
pub type InnerHeader = IndexMap<String, Value>;

/// Protocol (HTTP) header mapping.
pub type HttpHeader = IndexMap<String, String>;

/// How the payload bytes of a record must be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Flat,
    Deleted,
    Compressed,
}

impl RecordType {
    pub const ALL: [RecordType; 3] = [RecordType::Flat, RecordType::Deleted, RecordType::Compressed];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Flat => "flat",
            RecordType::Deleted => "deleted",
            RecordType::Compressed => "compressed",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = SpageError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "flat" => Ok(Self::Flat),
            "deleted" => Ok(Self::Deleted),
            "compressed" => Ok(Self::Compressed),
            _ => Err(SpageError::InvalidRecord(format!("Unknown record type: {:?}", s))),
        }
    }
}

/// One stored page entry in the primary (spage) layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub url: String,
    pub inner_header: InnerHeader,
    pub http_header: HttpHeader,
    /// `None` when the record carries no payload section at all.
    pub data: Option<Vec<u8>>,
}

impl Record {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Returns a text inner header value.
    pub fn inner_str(&self, key: &str) -> Option<&str> {
        self.inner_header.get(key).and_then(Value::as_str)
    }

    /// Parses the `Type` field, if present and recognised.
    pub fn record_type(&self) -> Option<RecordType> {
        self.inner_header
            .get(keys::TYPE)
            .map(ToString::to_string)
            .and_then(|s| s.parse().ok())
    }

    /// Declared `Store-Size`, or `None` when absent or not a number.
    pub fn store_size(&self) -> Option<i64> {
        self.inner_header.get(keys::STORE_SIZE).and_then(Value::as_number)
    }

    /// Declared `Original-Size`, or `None` when absent or not a number.
    pub fn original_size(&self) -> Option<i64> {
        self.inner_header.get(keys::ORIGINAL_SIZE).and_then(Value::as_number)
    }

    /// Returns the payload as the producer saw it.
    ///
    /// The decoder hands back stored bytes untouched; for `Type: compressed`
    /// records this inflates them, any other type is returned as stored.
    pub fn decompressed_data(&self) -> Result<Option<Vec<u8>>> {
        match (&self.data, self.record_type()) {
            (Some(data), Some(RecordType::Compressed)) => compression::decompress(data).map(Some),
            (data, _) => Ok(data.clone()),
        }
    }
}

/// A declared `name,size` pair from an offpage series header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub size: i64,
}

/// One stored page entry in the keyed-segment (offpage) layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffpageRecord {
    pub url: String,
    /// Raw header values, including the unparsed series headers.
    pub header: IndexMap<String, String>,
    /// Segments declared by `Content-Type`, in payload order.
    pub segments: Vec<Segment>,
    /// Pre-transform segment sizes declared by `Original-Size`, if any.
    pub original_sizes: Vec<Segment>,
    pub data: IndexMap<String, Vec<u8>>,
}

impl OffpageRecord {
    /// Parses a `name,size;name,size;` series. Entries without a comma are ignored.
    pub fn parse_series(series: &str) -> Vec<Segment> {
        series
            .split(';')
            .filter_map(|item| item.split_once(','))
            .map(|(name, size)| Segment {
                name: name.trim().to_owned(),
                // Unparsable sizes are treated like negative ones: no payload.
                size: size.trim().parse().unwrap_or(-1),
            })
            .collect()
    }
}
