//! # spage
//!
//! A reader and writer for spage archives: append-only logs of crawled web
//! pages where each record holds a URL, inner (crawler) metadata, optional
//! HTTP headers and an optional payload.
//!
//! Also reads the keyed-segment offpage layout and converts spage archives
//! into it.
pub mod spage;

// Re-export the main types for convenience
pub use spage::{
    AnyPageReader, Handle, Mode, Offpage, Page, PageReader, PageType, RecordWriter, RollSize,
    Spage, SpageError, SpageToOffpage, SpageWriter, WriterOptions, open_file, read, write,
    codec::boundary::{Boundary, UrlBoundary},
    format::{convert::SpageToOffpageConverter, offpage::OffpageDecoder, spage::SpageDecoder},
    schema::{Schema, validator::Validator},
    types::models::{
        HttpHeader, InnerHeader, OffpageRecord, Record, RecordType, Segment, Value, keys,
    },
};
