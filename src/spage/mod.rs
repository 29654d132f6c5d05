//! Core spage module
//!
//! Entry points:
//! - [`open_file`] opens a rotating archive for reading or writing.
//! - [`read`] and [`write`] work on caller-owned streams without rotation.

pub mod codec;
pub mod format;
pub mod reader;
pub mod schema;
pub mod storage;
pub mod types;
pub mod writer;

use std::io::{BufRead, Write};
use std::path::Path;

pub use format::writer::RecordWriter;
pub use reader::{AnyPageReader, PageReader};
pub use storage::RollSize;
pub use types::error::{Result, SpageError};
pub use types::formats::{Offpage, Page, PageFormat, PageType, Spage, SpageToOffpage};
pub use writer::{SpageWriter, WriterOptions};

use types::models::{HttpHeader, InnerHeader};

/// How [`open_file`] should open an archive.
#[derive(Debug, Clone)]
pub enum Mode {
    Read(PageType),
    Write(WriterOptions),
}

/// An opened archive.
pub enum Handle {
    Reader(AnyPageReader),
    Writer(SpageWriter),
}

/// Opens the rotating archive `base` for reading or writing.
pub fn open_file(base: impl AsRef<Path>, mode: Mode) -> Result<Handle> {
    match mode {
        Mode::Read(page_type) => AnyPageReader::open(base, page_type).map(Handle::Reader),
        Mode::Write(options) => SpageWriter::open(base, options).map(Handle::Writer),
    }
}

/// Lazily decodes pages of the given layout from a caller-owned stream.
pub fn read<'a, R: BufRead + 'a>(
    stream: R,
    page_type: PageType,
) -> Box<dyn Iterator<Item = Result<Page>> + 'a> {
    reader::decode_pages(stream, page_type)
}

/// Statically typed variant of [`read`].
pub fn decode<T: PageFormat, R: BufRead>(stream: R) -> T::Decoder<R> {
    T::decoder(stream)
}

/// Writes one spage record into a caller-owned stream using the stock
/// schema with compression enabled. Returns the number of bytes written.
pub fn write<W: Write + ?Sized>(
    out: &mut W,
    url: &str,
    inner_header: Option<&InnerHeader>,
    http_header: Option<&HttpHeader>,
    data: Option<&[u8]>,
) -> Result<usize> {
    RecordWriter::default().write(out, url, inner_header, http_header, data)
}
