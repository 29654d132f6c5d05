//! Specialization logic for the supported page layouts.

use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use super::error::{Result, SpageError};
use super::models::{OffpageRecord, Record};
use crate::spage::format::convert::SpageToOffpageConverter;
use crate::spage::format::offpage::OffpageDecoder;
use crate::spage::format::spage::SpageDecoder;

/// A trait that defines how one layout is read from a byte stream.
pub trait PageFormat {
    /// A short name used for debugging and logging.
    const DEBUG_NAME: &'static str;

    /// The item produced for each record.
    /// - `Record` for spage.
    /// - `OffpageRecord` for offpage.
    /// - `Vec<u8>` (an encoded offpage record) for spage → offpage conversion.
    type Page;

    /// The lazy decoder over a stream.
    type Decoder<R: BufRead>: Iterator<Item = Result<Self::Page>>;

    fn decoder<R: BufRead>(reader: R) -> Self::Decoder<R>;

    /// Wraps a page for callers that pick the layout at runtime.
    fn into_page(page: Self::Page) -> Page;
}

/// Zero-cost marker struct for the primary spage layout.
#[derive(Debug)]
pub struct Spage;

impl PageFormat for Spage {
    const DEBUG_NAME: &'static str = "spage";
    type Page = Record;
    type Decoder<R: BufRead> = SpageDecoder<R>;

    fn decoder<R: BufRead>(reader: R) -> Self::Decoder<R> {
        SpageDecoder::new(reader)
    }

    fn into_page(page: Self::Page) -> Page {
        Page::Spage(page)
    }
}

/// Zero-cost marker struct for the keyed-segment offpage layout.
#[derive(Debug)]
pub struct Offpage;

impl PageFormat for Offpage {
    const DEBUG_NAME: &'static str = "offpage";
    type Page = OffpageRecord;
    type Decoder<R: BufRead> = OffpageDecoder<R>;

    fn decoder<R: BufRead>(reader: R) -> Self::Decoder<R> {
        OffpageDecoder::new(reader)
    }

    fn into_page(page: Self::Page) -> Page {
        Page::Offpage(page)
    }
}

/// Zero-cost marker struct for reading spage and emitting offpage bytes.
#[derive(Debug)]
pub struct SpageToOffpage;

impl PageFormat for SpageToOffpage {
    const DEBUG_NAME: &'static str = "s2o";
    type Page = Vec<u8>;
    type Decoder<R: BufRead> = SpageToOffpageConverter<R>;

    fn decoder<R: BufRead>(reader: R) -> Self::Decoder<R> {
        SpageToOffpageConverter::new(reader)
    }

    fn into_page(page: Self::Page) -> Page {
        Page::Converted(page)
    }
}

/// A page from a reader whose layout was chosen at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Spage(Record),
    Offpage(OffpageRecord),
    Converted(Vec<u8>),
}

/// Runtime layout selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageType {
    #[default]
    Spage,
    Offpage,
    SpageToOffpage,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Spage => Spage::DEBUG_NAME,
            PageType::Offpage => Offpage::DEBUG_NAME,
            PageType::SpageToOffpage => SpageToOffpage::DEBUG_NAME,
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageType {
    type Err = SpageError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spage" => Ok(Self::Spage),
            "offpage" => Ok(Self::Offpage),
            "s2o" => Ok(Self::SpageToOffpage),
            _ => Err(SpageError::UnsupportedPageType(s.to_owned())),
        }
    }
}
