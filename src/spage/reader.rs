//! File-backed readers over rotating archives.
//!
//! [`PageReader`] fixes the layout at compile time; [`AnyPageReader`] picks
//! it from a [`PageType`] at runtime.

use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use log::info;

use super::storage::RotatingReader;
use super::types::error::Result;
use super::types::formats::{Offpage, Page, PageFormat, PageType, Spage, SpageToOffpage};

/// Reader over a rotating archive in the layout `T`.
///
/// The sequence returned by [`read`](Self::read) consumes the archive; it
/// cannot be restarted, and a second call resumes where the first stopped.
pub struct PageReader<T: PageFormat> {
    path: PathBuf,
    decoder: T::Decoder<BufReader<RotatingReader>>,
    _format: PhantomData<T>,
}

impl<T: PageFormat> PageReader<T> {
    /// Opens the archive whose files are named `<base>.0`, `<base>.1`, ...
    ///
    /// # Errors
    /// Returns an error if the first file cannot be opened.
    pub fn open(base: impl AsRef<Path>) -> Result<Self> {
        let path = base.as_ref().to_path_buf();
        info!("Opening {} archive: {}", T::DEBUG_NAME, path.display());
        let stream = BufReader::new(RotatingReader::open(&path)?);
        Ok(Self {
            path,
            decoder: T::decoder(stream),
            _format: PhantomData,
        })
    }

    /// Returns the lazy sequence of pages.
    pub fn read(&mut self) -> impl Iterator<Item = Result<T::Page>> + '_ {
        self.decoder.by_ref()
    }

    /// Gives access to the underlying decoder, e.g. to query truncation.
    pub fn decoder(&self) -> &T::Decoder<BufReader<RotatingReader>> {
        &self.decoder
    }

    pub fn close(self) {
        info!("Closed {} archive: {}", T::DEBUG_NAME, self.path.display());
    }
}

/// Reader whose layout is picked at runtime.
pub struct AnyPageReader {
    path: PathBuf,
    page_type: PageType,
    pages: Box<dyn Iterator<Item = Result<Page>>>,
}

impl AnyPageReader {
    pub fn open(base: impl AsRef<Path>, page_type: PageType) -> Result<Self> {
        let stream = BufReader::new(RotatingReader::open(base.as_ref())?);
        info!("Opening {} archive: {}", page_type, base.as_ref().display());
        Ok(Self {
            path: base.as_ref().to_path_buf(),
            page_type,
            pages: decode_pages(stream, page_type),
        })
    }

    pub fn page_type(&self) -> PageType {
        self.page_type
    }

    /// Returns the lazy sequence of pages.
    pub fn read(&mut self) -> impl Iterator<Item = Result<Page>> + '_ {
        self.pages.by_ref()
    }

    pub fn close(self) {
        info!("Closed {} archive: {}", self.page_type, self.path.display());
    }
}

/// Decodes `stream` in the layout chosen by `page_type`.
pub fn decode_pages<'a, R: BufRead + 'a>(
    stream: R,
    page_type: PageType,
) -> Box<dyn Iterator<Item = Result<Page>> + 'a> {
    fn boxed<'a, T: PageFormat + 'a, R: BufRead + 'a>(stream: R) -> Box<dyn Iterator<Item = Result<Page>> + 'a>
    where
        T::Decoder<R>: 'a,
    {
        Box::new(T::decoder(stream).map(|page| page.map(T::into_page)))
    }

    match page_type {
        PageType::Spage => boxed::<Spage, R>(stream),
        PageType::Offpage => boxed::<Offpage, R>(stream),
        PageType::SpageToOffpage => boxed::<SpageToOffpage, R>(stream),
    }
}
