//! File-backed writer appending spage records to a rotating archive.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use super::format::writer::RecordWriter;
use super::schema::validator::Validator;
use super::storage::{RollSize, RotatingWriter};
use super::types::error::Result;
use super::types::models::{HttpHeader, InnerHeader};

/// Options for opening an archive for writing.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Size after which a new file is started. Defaults to `1G`.
    pub roll_size: RollSize,
    /// Store untyped payloads zlib compressed. Defaults to `true`.
    pub compress: bool,
    /// Validator to check records with. Defaults to the stock schema.
    pub validator: Option<Arc<Validator>>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            roll_size: RollSize::default(),
            compress: true,
            validator: None,
        }
    }
}

/// Writes spage records to a rotating archive.
#[derive(Debug)]
pub struct SpageWriter {
    path: PathBuf,
    out: RotatingWriter,
    record_writer: RecordWriter,
}

impl SpageWriter {
    /// Opens (or continues) the archive whose files are named `<base>.0`, `<base>.1`, ...
    pub fn open(base: impl AsRef<Path>, options: WriterOptions) -> Result<Self> {
        let path = base.as_ref().to_path_buf();
        let validator = options.validator.unwrap_or_default();
        info!(
            "Opening spage archive for writing: {} (roll size {}, compress {})",
            path.display(),
            options.roll_size,
            options.compress
        );
        Ok(Self {
            out: RotatingWriter::open(&path, options.roll_size)?,
            record_writer: RecordWriter::new(validator, options.compress),
            path,
        })
    }

    /// Validates, encodes and appends one record.
    ///
    /// # Errors
    /// Fails without writing anything if the record is rejected by the
    /// processor or the validator.
    pub fn write(
        &mut self,
        url: &str,
        inner_header: Option<&InnerHeader>,
        http_header: Option<&HttpHeader>,
        data: Option<&[u8]>,
        flush: bool,
    ) -> Result<()> {
        self.record_writer
            .write(&mut self.out, url, inner_header, http_header, data)?;
        if flush {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        debug!("Flushed {}", self.path.display());
        Ok(())
    }

    pub fn close(self) -> Result<()> {
        self.out.close()
    }
}
