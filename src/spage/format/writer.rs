//! Processor + encoder pipeline writing records into any byte sink.

use std::io::Write;
use std::sync::Arc;

use log::trace;

use super::encoder::{RecordEncoder, SpageEncoder};
use super::processor::{RecordProcessor, SpageProcessor};
use crate::spage::schema::validator::Validator;
use crate::spage::types::error::Result;
use crate::spage::types::models::{HttpHeader, InnerHeader, Record};

/// Binds a [`RecordProcessor`] to a [`RecordEncoder`].
///
/// Records are processed (and validated) in full before any byte reaches
/// the sink, so a rejected record is never partially written.
#[derive(Debug, Clone)]
pub struct RecordWriter<P = SpageProcessor, E = SpageEncoder> {
    processor: P,
    encoder: E,
}

impl RecordWriter {
    /// Builds the stock spage pipeline. The encoder writes inner header keys
    /// in the validator's schema order.
    pub fn new(validator: Arc<Validator>, compress: bool) -> Self {
        let encoder = SpageEncoder::with_allowed_keys(validator.schema().keys());
        let processor = SpageProcessor::new(validator, compress);
        Self { processor, encoder }
    }
}

impl Default for RecordWriter {
    fn default() -> Self {
        Self::new(Arc::new(Validator::default()), true)
    }
}

impl<P: RecordProcessor, E: RecordEncoder> RecordWriter<P, E> {
    pub fn with_parts(processor: P, encoder: E) -> Self {
        Self { processor, encoder }
    }

    /// Processes and encodes one record without writing it anywhere.
    pub fn encode(
        &self,
        url: &str,
        inner_header: Option<&InnerHeader>,
        http_header: Option<&HttpHeader>,
        data: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        let record = Record {
            url: url.to_owned(),
            inner_header: inner_header.cloned().unwrap_or_default(),
            http_header: http_header.cloned().unwrap_or_default(),
            data: data.map(<[u8]>::to_vec),
        };
        let record = self.processor.process(record)?;
        Ok(self.encoder.encode(&record))
    }

    /// Writes one record to `out`, returning the number of bytes written.
    pub fn write<W: Write + ?Sized>(
        &self,
        out: &mut W,
        url: &str,
        inner_header: Option<&InnerHeader>,
        http_header: Option<&HttpHeader>,
        data: Option<&[u8]>,
    ) -> Result<usize> {
        let bytes = self.encode(url, inner_header, http_header, data)?;
        out.write_all(&bytes)?;
        trace!("Wrote record {} ({} bytes)", url, bytes.len());
        Ok(bytes.len())
    }
}
