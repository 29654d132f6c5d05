//! Serialization of processed records into the spage byte layout.
//!
//! # Layout
//! ```text
//! <url>\n
//! <key>: <value>\n            (inner header, in allowed-key order)
//! \n
//! <http-key>: <value>\r\n     (CRLF joined)
//! \r\n                        (bare \r\n alone when there are no http headers)
//! <payload>\r\n               (only when data is present)
//! ```

use crate::spage::types::models::{HttpHeader, InnerHeader, Record, keys};

/// Keys computed by the record processor. The decoder needs them to find
/// and interpret the payload, so they are written even when an allowed-key
/// ordering leaves them out.
const CODEC_KEYS: [&str; 3] = [keys::TYPE, keys::ORIGINAL_SIZE, keys::STORE_SIZE];

/// Serializes a record into its on-wire bytes.
pub trait RecordEncoder {
    fn encode(&self, record: &Record) -> Vec<u8>;
}

/// Encoder for the primary spage layout.
#[derive(Debug, Clone, Default)]
pub struct SpageEncoder {
    allowed_keys: Option<Vec<String>>,
}

impl SpageEncoder {
    /// Encodes inner header keys in the record's own order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes only `allowed`, in that order. Other inner header keys are
    /// dropped, except `Type`, `Original-Size` and `Store-Size`, which follow
    /// the allowed keys when missing from them.
    pub fn with_allowed_keys(mut allowed: Vec<String>) -> Self {
        for key in CODEC_KEYS {
            if !allowed.iter().any(|k| k == key) {
                allowed.push(key.to_owned());
            }
        }
        Self {
            allowed_keys: Some(allowed),
        }
    }

    fn inner_header_block(&self, header: &InnerHeader) -> String {
        let line = |key: &str| {
            header
                .get(key)
                .map(|value| format!("{}: {}", key.trim(), value.to_string().trim()))
        };
        let lines: Vec<String> = match &self.allowed_keys {
            Some(keys) => keys.iter().filter_map(|k| line(k.as_str())).collect(),
            None => header.keys().filter_map(|k| line(k.as_str())).collect(),
        };
        lines.join("\n")
    }

    fn http_header_block(header: &HttpHeader) -> Option<String> {
        if header.is_empty() {
            return None;
        }
        let lines: Vec<String> = header
            .iter()
            .map(|(k, v)| format!("{}: {}", k.trim(), v.trim()))
            .collect();
        Some(lines.join("\r\n"))
    }
}

impl RecordEncoder for SpageEncoder {
    fn encode(&self, record: &Record) -> Vec<u8> {
        let data_len = record.data.as_ref().map_or(0, Vec::len);
        let mut out = Vec::with_capacity(record.url.len() + 512 + data_len);

        out.extend_from_slice(record.url.as_bytes());
        out.push(b'\n');

        out.extend_from_slice(self.inner_header_block(&record.inner_header).as_bytes());
        out.extend_from_slice(b"\n\n");

        match Self::http_header_block(&record.http_header) {
            Some(block) => {
                out.extend_from_slice(block.as_bytes());
                out.extend_from_slice(b"\r\n\r\n");
            }
            None => out.extend_from_slice(b"\r\n"),
        }

        if let Some(data) = &record.data {
            out.extend_from_slice(data);
            out.extend_from_slice(b"\r\n");
        }
        out
    }
}
