//! Record normalization before encoding.
//!
//! The processor computes `Original-Size` / `Store-Size`, applies the
//! compression policy, enforces the `Type` invariants and finally hands the
//! record to the [`Validator`]. Nothing is encoded unless this succeeds.

use std::sync::Arc;

use log::trace;

use crate::spage::codec::compression;
use crate::spage::schema::validator::Validator;
use crate::spage::types::error::{Result, SpageError};
use crate::spage::types::models::{Record, RecordType, Value, keys};

/// Turns a caller supplied record into one that is ready to encode.
pub trait RecordProcessor {
    fn process(&self, record: Record) -> Result<Record>;
}

/// Processor for the primary spage layout.
#[derive(Debug, Clone)]
pub struct SpageProcessor {
    validator: Arc<Validator>,
    compress: bool,
}

impl SpageProcessor {
    pub fn new(validator: Arc<Validator>, compress: bool) -> Self {
        Self { validator, compress }
    }
}

impl RecordProcessor for SpageProcessor {
    fn process(&self, mut record: Record) -> Result<Record> {
        let header = &mut record.inner_header;

        match record.data.take() {
            Some(data) => {
                let original_size = data.len();
                let explicit_type = header.get(keys::TYPE).map(ToString::to_string);

                let stored = match explicit_type.as_deref() {
                    None => {
                        if header.contains_key(keys::ORIGINAL_SIZE) {
                            return Err(SpageError::InvalidRecord(format!(
                                "do not specify {} without {}",
                                keys::ORIGINAL_SIZE,
                                keys::TYPE
                            )));
                        }
                        header.insert(keys::ORIGINAL_SIZE.to_owned(), Value::from(original_size));
                        if self.compress {
                            header.insert(keys::TYPE.to_owned(), RecordType::Compressed.into());
                            compression::compress(&data)?
                        } else {
                            header.insert(keys::TYPE.to_owned(), RecordType::Flat.into());
                            data
                        }
                    }
                    Some("compressed") | Some("deleted") => {
                        if !header.contains_key(keys::ORIGINAL_SIZE) {
                            return Err(SpageError::InvalidRecord(format!(
                                "inner header requires {} for an explicit {}",
                                keys::ORIGINAL_SIZE,
                                keys::TYPE
                            )));
                        }
                        data
                    }
                    Some("flat") => {
                        header.insert(keys::ORIGINAL_SIZE.to_owned(), Value::from(original_size));
                        data
                    }
                    // Unknown types are left for the validator to reject.
                    Some(_) => data,
                };

                header.insert(keys::STORE_SIZE.to_owned(), Value::from(stored.len()));
                trace!("Payload of {}: {} bytes stored as {} bytes", record.url, original_size, stored.len());
                record.data = Some(stored);
            }
            None => {
                if !header.contains_key(keys::TYPE) {
                    header.insert(keys::TYPE.to_owned(), RecordType::Flat.into());
                }
                header.shift_remove(keys::ORIGINAL_SIZE);
                header.shift_remove(keys::STORE_SIZE);
            }
        }

        self.validator.validate(&mut record)?;
        Ok(record)
    }
}
