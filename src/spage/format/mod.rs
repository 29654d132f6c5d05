//! Wire layout layer.
//!
//! - [`spage`]: Primary layout decoder
//! - [`offpage`]: Keyed-segment layout decoder
//! - [`convert`]: spage → offpage converter
//! - [`processor`], [`encoder`], [`writer`]: The write pipeline
//!
//! ```text
//! caller -> RecordWriter -> RecordProcessor -> Validator -> RecordEncoder -> bytes
//! bytes  -> SpageDecoder / OffpageDecoder / SpageToOffpageConverter -> caller
//! ```

pub mod convert;
pub mod encoder;
pub mod offpage;
pub mod processor;
pub mod spage;
pub mod writer;
