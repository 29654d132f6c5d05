//! Codec layer shared by every page layout.
//!
//! # Submodules
//!
//! - [`compression`][]: Zlib payload compression and decompression
//! - [`boundary`][]: Record boundary recognition
//! - [`lines`][]: Line oriented reading on top of a buffered byte stream

pub mod boundary;
pub mod compression;
pub mod lines;
