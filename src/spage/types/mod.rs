//! Foundational data structures, error types, and layout definitions.

pub mod error;
pub mod formats;
pub mod models;
