//! Record boundary recognition.
//!
//! The spage layout has no end-of-record marker. A record ends when the line
//! that starts the next one is seen, so the decoders ask a [`Boundary`]
//! whether each trimmed line opens a new record.

/// Decides whether a trimmed line starts a new record.
pub trait Boundary {
    fn is_boundary(&self, line: &str) -> bool;
}

/// The stock heuristic: a line longer than 10 characters starting with
/// `http://` or `https://`.
///
/// Payload bytes are assumed never to look like this at a line start.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlBoundary;

impl Boundary for UrlBoundary {
    fn is_boundary(&self, line: &str) -> bool {
        is_url(line)
    }
}

impl<F: Fn(&str) -> bool> Boundary for F {
    fn is_boundary(&self, line: &str) -> bool {
        self(line)
    }
}

/// The URL recognition predicate, also used as the `url` schema format.
pub fn is_url(line: &str) -> bool {
    line.chars().count() > 10 && (line.starts_with("http://") || line.starts_with("https://"))
}
