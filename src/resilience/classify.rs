//! Load failure classification.
//!
//! The host module system reports a stale deployment chunk only through the
//! wording of its error message, so matching is substring based. The wording
//! lives in [`CHUNK_FETCH_PATTERNS`] and nowhere else.

use std::fmt;

/// Messages the host emits when a previously built chunk can no longer be fetched.
pub const CHUNK_FETCH_PATTERNS: [&str; 2] = [
    "Failed to fetch dynamically imported module",
    "Importing a module script failed",
];

/// Outcome of classifying a loader failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The chunk URL is gone, most likely after a redeploy. Recoverable by reload.
    ChunkFetch,
    /// Anything else. Escalated as is.
    Other,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::ChunkFetch => "chunk_fetch",
            FailureClass::Other => "other",
        }
    }
}

/// Substring matcher over error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureClassifier {
    patterns: Vec<String>,
}

impl FailureClassifier {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// First configured pattern found in the error message.
    pub fn matching_pattern<E: fmt::Display + ?Sized>(&self, err: &E) -> Option<&str> {
        let message = err.to_string();
        self.patterns
            .iter()
            .find(|p| message.contains(p.as_str()))
            .map(String::as_str)
    }

    pub fn classify<E: fmt::Display + ?Sized>(&self, err: &E) -> FailureClass {
        match self.matching_pattern(err) {
            Some(_) => FailureClass::ChunkFetch,
            None => FailureClass::Other,
        }
    }

    pub fn is_retryable<E: fmt::Display + ?Sized>(&self, err: &E) -> bool {
        self.classify(err) == FailureClass::ChunkFetch
    }
}

impl Default for FailureClassifier {
    fn default() -> Self {
        Self::new(CHUNK_FETCH_PATTERNS)
    }
}

/// Whether `err` is a chunk-fetch failure under the default patterns.
pub fn is_retryable_load_failure<E: fmt::Display + ?Sized>(err: &E) -> bool {
    let message = err.to_string();
    CHUNK_FETCH_PATTERNS.iter().any(|p| message.contains(*p))
}
