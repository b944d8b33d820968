//! Error types for requirement extraction

/// Requirement extraction failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Input had content but nothing could be turned into a requirement
    #[error("no requirements could be extracted from {chars} characters of input")]
    NoRequirements {
        /// Input length in characters
        chars: usize,
    },
}
