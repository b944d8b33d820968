//! Specflow Parser
//!
//! Turns free-form or semi-structured documents into ordered
//! [`Requirement`](specflow_artifact::Requirement) records.
//!
//! # Rules
//!
//! The deterministic parser ([`DocumentParser`]) tries, in order:
//!
//! 1. blocks separated by `---` lines
//! 2. list items under requirement category headings or labels
//! 3. the whole text as one requirement
//!
//! Explicit leading codes (`REQ-1`, `FR-12`, `[NFR-3]`) become ids; other
//! requirements are numbered `REQ-<n>` by position.
//!
//! [`PreprocessingParser`] normalizes text through the gateway first and
//! keeps whichever parse finds more on long inputs.
//!
//! # Example
//!
//! ```rust
//! use specflow_parser::parse_structured_document;
//!
//! let reqs = parse_structured_document("A1\n---\nA2\n---\nA3").unwrap();
//! assert_eq!(reqs.len(), 3);
//! assert_eq!(reqs[0].id, "REQ-1");
//! ```

#![warn(unreachable_pub)]

mod blocks;
pub mod document;
pub mod error;
mod ident;
pub mod preprocess;
mod sections;

pub use document::{parse_structured_document, DocumentParser, ParseRule, ParsedDocument};
pub use error::ParseError;
pub use preprocess::{
    parse_structured_document_with_preprocessing, GatewayNormalizer, Normalizer, ParseSource,
    PreprocessOutcome, PreprocessingParser, DEFAULT_THRESHOLD_CHARS,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
