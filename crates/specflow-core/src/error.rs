//! Error types for specflow core
//!
//! Every failure surfaced by the facade is a [`CoreError`]; callers that
//! only care about the broad category use [`CoreError::kind`].

use specflow_artifact::VersionError;
use specflow_gateway::{GatewayError, TemplateError};
use specflow_kernel::{ExecutionError, GraphError, RunError};
use specflow_parser::ParseError;

/// Main specflow error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Document could not be parsed
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    /// Gateway call failed outside a stage
    #[error("gateway failed: {0}")]
    Gateway(#[from] GatewayError),

    /// Pipeline stage failed
    #[error("pipeline failed: {0}")]
    Execution(#[from] ExecutionError),

    /// Grading item failed
    #[error("grading failed on {requirement}: {source}")]
    Grading {
        /// Requirement being processed
        requirement: String,
        /// Gateway failure
        #[source]
        source: GatewayError,
    },

    /// A run is already active
    #[error("state conflict: {0}")]
    Run(#[from] RunError),

    /// Version history operation refused
    #[error("state conflict: {0}")]
    Version(#[from] VersionError),

    /// Stage graph rejected
    #[error("invalid stage graph: {0}")]
    Graph(#[from] GraphError),

    /// Prompt template rejected
    #[error("invalid template: {0}")]
    Template(#[from] TemplateError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

/// Broad error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Input could not be turned into requirements
    ParseFailure,
    /// The gateway failed or timed out
    GatewayFailure,
    /// Operation conflicts with the unit's current state
    StateConflict,
    /// Static setup is invalid
    Configuration,
}

impl CoreError {
    /// Classify the error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(_) => ErrorKind::ParseFailure,
            Self::Gateway(_) | Self::Execution(_) | Self::Grading { .. } => {
                ErrorKind::GatewayFailure
            }
            Self::Run(_) | Self::Version(_) => ErrorKind::StateConflict,
            Self::Graph(_) | Self::Template(_) | Self::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Create configuration error
    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
