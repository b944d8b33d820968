//! Error types for gateway calls and prompt templates

/// A text-generation call failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Service could not be reached
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    /// Call did not finish in time
    #[error("gateway call timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Service refused the request
    #[error("gateway rejected request: {0}")]
    Rejected(String),

    /// Service answered with nothing usable
    #[error("gateway returned an empty response")]
    EmptyResponse,

    /// Response could not be decoded into the expected shape
    #[error("malformed gateway response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Create a malformed-response error
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }
}

/// Prompt template errors, reported when a template is compiled
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Placeholder name is not in the recognized set
    #[error("unknown placeholder: {{{{{0}}}}}")]
    UnknownPlaceholder(String),

    /// `{{` without a matching `}}`
    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),

    /// `{{output.}}` with no stage id
    #[error("empty stage id in output placeholder")]
    EmptyStageRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            GatewayError::Timeout { after_ms: 1500 }.to_string(),
            "gateway call timed out after 1500ms"
        );
        assert_eq!(
            TemplateError::UnknownPlaceholder("owner".into()).to_string(),
            "unknown placeholder: {{owner}}"
        );
    }
}
