//! Preprocess, parse, decide
//!
//! Long or messy input is first normalized by the gateway into the
//! delimiter format, then parsed deterministically. For inputs longer than
//! the threshold the direct parse of the original is computed as well and
//! the result with more requirements is kept (ties go to the preprocessed
//! one). Any preprocessing failure falls back to the direct parse.

use crate::document::DocumentParser;
use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use specflow_artifact::Requirement;
use specflow_gateway::{
    Gateway, GatewayError, ModelId, PromptTemplate, SharedGateway, TemplateContext,
    TemplateError,
};

/// Inputs longer than this get the direct-parse comparison
pub const DEFAULT_THRESHOLD_CHARS: usize = 500;

/// Default normalization prompt
pub const DEFAULT_NORMALIZE_TEMPLATE: &str = "Rewrite the document below as a list of \
discrete requirements. Put each requirement in its own block, start each block with \
its identifier if the document gives one, and separate blocks with a line containing \
only ---. Do not add requirements that are not in the document.\n\n{{description}}";

/// Rewrites raw text into a parser-friendly form
#[async_trait::async_trait]
pub trait Normalizer: Send + Sync {
    /// Normalize `text`
    async fn normalize(&self, text: &str) -> Result<String, GatewayError>;
}

/// Normalizer backed by a gateway call
pub struct GatewayNormalizer {
    gateway: SharedGateway,
    model: ModelId,
    template: PromptTemplate,
}

impl GatewayNormalizer {
    /// Create new normalizer with the default prompt
    ///
    /// # Errors
    /// Never in practice; the default template is static.
    pub fn new(gateway: SharedGateway, model: ModelId) -> Result<Self, TemplateError> {
        Ok(Self {
            gateway,
            model,
            template: PromptTemplate::compile(DEFAULT_NORMALIZE_TEMPLATE)?,
        })
    }

    /// Replace the prompt template; the document is passed as `{{description}}`
    #[inline]
    #[must_use]
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }
}

impl std::fmt::Debug for GatewayNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayNormalizer")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Normalizer for GatewayNormalizer {
    async fn normalize(&self, text: &str) -> Result<String, GatewayError> {
        let prompt = self.template.render(&TemplateContext {
            description: text,
            ..TemplateContext::default()
        });
        let out = self.gateway.generate(&prompt, &self.model).await?;
        if out.trim().is_empty() {
            return Err(GatewayError::EmptyResponse);
        }
        Ok(out)
    }
}

/// Which parse was kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseSource {
    /// Parse of the normalized text
    Preprocessed,
    /// Parse of the original text
    Direct,
}

/// Result of the preprocessing pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessOutcome {
    /// Requirements kept
    pub requirements: Vec<Requirement>,
    /// Where they came from
    pub source: ParseSource,
}

/// Preprocess-then-parse pipeline
#[derive(Debug)]
pub struct PreprocessingParser<N> {
    normalizer: N,
    parser: DocumentParser,
    threshold_chars: usize,
}

impl<N: Normalizer> PreprocessingParser<N> {
    /// Create new pipeline
    #[inline]
    #[must_use]
    pub fn new(normalizer: N) -> Self {
        Self {
            normalizer,
            parser: DocumentParser::new(),
            threshold_chars: DEFAULT_THRESHOLD_CHARS,
        }
    }

    /// Set the comparison threshold in characters
    #[inline]
    #[must_use]
    pub fn with_threshold(mut self, chars: usize) -> Self {
        self.threshold_chars = chars;
        self
    }

    /// Run preprocess, parse, decide
    ///
    /// # Errors
    /// `ParseError` only when the direct parse of the original fails and
    /// preprocessing produced nothing usable.
    pub async fn parse(&self, text: &str) -> Result<PreprocessOutcome, ParseError> {
        if text.trim().is_empty() {
            return Ok(PreprocessOutcome {
                requirements: Vec::new(),
                source: ParseSource::Direct,
            });
        }

        let preprocessed = self.preprocess(text).await;
        let long_input = text.chars().count() > self.threshold_chars;

        match preprocessed {
            Some(pre) if long_input => match self.parser.parse(text) {
                Ok(direct) => Ok(decide(pre, direct)),
                Err(_) => Ok(PreprocessOutcome {
                    requirements: pre,
                    source: ParseSource::Preprocessed,
                }),
            },
            Some(pre) => Ok(PreprocessOutcome {
                requirements: pre,
                source: ParseSource::Preprocessed,
            }),
            None => Ok(PreprocessOutcome {
                requirements: self.parser.parse(text)?,
                source: ParseSource::Direct,
            }),
        }
    }

    async fn preprocess(&self, text: &str) -> Option<Vec<Requirement>> {
        let normalized = match self.normalizer.normalize(text).await {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::warn!(error = %e, "preprocessing failed, using direct parse");
                return None;
            }
        };
        match self.parser.parse(&normalized) {
            Ok(reqs) if !reqs.is_empty() => Some(reqs),
            Ok(_) => {
                tracing::warn!("preprocessed text held no requirements, using direct parse");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "preprocessed text did not parse, using direct parse");
                None
            }
        }
    }
}

fn decide(preprocessed: Vec<Requirement>, direct: Vec<Requirement>) -> PreprocessOutcome {
    tracing::debug!(
        preprocessed = preprocessed.len(),
        direct = direct.len(),
        "comparing parses"
    );
    if direct.len() > preprocessed.len() {
        PreprocessOutcome {
            requirements: direct,
            source: ParseSource::Direct,
        }
    } else {
        PreprocessOutcome {
            requirements: preprocessed,
            source: ParseSource::Preprocessed,
        }
    }
}

/// Normalize through `gateway`, then parse and decide
///
/// # Errors
/// See [`PreprocessingParser::parse`].
pub async fn parse_structured_document_with_preprocessing(
    text: &str,
    gateway: SharedGateway,
    model: ModelId,
) -> Result<Vec<Requirement>, ParseError> {
    let normalizer = match GatewayNormalizer::new(gateway, model) {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(error = %e, "normalization template invalid, using direct parse");
            return DocumentParser::new().parse(text);
        }
    };
    PreprocessingParser::new(normalizer)
        .parse(text)
        .await
        .map(|outcome| outcome.requirements)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<String, GatewayError>);

    #[async_trait::async_trait]
    impl Normalizer for Fixed {
        async fn normalize(&self, _text: &str) -> Result<String, GatewayError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn short_input_uses_preprocessed() {
        let p = PreprocessingParser::new(Fixed(Ok("A\n---\nB".into())));
        let out = p.parse("A and B").await.unwrap();
        assert_eq!(out.source, ParseSource::Preprocessed);
        assert_eq!(out.requirements.len(), 2);
    }

    #[tokio::test]
    async fn failure_falls_back_to_direct() {
        let p = PreprocessingParser::new(Fixed(Err(GatewayError::Unavailable("down".into()))));
        let out = p.parse("X\n---\nY\n---\nZ").await.unwrap();
        assert_eq!(out.source, ParseSource::Direct);
        assert_eq!(out.requirements.len(), 3);
    }

    #[tokio::test]
    async fn long_input_keeps_larger_parse() {
        let text = format!("{}\n---\nsecond\n---\nthird", "first ".repeat(100));
        let p = PreprocessingParser::new(Fixed(Ok("only one".into())));
        let out = p.parse(&text).await.unwrap();
        assert_eq!(out.source, ParseSource::Direct);
        assert_eq!(out.requirements.len(), 3);
    }

    #[tokio::test]
    async fn tie_goes_to_preprocessed() {
        let text = format!("{}\n---\nsecond", "first ".repeat(100));
        let p = PreprocessingParser::new(Fixed(Ok("P1\n---\nP2".into())));
        let out = p.parse(&text).await.unwrap();
        assert_eq!(out.source, ParseSource::Preprocessed);
        assert_eq!(out.requirements[0].name, "P1");
    }

    #[tokio::test]
    async fn short_input_skips_comparison() {
        let p = PreprocessingParser::new(Fixed(Ok("only one".into()))).with_threshold(10_000);
        let out = p.parse("a\n---\nb\n---\nc").await.unwrap();
        assert_eq!(out.source, ParseSource::Preprocessed);
        assert_eq!(out.requirements.len(), 1);
    }
}
