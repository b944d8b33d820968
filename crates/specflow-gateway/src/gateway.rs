//! Text-generation gateway
//!
//! The model service is an external collaborator; this module only defines
//! the seam ([`Gateway`]) and a timeout wrapper. Callers treat every call as
//! fallible and slow.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Model identifier passed through to the gateway
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Create model ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Opaque text-completion service
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    /// Generate text for a rendered prompt
    async fn generate(&self, prompt: &str, model: &ModelId) -> Result<String, GatewayError>;
}

/// Shared gateway handle
pub type SharedGateway = Arc<dyn Gateway>;

#[async_trait::async_trait]
impl<G: Gateway + ?Sized> Gateway for Arc<G> {
    async fn generate(&self, prompt: &str, model: &ModelId) -> Result<String, GatewayError> {
        (**self).generate(prompt, model).await
    }
}

/// Wraps a gateway and fails calls that exceed a deadline
#[derive(Debug, Clone)]
pub struct TimeoutGateway<G> {
    inner: G,
    timeout: Duration,
}

impl<G> TimeoutGateway<G> {
    /// Wrap `inner` with `timeout`
    #[inline]
    #[must_use]
    pub fn new(inner: G, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait::async_trait]
impl<G: Gateway> Gateway for TimeoutGateway<G> {
    async fn generate(&self, prompt: &str, model: &ModelId) -> Result<String, GatewayError> {
        match tokio::time::timeout(self.timeout, self.inner.generate(prompt, model)).await {
            Ok(result) => result,
            Err(_) => {
                let after_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(model = %model, after_ms, "gateway call timed out");
                Err(GatewayError::Timeout { after_ms })
            }
        }
    }
}
