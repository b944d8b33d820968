//! Specflow Gateway
//!
//! The boundary to the text-generation service and the prompt templates
//! rendered for it.
//!
//! - [`Gateway`]: `generate(prompt, model) -> Result<String, GatewayError>`
//! - [`TimeoutGateway`]: deadline wrapper reporting [`GatewayError::Timeout`]
//! - [`PromptTemplate`]: compiled `{{placeholder}}` templates

#![warn(unreachable_pub)]

pub mod error;
pub mod gateway;
pub mod template;

pub use error::{GatewayError, TemplateError};
pub use gateway::{Gateway, ModelId, SharedGateway, TimeoutGateway};
pub use template::{PromptTemplate, TemplateContext, TemplateVar};
