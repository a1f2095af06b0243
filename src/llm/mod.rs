//! LLM module - Language Model integrations
//!
//! Provides the provider contract used by the agent loop and an
//! OpenAI-compatible adapter.

pub mod openai;
pub mod traits;

use std::sync::Arc;

use crate::core::{Config, Result};

pub use openai::OpenAIClient;
pub use traits::{LLMProvider, StreamResponse};

/// Create the configured LLM provider
pub fn create_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    Ok(Arc::new(OpenAIClient::from_config(config)?))
}
