//! LLM Provider trait for abstracting different backends
//!
//! The agent loop depends only on this contract; vendor wire formats live in
//! the adapters.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::core::{Message, Result, ToolDefinition};

/// Lazy sequence of text increments of the final answer
pub type StreamResponse = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate one assistant message. It may carry tool calls when `tools` is non-empty.
    ///
    /// Network, auth and rate-limit failures are returned as `BobError::Provider`
    /// (or `Http`); the engine does not retry them.
    async fn generate(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<Message>;

    /// Stream a tool-free final answer as text increments
    async fn stream_final(&self, messages: &[Message]) -> Result<StreamResponse>;

    /// Get the provider name
    fn name(&self) -> &str;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;
}
