//! Shared fixtures for the integration tests
//!
//! A scripted provider that replays canned responses and records every
//! request, plus small tools that count or misbehave on purpose.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bob::core::{BobError, Message, Result, ToolCall, ToolDefinition};
use bob::llm::{LLMProvider, StreamResponse};
use bob::tools::{Permission, Tool, ToolContext};

/// Provider that replays a script of responses
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Message>>>,
    /// Returned once the script runs out
    fallback: Option<Message>,
    chunks: Vec<String>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Ok).collect()),
            ..Self::default()
        }
    }

    /// Always answer with `message`
    pub fn repeating(message: Message) -> Self {
        Self {
            fallback: Some(message),
            ..Self::default()
        }
    }

    pub fn failing(error: BobError) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([Err(error)])),
            ..Self::default()
        }
    }

    pub fn streaming(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Every message list passed to `generate`, in order
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn generate_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn generate(&self, messages: &[Message], _tools: &[ToolDefinition]) -> Result<Message> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(response) => response,
            None => Ok(self
                .fallback
                .clone()
                .unwrap_or_else(|| Message::assistant("script exhausted"))),
        }
    }

    async fn stream_final(&self, messages: &[Message]) -> Result<StreamResponse> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let chunks: Vec<Result<String>> = self.chunks.iter().cloned().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "test-model"
    }
}

/// Assistant message asking for one tool call
pub fn call_tool(id: &str, name: &str, arguments: Value) -> Message {
    Message::assistant_with_tools(None, vec![ToolCall::new(id, name, arguments)])
}

/// Tool that counts invocations and echoes its `value` argument
pub struct SpyTool {
    name: String,
    permission: Option<Permission>,
    delay: Duration,
    schema: Option<Value>,
    pub calls: Arc<AtomicUsize>,
}

impl SpyTool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            permission: None,
            delay: Duration::ZERO,
            schema: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn requiring(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Tool for SpyTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Echo the value argument"
    }

    fn parameters_schema(&self) -> Value {
        self.schema
            .clone()
            .unwrap_or_else(|| json!({"type": "object", "properties": {"value": {"type": "string"}}}))
    }

    fn required_permission(&self) -> Option<Permission> {
        self.permission
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let value = args.get("value").and_then(|v| v.as_str()).unwrap_or("");
        Ok(format!("{}:{}", self.name, value))
    }
}

/// Tool whose body panics
pub struct PanickingTool;

#[async_trait]
impl Tool for PanickingTool {
    fn name(&self) -> &str {
        "explode"
    }

    fn description(&self) -> &str {
        "Always panics"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, _args: Value, _ctx: &ToolContext) -> Result<String> {
        panic!("tool blew up");
    }
}

/// Tool that cancels the run it belongs to
pub struct CancellingTool;

#[async_trait]
impl Tool for CancellingTool {
    fn name(&self) -> &str {
        "stop_everything"
    }

    fn description(&self) -> &str {
        "Cancels the current run"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> Result<String> {
        ctx.cancel.cancel();
        Ok("finished anyway".to_string())
    }
}
