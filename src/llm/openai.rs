//! OpenAI-compatible chat completions client
//!
//! Works against api.openai.com and any server speaking the same
//! `/chat/completions` dialect (Azure deployments behind a proxy, vLLM, Ollama's
//! OpenAI endpoint, ...). Tool calling is only used in the buffering call;
//! the streaming call never sends tool definitions.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::core::{BobError, Config, Message, Result, Role, ToolCall, ToolDefinition};
use crate::llm::traits::{LLMProvider, StreamResponse};

/// OpenAI-compatible API client
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

/// Chat completions request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// Message in the OpenAI wire format
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Tool call in the OpenAI wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunction,
}

fn function_type() -> String {
    "function".to_string()
}

/// Function in a tool call; arguments travel as a JSON string
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Non-streaming response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

/// One `data:` event of a streaming response
#[derive(Debug, Deserialize)]
struct StreamChunkResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAIClient {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.provider.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.provider.base_url.trim_end_matches('/').to_string(),
            api_key: config.provider.api_key.clone(),
            model: config.provider.model.clone(),
            temperature: config.provider.temperature,
            max_tokens: config.provider.max_tokens,
        })
    }

    /// Use a different model with the same endpoint
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Convert internal Message to the wire format
    fn to_wire_message(msg: &Message) -> WireMessage {
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(
                msg.tool_calls
                    .iter()
                    .map(|tc| WireToolCall {
                        id: tc.id.clone(),
                        call_type: function_type(),
                        function: WireFunction {
                            name: tc.name.clone(),
                            arguments: match &tc.arguments {
                                serde_json::Value::String(raw) => raw.clone(),
                                other => other.to_string(),
                            },
                        },
                    })
                    .collect(),
            )
        };

        WireMessage {
            role: msg.role.to_string(),
            content: msg.content.clone(),
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }

    /// Convert a wire response message to an assistant Message.
    ///
    /// Arguments that are not valid JSON are kept as a raw string so the
    /// executor can report them as invalid arguments.
    fn from_wire_message(msg: WireMessage) -> Message {
        let tool_calls = msg
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let arguments = if tc.function.arguments.trim().is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str(&tc.function.arguments)
                        .unwrap_or(serde_json::Value::String(tc.function.arguments))
                };
                ToolCall::new(tc.id, tc.function.name, arguments)
            })
            .collect();

        Message::assistant_with_tools(msg.content.filter(|c| !c.is_empty()), tool_calls)
    }

    async fn post(&self, request: &ChatRequest<'_>) -> Result<reqwest::Response> {
        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(request);

        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                BobError::provider(format!("Cannot connect to {}: {}", self.base_url, e))
            } else if e.is_timeout() {
                BobError::provider(format!("Request to {} timed out", self.base_url))
            } else {
                BobError::from(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(BobError::provider(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

/// Extract the text increment of one SSE line, `None` for anything else
fn parse_sse_line(line: &str) -> Option<std::result::Result<String, ()>> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<StreamChunkResponse>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|c| !c.is_empty())
            .map(Ok),
        Err(_) => Some(Err(())),
    }
}

#[async_trait]
impl LLMProvider for OpenAIClient {
    async fn generate(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<Message> {
        let request = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(Self::to_wire_message).collect(),
            tools: if tools.is_empty() { None } else { Some(tools) },
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "sending chat completion"
        );

        let response: ChatResponse = self.post(&request).await?.json().await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BobError::provider("Response contained no choices"))?;

        let message = Self::from_wire_message(choice.message);
        debug_assert_eq!(message.role, Role::Assistant);
        Ok(message)
    }

    async fn stream_final(&self, messages: &[Message]) -> Result<StreamResponse> {
        let request = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(Self::to_wire_message).collect(),
            tools: None,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
        };

        let response = self.post(&request).await?;
        let (tx, rx) = mpsc::channel::<Result<String>>(64);

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx
                            .send(Err(BobError::provider(format!("Stream error: {}", e))))
                            .await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // Process complete lines from buffer
                while let Some(newline_pos) = buffer.find('\n') {
                    let line = buffer[..newline_pos].trim().to_string();
                    buffer.drain(..=newline_pos);

                    match parse_sse_line(&line) {
                        Some(Ok(text)) => {
                            if tx.send(Ok(text)).await.is_err() {
                                // Consumer went away
                                return;
                            }
                        }
                        Some(Err(())) => {
                            tracing::warn!(line = %line, "skipping unparsable stream event");
                        }
                        None => {}
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
