//! The agent loop - generate, dispatch tools, feed results back, repeat
//!
//! One [`AgentLoop`] can serve many runs. Each run owns its [`AgentState`] and
//! its copy of the history; nothing else appends to that history while the
//! run is active.

use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::agent::loop_state::AgentState;
use crate::agent::observer::{AgentObserver, NullObserver};
use crate::agent::prompts;
use crate::core::{BobError, Message, Result, Role, TerminationReason, ToolCall, ToolResult};
use crate::llm::{LLMProvider, StreamResponse};
use crate::tools::ToolExecutor;

/// Default bound on model calls per run
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// What a finished run hands back
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Final answer. For `IterationLimit` this is the last assistant text or a
    /// stop notice and is not part of `history`.
    pub final_message: Message,
    /// History passed in, plus everything this run appended
    pub history: Vec<Message>,
    pub reason: TerminationReason,
    /// Model calls made
    pub iterations: usize,
}

impl RunOutcome {
    pub fn text(&self) -> &str {
        self.final_message.text()
    }
}

/// Drives one agent through its tool-augmented conversation
#[derive(Clone)]
pub struct AgentLoop {
    provider: Arc<dyn LLMProvider>,
    executor: ToolExecutor,
    system_prompt: String,
    max_iterations: usize,
    observer: Arc<dyn AgentObserver>,
    conversation_id: String,
    label: String,
}

impl AgentLoop {
    /// Create a loop with the default prompt, bound and a silent observer
    pub fn new(provider: Arc<dyn LLMProvider>, executor: ToolExecutor) -> Self {
        Self {
            provider,
            executor,
            system_prompt: prompts::MAIN.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            observer: Arc::new(NullObserver),
            conversation_id: Uuid::new_v4().to_string(),
            label: "main".to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn AgentObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = id.into();
        self
    }

    /// Name used in log lines
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn set_conversation_id(&mut self, id: impl Into<String>) {
        self.conversation_id = id.into();
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = max_iterations;
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// System prompt followed by the history
    fn request_messages(&self, history: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(history.iter().cloned());
        messages
    }

    fn append(&self, history: &mut Vec<Message>, message: Message) {
        history.push(message);
        self.observer
            .on_history_changed(&self.conversation_id, history);
    }

    /// Buffering mode: run until the model answers without tools, the
    /// iteration bound is hit, or `cancel` fires.
    ///
    /// Provider faults are returned as `Err`. Tool faults never are.
    pub async fn run(
        &self,
        input: &str,
        history: Vec<Message>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        let mut state = AgentState::new(self.max_iterations);
        let mut history = history;
        let run_start = history.len();
        let tools = self.executor.definitions();

        self.append(&mut history, Message::user(input));
        tracing::debug!(agent = %self.label, max_iterations = self.max_iterations, "run started");

        loop {
            if cancel.is_cancelled() {
                return Ok(self.cancelled(state, history));
            }

            if !state.begin_model_call() {
                state.finish(TerminationReason::IterationLimit);
                let final_message = last_assistant_text(&history[run_start..])
                    .map(Message::assistant)
                    .unwrap_or_else(|| {
                        Message::assistant(
                            BobError::IterationLimitReached(state.iteration).to_string(),
                        )
                    });
                tracing::info!(agent = %self.label, iterations = state.iteration, "iteration limit reached");
                return Ok(RunOutcome {
                    final_message,
                    history,
                    reason: TerminationReason::IterationLimit,
                    iterations: state.iteration,
                });
            }

            tracing::debug!(agent = %self.label, iteration = state.iteration, "calling model");
            let messages = self.request_messages(&history);
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(self.cancelled(state, history)),
                response = self.provider.generate(&messages, &tools) => response,
            };

            let response = match response {
                Ok(r) => Message {
                    role: Role::Assistant,
                    ..r
                },
                Err(e) => {
                    state.finish(TerminationReason::Error);
                    tracing::error!(agent = %self.label, iteration = state.iteration, error = %e, "provider call failed");
                    return Err(e);
                }
            };

            let calls = response.tool_calls.clone();
            self.append(&mut history, response.clone());

            if calls.is_empty() {
                state.finish(TerminationReason::Completed);
                tracing::debug!(agent = %self.label, iterations = state.iteration, "run completed");
                return Ok(RunOutcome {
                    final_message: response,
                    history,
                    reason: TerminationReason::Completed,
                    iterations: state.iteration,
                });
            }

            state.begin_tools();
            self.observer.on_tool_calls(&calls);
            tracing::debug!(agent = %self.label, calls = calls.len(), "dispatching tools");

            let (results, cancelled) = tokio::select! {
                biased;
                _ = cancel.cancelled() => (cancelled_results(&calls), true),
                results = self.executor.execute(&calls, cancel) => (results, false),
            };

            self.observer.on_tool_results(&results);
            for result in &results {
                self.append(&mut history, Message::tool(result));
            }

            if cancelled {
                return Ok(self.cancelled(state, history));
            }
        }
    }

    fn cancelled(&self, mut state: AgentState, history: Vec<Message>) -> RunOutcome {
        state.finish(TerminationReason::Cancelled);
        tracing::info!(agent = %self.label, iteration = state.iteration, "run cancelled");
        RunOutcome {
            final_message: Message::assistant(String::new()),
            history,
            reason: TerminationReason::Cancelled,
            iterations: state.iteration,
        }
    }

    /// Producing mode: stream a tool-free answer to `input`.
    ///
    /// The stream yields text increments. Call [`FinalStream::finish`] after
    /// it ends to append the complete answer to the history.
    pub async fn stream(&self, input: &str, history: Vec<Message>) -> Result<FinalStream> {
        let mut history = history;
        self.append(&mut history, Message::user(input));

        let messages = self.request_messages(&history);
        let inner = self.provider.stream_final(&messages).await?;

        Ok(FinalStream {
            inner,
            history,
            buffer: String::new(),
            observer: Arc::clone(&self.observer),
            conversation_id: self.conversation_id.clone(),
        })
    }
}

/// Most recent non-empty assistant text
fn last_assistant_text(messages: &[Message]) -> Option<String> {
    messages
        .iter()
        .rev()
        .filter(|m| m.role == Role::Assistant)
        .find_map(|m| m.content.clone().filter(|c| !c.trim().is_empty()))
}

/// Stand-in results for a batch whose run was cancelled; the real results are discarded
fn cancelled_results(calls: &[ToolCall]) -> Vec<ToolResult> {
    calls
        .iter()
        .map(|call| ToolResult::failure(call, BobError::Cancelled.to_string()))
        .collect()
}

/// Text increments of a streamed final answer
pub struct FinalStream {
    inner: StreamResponse,
    history: Vec<Message>,
    buffer: String,
    observer: Arc<dyn AgentObserver>,
    conversation_id: String,
}

impl FinalStream {
    /// Text received so far
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Append the streamed answer to the history and return both
    pub fn finish(self) -> (Message, Vec<Message>) {
        let message = Message::assistant(self.buffer);
        let mut history = self.history;
        history.push(message.clone());
        self.observer
            .on_history_changed(&self.conversation_id, &history);
        (message, history)
    }
}

impl Stream for FinalStream {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.buffer.push_str(&chunk);
                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }
}
