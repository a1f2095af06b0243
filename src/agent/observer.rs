//! Collaborators notified by the agent loop
//!
//! The loop calls these hooks; it never waits on persistence or rendering.
//! Only the top-level session installs a UI observer. Subagents use
//! [`NullObserver`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{Message, ToolCall, ToolResult};

/// Hooks invoked by the agent loop
#[async_trait]
pub trait AgentObserver: Send + Sync {
    /// Called after every append to the history. Must return quickly.
    fn on_history_changed(&self, _conversation_id: &str, _history: &[Message]) {}

    /// Tool calls about to run, for display
    fn on_tool_calls(&self, _calls: &[ToolCall]) {}

    /// Results of a finished batch, for display
    fn on_tool_results(&self, _results: &[ToolResult]) {}

    /// Acknowledge leaving plan mode; the text goes back to the model
    async fn on_plan_mode_exit(&self) -> String {
        "Plan mode exited successfully. Ready to implement.".to_string()
    }
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl AgentObserver for NullObserver {}

/// Fans every notification out to several observers in order
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn AgentObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn AgentObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

#[async_trait]
impl AgentObserver for ObserverSet {
    fn on_history_changed(&self, conversation_id: &str, history: &[Message]) {
        for o in &self.observers {
            o.on_history_changed(conversation_id, history);
        }
    }

    fn on_tool_calls(&self, calls: &[ToolCall]) {
        for o in &self.observers {
            o.on_tool_calls(calls);
        }
    }

    fn on_tool_results(&self, results: &[ToolResult]) {
        for o in &self.observers {
            o.on_tool_results(results);
        }
    }

    /// The last observer's acknowledgement wins
    async fn on_plan_mode_exit(&self) -> String {
        let mut ack = NullObserver.on_plan_mode_exit().await;
        for o in &self.observers {
            ack = o.on_plan_mode_exit().await;
        }
        ack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        changes: AtomicUsize,
    }

    impl AgentObserver for Counting {
        fn on_history_changed(&self, _id: &str, _history: &[Message]) {
            self.changes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_set_fans_out() {
        let a = Arc::new(Counting::default());
        let b = Arc::new(Counting::default());
        let set = ObserverSet::new().with(a.clone()).with(b.clone());

        set.on_history_changed("c1", &[Message::user("hi")]);

        assert_eq!(a.changes.load(Ordering::SeqCst), 1);
        assert_eq!(b.changes.load(Ordering::SeqCst), 1);
        assert!(set.on_plan_mode_exit().await.contains("Plan mode exited"));
    }
}
