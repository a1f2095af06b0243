//! Interactive gate - lets a tool suspend until a human answers
//!
//! A tool calls [`InteractiveGate::ask`]; the gate publishes a
//! [`PendingQuestion`] on the UI channel and waits on its single-slot answer
//! channel. At most one question is outstanding per gate: concurrent askers
//! queue in FIFO order on the gate's turn lock. Both the queue wait and the
//! answer wait end early when the run is cancelled.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_util::sync::CancellationToken;

use crate::core::{BobError, Result};

/// One selectable answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// Question payload shown to the human
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    /// Short label, at most 12 characters
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(rename = "multiSelect", default)]
    pub multi_select: bool,
}

impl Question {
    /// Free-form question without options
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            header: String::new(),
            options: Vec::new(),
            multi_select: false,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn with_option(mut self, label: impl Into<String>, description: impl Into<String>) -> Self {
        self.options.push(QuestionOption {
            label: label.into(),
            description: description.into(),
        });
        self
    }
}

/// An in-flight question waiting for exactly one answer
#[derive(Debug)]
pub struct PendingQuestion {
    question: Question,
    answer_tx: oneshot::Sender<String>,
}

impl PendingQuestion {
    pub fn question(&self) -> &Question {
        &self.question
    }

    /// Deliver the answer. Returns `false` if the asker stopped waiting.
    pub fn resolve(self, answer: impl Into<String>) -> bool {
        self.answer_tx.send(answer.into()).is_ok()
    }
}

/// Handle tools use to ask the human something
#[derive(Debug, Clone)]
pub struct InteractiveGate {
    ui_tx: mpsc::UnboundedSender<PendingQuestion>,
    turn: Arc<Mutex<()>>,
}

impl InteractiveGate {
    /// Create a gate plus the receiver the UI answers from
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PendingQuestion>) {
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let gate = Self {
            ui_tx,
            turn: Arc::new(Mutex::new(())),
        };
        (gate, ui_rx)
    }

    /// Publish a question and wait for its answer
    pub async fn ask(&self, question: Question, cancel: &CancellationToken) -> Result<String> {
        let mut answers = self.ask_all(vec![question], cancel).await?;
        answers
            .pop()
            .ok_or_else(|| BobError::tool("no answer received"))
    }

    /// Ask a set of questions one after another as a single turn.
    ///
    /// No other asker can interleave its questions with this set.
    pub async fn ask_all(
        &self,
        questions: Vec<Question>,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let _turn = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("question cancelled while queued");
                return Err(BobError::Cancelled);
            }
            guard = self.turn.lock() => guard,
        };

        let mut answers = Vec::with_capacity(questions.len());
        for question in questions {
            answers.push(self.publish_and_wait(question, cancel).await?);
        }
        Ok(answers)
    }

    async fn publish_and_wait(&self, question: Question, cancel: &CancellationToken) -> Result<String> {
        let (answer_tx, answer_rx) = oneshot::channel();
        tracing::debug!(header = %question.header, "suspending for human input");
        self.ui_tx
            .send(PendingQuestion {
                question,
                answer_tx,
            })
            .map_err(|_| BobError::tool("no interface is attached to answer questions"))?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("pending question cancelled");
                Err(BobError::Cancelled)
            }
            answer = answer_rx => {
                let answer = answer
                    .map_err(|_| BobError::tool("question was dismissed without an answer"))?;
                tracing::debug!("resumed with answer");
                Ok(answer)
            }
        }
    }

    /// Yes/no approval through the same channel
    pub async fn approve(&self, prompt: impl Into<String>, cancel: &CancellationToken) -> Result<bool> {
        let question = Question::new(prompt)
            .with_header("Approval")
            .with_option("Approve", "Continue")
            .with_option("Deny", "Stay as is");

        let answer = self.ask(question, cancel).await?;
        Ok(is_affirmative(&answer))
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "approve" | "approved" | "yes" | "y" | "1" | "ok"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test]
    async fn test_ask_resumes_with_answer() {
        let (gate, mut ui) = InteractiveGate::channel();
        let cancel = CancellationToken::new();

        let mut asking = task::spawn(gate.ask(Question::new("Which auth?"), &cancel));
        assert_pending!(asking.poll());

        let pending = ui.recv().await.unwrap();
        assert_eq!(pending.question().question, "Which auth?");
        assert!(pending.resolve("JWT"));

        assert!(asking.is_woken());
        let answer = assert_ready!(asking.poll()).unwrap();
        assert_eq!(answer, "JWT");
    }

    #[tokio::test]
    async fn test_cancel_interrupts_wait() {
        let (gate, mut ui) = InteractiveGate::channel();
        let cancel = CancellationToken::new();

        let mut asking = task::spawn(gate.ask(Question::new("Proceed?"), &cancel));
        assert_pending!(asking.poll());
        let pending = ui.recv().await.unwrap();

        cancel.cancel();
        let err = assert_ready!(asking.poll()).unwrap_err();
        assert_eq!(err.to_string(), "cancelled");
        drop(asking);
        assert!(!pending.resolve("too late"));
    }

    #[tokio::test]
    async fn test_second_question_queues_behind_first() {
        let (gate, mut ui) = InteractiveGate::channel();
        let cancel = CancellationToken::new();

        let mut first = task::spawn(gate.ask(Question::new("first"), &cancel));
        let mut second = task::spawn(gate.ask(Question::new("second"), &cancel));
        assert_pending!(first.poll());
        assert_pending!(second.poll());

        let pending = ui.recv().await.unwrap();
        assert_eq!(pending.question().question, "first");
        assert!(ui.try_recv().is_err());

        pending.resolve("a");
        assert_eq!(assert_ready!(first.poll()).unwrap(), "a");

        assert_pending!(second.poll());
        let pending = ui.recv().await.unwrap();
        assert_eq!(pending.question().question, "second");
        pending.resolve("b");
        assert_eq!(assert_ready!(second.poll()).unwrap(), "b");
    }

    #[tokio::test]
    async fn test_question_set_is_one_turn() {
        let (gate, mut ui) = InteractiveGate::channel();
        let cancel = CancellationToken::new();

        let set = vec![Question::new("q1"), Question::new("q2")];
        let mut first = task::spawn(gate.ask_all(set, &cancel));
        let mut other = task::spawn(gate.ask(Question::new("other"), &cancel));
        assert_pending!(first.poll());
        assert_pending!(other.poll());

        ui.recv().await.unwrap().resolve("a1");
        assert_pending!(first.poll());
        let pending = ui.recv().await.unwrap();
        assert_eq!(pending.question().question, "q2");
        pending.resolve("a2");

        assert_eq!(assert_ready!(first.poll()).unwrap(), vec!["a1", "a2"]);
        assert_pending!(other.poll());
        assert_eq!(ui.recv().await.unwrap().question().question, "other");
    }

    #[tokio::test]
    async fn test_dropped_ui_is_an_error() {
        let (gate, ui) = InteractiveGate::channel();
        drop(ui);
        let err = gate
            .ask(Question::new("anyone?"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_tool_level());
    }

    #[test]
    fn test_affirmative_answers() {
        assert!(is_affirmative("Approve"));
        assert!(is_affirmative(" yes "));
        assert!(!is_affirmative("Deny"));
    }
}
