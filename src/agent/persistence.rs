//! Conversation persistence
//!
//! [`ConversationStore`] checkpoints the history after every change. The
//! observer hook only queues the snapshot; a background task writes
//! `<dir>/<conversation_id>.json` in order, so the loop never waits on disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};

use crate::agent::observer::AgentObserver;
use crate::core::{BobError, Message, Result, Role};

/// On-disk shape of one conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

/// Listing entry
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub id: String,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
    /// First user message, shortened
    pub preview: String,
}

enum Command {
    Save(ConversationRecord),
    Flush(oneshot::Sender<()>),
}

/// Persistence collaborator writing JSON checkpoints
#[derive(Debug, Clone)]
pub struct ConversationStore {
    dir: PathBuf,
    tx: mpsc::UnboundedSender<Command>,
}

impl ConversationStore {
    /// Start the writer task. Must be called inside a Tokio runtime.
    pub fn spawn(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
        let writer_dir = dir.clone();

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    Command::Save(record) => {
                        if let Err(e) = write_record(&writer_dir, &record).await {
                            tracing::warn!(id = %record.id, error = %e, "failed to save conversation");
                        }
                    }
                    Command::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });

        Self { dir, tx }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `id`; ids are single file-name segments
    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(BobError::workspace(format!("Invalid conversation id: {}", id)));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    /// Wait until every queued checkpoint is on disk
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Stored conversations, newest first
    pub async fn list(&self) -> Result<Vec<ConversationSummary>> {
        let mut summaries = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(summaries),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_record(&path).await {
                Ok(record) => summaries.push(summarize(&record)),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable conversation"),
            }
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    /// Load a conversation by id
    pub async fn load(&self, id: &str) -> Result<ConversationRecord> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Err(BobError::workspace(format!("Conversation not found: {}", id)));
        }
        read_record(&path).await
    }
}

impl AgentObserver for ConversationStore {
    fn on_history_changed(&self, conversation_id: &str, history: &[Message]) {
        let record = ConversationRecord {
            id: conversation_id.to_string(),
            updated_at: Utc::now(),
            messages: history.to_vec(),
        };
        if self.tx.send(Command::Save(record)).is_err() {
            tracing::warn!(id = %conversation_id, "conversation writer has stopped");
        }
    }
}

async fn write_record(dir: &Path, record: &ConversationRecord) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let content = serde_json::to_string_pretty(record)?;
    let path = dir.join(format!("{}.json", record.id));
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, &path).await?;
    Ok(())
}

async fn read_record(path: &Path) -> Result<ConversationRecord> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

fn summarize(record: &ConversationRecord) -> ConversationSummary {
    let preview = record
        .messages
        .iter()
        .find(|m| m.role == Role::User)
        .map(|m| {
            let text = m.text().lines().next().unwrap_or("");
            if text.chars().count() > 60 {
                format!("{}...", text.chars().take(57).collect::<String>())
            } else {
                text.to_string()
            }
        })
        .unwrap_or_default();

    ConversationSummary {
        id: record.id.clone(),
        updated_at: record.updated_at,
        message_count: record.messages.len(),
        preview,
    }
}
