//! Read tool - read a text file from the workspace

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::{BobError, Result};
use crate::tools::path_utils::{display_relative, resolve_in_workspace, ReadTracker};
use crate::tools::permissions::Permission;
use crate::tools::registry::{parse_params, Tool, ToolContext};

pub struct ReadTool {
    tracker: ReadTracker,
}

impl ReadTool {
    /// Read tool that records successful reads in `tracker`
    pub fn new(tracker: ReadTracker) -> Self {
        Self { tracker }
    }
}

#[derive(Deserialize)]
struct Params {
    file_path: String,
}

#[async_trait]
impl Tool for ReadTool {
    fn name(&self) -> &str {
        "read"
    }

    fn description(&self) -> &str {
        "Read the contents of a file in the workspace. Use this to examine files before \
         changing them or to understand the codebase."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to read, relative to the workspace root or absolute"
                }
            },
            "required": ["file_path"]
        })
    }

    fn required_permission(&self) -> Option<Permission> {
        Some(Permission::FileOperations)
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<String> {
        let params: Params = parse_params(args)?;
        let path = resolve_in_workspace(&ctx.working_dir, &params.file_path)?;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BobError::tool(format!("File not found: {}", params.file_path)));
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(BobError::tool(format!(
                "Path is not a file: {}",
                params.file_path
            )));
        }

        let bytes = tokio::fs::read(&path).await?;
        let content = String::from_utf8(bytes).map_err(|_| {
            BobError::tool(format!(
                "File is not a text file or uses an unsupported encoding: {}",
                params.file_path
            ))
        })?;

        self.tracker.record(&path);
        tracing::debug!(path = %path.display(), bytes = content.len(), "read file");

        Ok(format!(
            "File: {}\nLines: {} | Characters: {}\n\n{}",
            display_relative(&ctx.working_dir, &path),
            content.lines().count(),
            content.chars().count(),
            content
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_read_reports_stats_and_tracks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "one\ntwo\n").unwrap();
        let tracker = ReadTracker::new();
        let tool = ReadTool::new(tracker.clone());
        let ctx = ToolContext::new(dir.path(), CancellationToken::new());

        let out = tool
            .execute(json!({"file_path": "a.txt"}), &ctx)
            .await
            .unwrap();

        assert!(out.starts_with("File: a.txt\nLines: 2 | Characters: 8"));
        assert!(out.ends_with("one\ntwo\n"));
        let resolved = resolve_in_workspace(dir.path(), "a.txt").unwrap();
        assert!(tracker.has_read(&resolved));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ReadTool::new(ReadTracker::new());
        let ctx = ToolContext::new(dir.path(), CancellationToken::new());

        let err = tool
            .execute(json!({"file_path": "missing.txt"}), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("File not found: missing.txt"));
    }

    #[tokio::test]
    async fn test_directory_and_binary_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();
        let tool = ReadTool::new(ReadTracker::new());
        let ctx = ToolContext::new(dir.path(), CancellationToken::new());

        assert!(tool.execute(json!({"file_path": "sub"}), &ctx).await.is_err());
        assert!(tool
            .execute(json!({"file_path": "blob.bin"}), &ctx)
            .await
            .is_err());
    }
}
