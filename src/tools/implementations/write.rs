//! Write tool - create or overwrite a file in the workspace

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::Result;
use crate::tools::path_utils::{display_relative, resolve_in_workspace};
use crate::tools::permissions::Permission;
use crate::tools::registry::{parse_params, Tool, ToolContext};

pub struct WriteTool;

#[derive(Deserialize)]
struct Params {
    file_path: String,
    content: String,
}

#[async_trait]
impl Tool for WriteTool {
    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Write or overwrite a file with the given content. Parent directories are created \
         as needed. Prefer `edit` for changes to existing files."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to write, relative to the workspace root or absolute"
                },
                "content": {
                    "type": "string",
                    "description": "Complete content of the file"
                }
            },
            "required": ["file_path", "content"]
        })
    }

    fn required_permission(&self) -> Option<Permission> {
        Some(Permission::FileOperations)
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<String> {
        let params: Params = parse_params(args)?;
        let path = resolve_in_workspace(&ctx.working_dir, &params.file_path)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &params.content).await?;

        tracing::info!(path = %path.display(), bytes = params.content.len(), "wrote file");

        Ok(format!(
            "Successfully wrote to {}\nLines: {} | Characters: {}",
            display_relative(&ctx.working_dir, &path),
            params.content.lines().count(),
            params.content.chars().count()
        ))
    }
}
