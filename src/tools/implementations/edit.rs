//! Edit tool - exact string replacement in a previously read file

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::{BobError, Result};
use crate::tools::path_utils::{display_relative, resolve_in_workspace, ReadTracker};
use crate::tools::permissions::Permission;
use crate::tools::registry::{parse_params, Tool, ToolContext};

pub struct EditTool {
    tracker: ReadTracker,
}

impl EditTool {
    /// Edit tool sharing the read tool's tracker
    pub fn new(tracker: ReadTracker) -> Self {
        Self { tracker }
    }
}

#[derive(Deserialize)]
struct Params {
    file_path: String,
    old_string: String,
    new_string: String,
    #[serde(default)]
    replace_all: bool,
}

#[async_trait]
impl Tool for EditTool {
    fn name(&self) -> &str {
        "edit"
    }

    fn description(&self) -> &str {
        "Replace an exact string in a file. The file must have been read with `read` first. \
         Fails if old_string is not unique unless replace_all is set."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to modify"
                },
                "old_string": {
                    "type": "string",
                    "description": "The text to replace"
                },
                "new_string": {
                    "type": "string",
                    "description": "The replacement text (must differ from old_string)"
                },
                "replace_all": {
                    "type": "boolean",
                    "description": "Replace every occurrence (default false)",
                    "default": false
                }
            },
            "required": ["file_path", "old_string", "new_string"]
        })
    }

    fn required_permission(&self) -> Option<Permission> {
        Some(Permission::FileOperations)
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<String> {
        let params: Params = parse_params(args)?;

        if params.old_string.is_empty() {
            return Err(BobError::InvalidArguments(
                "old_string must not be empty".to_string(),
            ));
        }
        if params.old_string == params.new_string {
            return Err(BobError::InvalidArguments(
                "old_string and new_string must be different".to_string(),
            ));
        }

        let path = resolve_in_workspace(&ctx.working_dir, &params.file_path)?;

        if !self.tracker.has_read(&path) {
            return Err(BobError::tool(format!(
                "You must use the `read` tool to read {} before editing it",
                params.file_path
            )));
        }
        if !path.is_file() {
            return Err(BobError::tool(format!("File not found: {}", params.file_path)));
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let occurrences = content.matches(params.old_string.as_str()).count();

        let updated = match occurrences {
            0 => {
                return Err(BobError::tool(format!(
                    "old_string not found in {}",
                    params.file_path
                )))
            }
            1 => content.replacen(&params.old_string, &params.new_string, 1),
            _ if params.replace_all => content.replace(&params.old_string, &params.new_string),
            n => {
                return Err(BobError::tool(format!(
                    "old_string is not unique in {} (found {} occurrences). Provide more \
                     surrounding context or set replace_all=true.",
                    params.file_path, n
                )))
            }
        };

        tokio::fs::write(&path, updated).await?;
        tracing::info!(path = %path.display(), occurrences, "edited file");

        Ok(format!(
            "Successfully edited {}. Replaced {} occurrence(s).",
            display_relative(&ctx.working_dir, &path),
            occurrences
        ))
    }
}
