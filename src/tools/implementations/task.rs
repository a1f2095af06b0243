//! task - delegate a sub-task to an isolated subagent

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::agent::sub_agent::{SubagentFactory, SubagentKind};
use crate::core::{BobError, Result, TerminationReason};
use crate::tools::registry::{parse_params, Tool, ToolContext};

pub struct TaskTool {
    factory: SubagentFactory,
}

impl TaskTool {
    pub fn new(factory: SubagentFactory) -> Self {
        Self { factory }
    }
}

#[derive(Deserialize)]
struct Params {
    task_prompt: String,
    subagent_type: String,
}

#[async_trait]
impl Tool for TaskTool {
    fn name(&self) -> &str {
        "task"
    }

    fn description(&self) -> &str {
        "Spawn a subagent for a focused sub-task. 'explore': fast read-only investigation \
         (read, ls/find/git). 'plan': implementation design with read, write, edit and bash. \
         The subagent sees ONLY task_prompt, no conversation history, so include all context."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task_prompt": {
                    "type": "string",
                    "description": "The task and all context the subagent needs"
                },
                "subagent_type": {
                    "type": "string",
                    "enum": ["explore", "plan"],
                    "description": "'explore' for read-only investigation, 'plan' for design work"
                }
            },
            "required": ["task_prompt", "subagent_type"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<String> {
        let params: Params = parse_params(args)?;
        let kind: SubagentKind = params.subagent_type.parse()?;
        if params.task_prompt.trim().is_empty() {
            return Err(BobError::InvalidArguments("task_prompt is empty".to_string()));
        }

        let outcome = match self.factory.spawn(kind, &params.task_prompt, &ctx.cancel).await {
            Ok(outcome) => outcome,
            Err(BobError::Cancelled) => return Err(BobError::Cancelled),
            Err(e) => return Err(BobError::tool(format!("{} subagent failed: {}", kind, e))),
        };

        match outcome.reason {
            TerminationReason::Completed => Ok(outcome.text().to_string()),
            TerminationReason::IterationLimit => Ok(format!(
                "[{} subagent stopped after {} iterations]\n{}",
                kind,
                outcome.iterations,
                outcome.text()
            )),
            TerminationReason::Cancelled => Err(BobError::Cancelled),
            TerminationReason::Error => Err(BobError::tool(format!("{} subagent failed", kind))),
        }
    }
}
