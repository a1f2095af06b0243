//! Tool executor - turns a batch of tool calls into a batch of results
//!
//! Every call in a batch runs on its own task. Results come back in call
//! order no matter which task finishes first, and a failing or panicking
//! tool only ever affects its own result.

use futures::future::join_all;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::{BobError, Result, ToolCall, ToolDefinition, ToolResult};
use crate::tools::permissions::{PermissionSet, SharedPermissions};
use crate::tools::registry::{ToolContext, ToolRegistry};
use crate::tools::schema;

/// Validates, permission-checks and runs tool calls
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    permissions: SharedPermissions,
    working_dir: PathBuf,
}

impl ToolExecutor {
    pub fn new(
        registry: ToolRegistry,
        permissions: SharedPermissions,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            permissions,
            working_dir: working_dir.into(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn permissions(&self) -> &SharedPermissions {
        &self.permissions
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Tool definitions sent to the provider
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    /// Execute a batch concurrently.
    ///
    /// Returns exactly one result per call, in call order. Permissions are
    /// read once, before any call starts. `cancel` is handed to tools that
    /// can wait on it; the executor itself always waits for the whole batch.
    pub async fn execute(&self, calls: &[ToolCall], cancel: &CancellationToken) -> Vec<ToolResult> {
        if calls.is_empty() {
            return Vec::new();
        }

        let grants = self.permissions.snapshot().await;
        tracing::debug!(calls = calls.len(), "executing tool batch");

        let handles: Vec<_> = calls
            .iter()
            .cloned()
            .map(|call| {
                let registry = Arc::clone(&self.registry);
                let ctx = ToolContext::new(self.working_dir.clone(), cancel.clone());
                tokio::spawn(async move { run_call(&registry, grants, call, ctx).await })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(calls)
            .map(|(joined, call)| match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(tool = %call.name, call_id = %call.id, error = %e, "tool task aborted");
                    ToolResult::failure(call, BobError::tool(format!("tool task aborted: {}", e)).to_string())
                }
            })
            .collect()
    }
}

/// Run one call through the pipeline and wrap the outcome
async fn run_call(
    registry: &ToolRegistry,
    grants: PermissionSet,
    call: ToolCall,
    ctx: ToolContext,
) -> ToolResult {
    let started = Instant::now();
    let outcome = dispatch(registry, grants, &call, &ctx).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(output) => {
            tracing::debug!(tool = %call.name, call_id = %call.id, elapsed_ms, "tool succeeded");
            ToolResult::success(&call, output)
        }
        Err(e) => {
            tracing::debug!(tool = %call.name, call_id = %call.id, elapsed_ms, error = %e, "tool failed");
            ToolResult::failure(&call, e.to_string())
        }
    }
}

/// Lookup, permission check, schema check, then the tool body
async fn dispatch(
    registry: &ToolRegistry,
    grants: PermissionSet,
    call: &ToolCall,
    ctx: &ToolContext,
) -> Result<String> {
    let tool = registry
        .get(&call.name)
        .ok_or_else(|| BobError::ToolNotFound(call.name.clone()))?;

    if let Some(permission) = tool.required_permission() {
        if !grants.allows(permission) {
            tracing::warn!(tool = %call.name, permission = %permission, "permission denied");
            return Err(BobError::PermissionDenied(permission.id().to_string()));
        }
    }

    let args = normalize_arguments(&call.arguments)?;
    schema::validate(&tool.parameters_schema(), &args)?;

    tool.execute(args, ctx).await.map_err(|e| match e {
        e if e.is_tool_level() => e,
        BobError::Cancelled => BobError::Cancelled,
        other => BobError::tool(other.to_string()),
    })
}

/// Bring the raw argument payload into object form.
///
/// Providers may hand arguments over as an unparsed JSON string.
fn normalize_arguments(raw: &Value) -> Result<Value> {
    let value = match raw {
        Value::String(text) => serde_json::from_str(text)
            .map_err(|e| BobError::InvalidArguments(format!("arguments are not valid JSON: {}", e)))?,
        other => other.clone(),
    };

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Default::default())),
        other => Err(BobError::InvalidArguments(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}
