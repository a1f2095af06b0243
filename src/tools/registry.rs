//! Tool registry - the `Tool` capability contract and name lookup
//!
//! A registry is assembled once at construction and treated as immutable
//! afterwards. Subagents get their own, narrower registries.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::{BobError, Result, ToolDefinition};
use crate::tools::permissions::Permission;

/// Per-call execution context handed to every tool
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Workspace root; file tools are confined to it
    pub working_dir: PathBuf,
    /// Cancellation of the owning run
    pub cancel: CancellationToken,
}

impl ToolContext {
    pub fn new(working_dir: impl Into<PathBuf>, cancel: CancellationToken) -> Self {
        Self {
            working_dir: working_dir.into(),
            cancel,
        }
    }
}

/// A named, schema-described unit of capability
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to call the tool
    fn name(&self) -> &str;

    /// Description shown to the model
    fn description(&self) -> &str;

    /// JSON Schema of the arguments object
    fn parameters_schema(&self) -> Value;

    /// Permission checked by the executor before the body runs
    fn required_permission(&self) -> Option<Permission> {
        None
    }

    /// Run the tool body.
    ///
    /// `args` is already a JSON object. Errors become failure results whose
    /// payload is the error's display text.
    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<String>;

    /// OpenAI-style function definition
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(self.name(), self.description(), self.parameters_schema())
    }
}

/// Deserialize tool arguments into a typed parameter struct
pub fn parse_params<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| BobError::InvalidArguments(e.to_string()))
}

/// Lookup table from tool name to implementation
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::warn!(tool = %name, "tool registered twice, keeping the latest");
        }
    }

    /// Builder-style registration
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Definitions for the provider, sorted by name for stable prompts
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut tools: Vec<&Arc<dyn Tool>> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools.into_iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
