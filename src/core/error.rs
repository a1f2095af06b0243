//! Custom error types for bob
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for bob operations
#[derive(Error, Debug)]
pub enum BobError {
    /// The model asked for a tool that is not registered
    #[error("Error: Unknown tool '{0}' (tool not found)")]
    ToolNotFound(String),

    /// The tool requires a permission the workspace does not grant
    #[error("Error: Permission denied (operation not permitted). This tool requires '{0}' to be enabled in workspace settings.")]
    PermissionDenied(String),

    /// Arguments did not match the tool's parameter schema
    #[error("Error: Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool body failed
    #[error("Error executing tool: {0}")]
    ToolExecution(String),

    /// The run hit its iteration bound
    #[error("Stopped after {0} iterations without a final answer.")]
    IterationLimitReached(usize),

    /// The run or a pending wait was cancelled
    #[error("cancelled")]
    Cancelled,

    /// Provider adapter errors (network, auth, rate limit, malformed responses)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workspace settings or persistence errors
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for bob operations
pub type Result<T> = std::result::Result<T, BobError>;

impl BobError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a workspace error
    pub fn workspace(msg: impl Into<String>) -> Self {
        Self::Workspace(msg.into())
    }

    /// Whether this is one of the tool-level kinds that are fed back to the model
    pub fn is_tool_level(&self) -> bool {
        matches!(
            self,
            Self::ToolNotFound(_)
                | Self::PermissionDenied(_)
                | Self::InvalidArguments(_)
                | Self::ToolExecution(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_level_messages_are_model_readable() {
        let err = BobError::PermissionDenied("allow_shell_commands".into());
        assert!(err.to_string().contains("operation not permitted"));
        assert!(err.is_tool_level());

        let err = BobError::ToolNotFound("grep".into());
        assert!(err.to_string().contains("tool not found"));
    }

    #[test]
    fn test_terminal_kinds_are_not_tool_level() {
        assert!(!BobError::Cancelled.is_tool_level());
        assert!(!BobError::provider("rate limited").is_tool_level());
        assert_eq!(
            BobError::IterationLimitReached(3).to_string(),
            "Stopped after 3 iterations without a final answer."
        );
    }
}
