//! Subagent support
//!
//! A subagent is a fresh [`AgentLoop`] with its own narrow registry. Its
//! registry never contains `task` or any tool that needs the interactive
//! gate, so nesting and UI access cannot happen.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::agent::agent_loop::{AgentLoop, RunOutcome};
use crate::agent::observer::NullObserver;
use crate::agent::prompts;
use crate::core::{BobError, Config, Result};
use crate::llm::LLMProvider;
use crate::tools::implementations::{BashTool, EditTool, ReadTool, WriteTool};
use crate::tools::path_utils::ReadTracker;
use crate::tools::permissions::{Permission, PermissionSet, SharedPermissions};
use crate::tools::{ToolExecutor, ToolRegistry};

/// Fixed subagent configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubagentKind {
    /// Read-only investigation
    Explore,
    /// Design work with read/write/edit/shell
    Plan,
}

impl SubagentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubagentKind::Explore => "explore",
            SubagentKind::Plan => "plan",
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            SubagentKind::Explore => prompts::EXPLORE,
            SubagentKind::Plan => prompts::PLAN,
        }
    }

    /// Highest grants this kind can ever have
    pub fn permission_ceiling(&self) -> PermissionSet {
        PermissionSet::default()
            .with(Permission::FileOperations, true)
            .with(Permission::ShellCommands, true)
    }
}

impl std::fmt::Display for SubagentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubagentKind {
    type Err = BobError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "explore" => Ok(SubagentKind::Explore),
            "plan" => Ok(SubagentKind::Plan),
            other => Err(BobError::InvalidArguments(format!(
                "invalid subagent_type '{}', must be 'explore' or 'plan'",
                other
            ))),
        }
    }
}

/// Builds and runs isolated subagent loops
#[derive(Clone)]
pub struct SubagentFactory {
    provider: Arc<dyn LLMProvider>,
    /// Parent grants, read at spawn time
    permissions: SharedPermissions,
    working_dir: PathBuf,
    explore_max_iterations: usize,
    plan_max_iterations: usize,
    explore_shell_timeout: Duration,
    shell_timeout: Duration,
}

impl SubagentFactory {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        permissions: SharedPermissions,
        working_dir: impl Into<PathBuf>,
        config: &Config,
    ) -> Self {
        Self {
            provider,
            permissions,
            working_dir: working_dir.into(),
            explore_max_iterations: config.subagents.explore_max_iterations,
            plan_max_iterations: config.subagents.plan_max_iterations,
            explore_shell_timeout: Duration::from_secs(config.subagents.explore_shell_timeout_secs),
            shell_timeout: Duration::from_secs(config.tools.shell_timeout_secs),
        }
    }

    pub fn max_iterations(&self, kind: SubagentKind) -> usize {
        match kind {
            SubagentKind::Explore => self.explore_max_iterations,
            SubagentKind::Plan => self.plan_max_iterations,
        }
    }

    /// Registry for `kind`. Each call gets its own read tracker.
    pub fn registry(&self, kind: SubagentKind) -> ToolRegistry {
        let tracker = ReadTracker::new();
        let registry = ToolRegistry::new().with(Arc::new(ReadTool::new(tracker.clone())));

        match kind {
            SubagentKind::Explore => {
                registry.with(Arc::new(BashTool::read_only(self.explore_shell_timeout)))
            }
            SubagentKind::Plan => registry
                .with(Arc::new(WriteTool))
                .with(Arc::new(EditTool::new(tracker)))
                .with(Arc::new(BashTool::new(self.shell_timeout))),
        }
    }

    /// Build the loop for `kind` with the parent's current grants capped by the kind's ceiling
    pub async fn build(&self, kind: SubagentKind) -> AgentLoop {
        let grants = self
            .permissions
            .snapshot()
            .await
            .intersect(&kind.permission_ceiling());

        let executor = ToolExecutor::new(
            self.registry(kind),
            SharedPermissions::new(grants),
            self.working_dir.clone(),
        );

        AgentLoop::new(Arc::clone(&self.provider), executor)
            .with_system_prompt(kind.system_prompt())
            .with_max_iterations(self.max_iterations(kind))
            .with_observer(Arc::new(NullObserver))
            .with_label(kind.as_str())
    }

    /// Run `task_prompt` in a fresh subagent until it stops.
    ///
    /// The subagent starts with an empty history.
    pub async fn spawn(
        &self,
        kind: SubagentKind,
        task_prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        let agent = self.build(kind).await;
        tracing::info!(kind = %kind, max_iterations = agent.max_iterations(), "spawning subagent");

        let outcome = agent.run(task_prompt, Vec::new(), cancel).await?;

        tracing::info!(
            kind = %kind,
            reason = %outcome.reason,
            iterations = outcome.iterations,
            "subagent finished"
        );
        Ok(outcome)
    }
}
