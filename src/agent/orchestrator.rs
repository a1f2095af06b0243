//! Agent session
//!
//! Wires the provider, the top-level tool set, workspace permissions,
//! persistence and the UI hooks into one [`AgentLoop`] and keeps the
//! conversation between runs.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::agent::agent_loop::{AgentLoop, FinalStream, RunOutcome};
use crate::agent::conversation::Conversation;
use crate::agent::observer::{AgentObserver, ObserverSet};
use crate::agent::persistence::{ConversationStore, ConversationSummary};
use crate::agent::sub_agent::SubagentFactory;
use crate::core::{Config, Message, Result, Workspace, WorkspaceSettings};
use crate::llm::LLMProvider;
use crate::tools::implementations::{
    AskUserQuestionTool, BashTool, EditTool, EnterPlanModeTool, ExitPlanModeTool, PlanModeState,
    ReadTool, TaskTool, WriteTool,
};
use crate::tools::path_utils::ReadTracker;
use crate::tools::{
    InteractiveGate, PendingQuestion, Permission, PermissionSet, SharedPermissions, ToolExecutor,
    ToolRegistry,
};

/// Snapshot for the `status` command
#[derive(Debug, Clone)]
pub struct AgentStatus {
    pub provider: String,
    pub model: String,
    pub workspace: String,
    pub workspace_initialized: bool,
    pub conversation_id: String,
    pub messages: usize,
    pub max_iterations: usize,
    pub plan_mode: bool,
    pub permissions: PermissionSet,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Provider:       {} ({})", self.provider, self.model)?;
        writeln!(
            f,
            "Workspace:      {}{}",
            self.workspace,
            if self.workspace_initialized { "" } else { " (not initialized)" }
        )?;
        writeln!(f, "Conversation:   {} ({} messages)", self.conversation_id, self.messages)?;
        writeln!(f, "Max iterations: {}", self.max_iterations)?;
        writeln!(f, "Plan mode:      {}", if self.plan_mode { "on" } else { "off" })?;
        write!(f, "Permissions:")?;
        for (permission, granted) in self.permissions.iter() {
            write!(f, "\n  {:<24} {}", permission.id(), if granted { "enabled" } else { "disabled" })?;
        }
        Ok(())
    }
}

/// Top-level agent session used by the CLI
pub struct Agent {
    config: Config,
    provider: Arc<dyn LLMProvider>,
    workspace: Workspace,
    permissions: SharedPermissions,
    ui: Arc<dyn AgentObserver>,
    gate: InteractiveGate,
    questions: Option<mpsc::UnboundedReceiver<PendingQuestion>>,
    plan_mode: PlanModeState,
    store: Option<ConversationStore>,
    conversation: Conversation,
    agent_loop: AgentLoop,
}

impl Agent {
    /// Create a session. Must be called inside a Tokio runtime.
    ///
    /// Permissions come from the workspace settings when the workspace is
    /// initialized; otherwise everything starts disabled.
    pub fn new(
        config: Config,
        provider: Arc<dyn LLMProvider>,
        workspace: Workspace,
        ui: Arc<dyn AgentObserver>,
    ) -> Result<Self> {
        let grants = if workspace.is_initialized() {
            workspace.load_settings(&config.provider.model)?.permissions
        } else {
            PermissionSet::default()
        };

        let (gate, questions) = InteractiveGate::channel();
        let store = workspace
            .is_initialized()
            .then(|| ConversationStore::spawn(workspace.conversations_dir()));
        let conversation = Conversation::new();
        let permissions = SharedPermissions::new(grants);
        let plan_mode = PlanModeState::new();

        let agent_loop = build_loop(
            &config,
            &provider,
            &workspace,
            &permissions,
            &ui,
            &gate,
            &plan_mode,
            store.as_ref(),
        )
        .with_conversation_id(conversation.id());

        Ok(Self {
            config,
            provider,
            workspace,
            permissions,
            ui,
            gate,
            questions: Some(questions),
            plan_mode,
            store,
            conversation,
            agent_loop,
        })
    }

    /// Receiver the UI answers pending questions from. Can be taken once.
    pub fn take_question_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<PendingQuestion>> {
        self.questions.take()
    }

    /// Run one user turn in buffering mode
    pub async fn process(&mut self, input: &str, cancel: &CancellationToken) -> Result<RunOutcome> {
        let outcome = self
            .agent_loop
            .run(input, self.conversation.snapshot(), cancel)
            .await?;
        self.conversation.update(outcome.history.clone());
        Ok(outcome)
    }

    /// Start a tool-free streamed answer; hand the stream back to [`Agent::finish_stream`]
    pub async fn stream(&self, input: &str) -> Result<FinalStream> {
        self.agent_loop
            .stream(input, self.conversation.snapshot())
            .await
    }

    /// Adopt the streamed answer into the conversation
    pub fn finish_stream(&mut self, stream: FinalStream) -> Message {
        let (message, history) = stream.finish();
        self.conversation.update(history);
        message
    }

    /// Start a new conversation
    pub fn clear_history(&mut self) {
        self.conversation.clear();
        self.agent_loop.set_conversation_id(self.conversation.id());
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.agent.max_iterations = max_iterations;
        self.agent_loop.set_max_iterations(max_iterations);
    }

    /// Current grants
    pub async fn permissions(&self) -> PermissionSet {
        self.permissions.snapshot().await
    }

    /// Enable or disable a permission and persist it when the workspace is initialized
    pub async fn set_permission(&mut self, permission: Permission, granted: bool) -> Result<()> {
        self.permissions.set(permission, granted).await;

        if self.workspace.is_initialized() {
            let mut settings = self.load_or_default_settings();
            settings.permissions = self.permissions.snapshot().await;
            self.workspace.save_settings(&mut settings)?;
        }
        Ok(())
    }

    fn load_or_default_settings(&self) -> WorkspaceSettings {
        self.workspace
            .load_settings(&self.config.provider.model)
            .unwrap_or_else(|_| WorkspaceSettings::new(self.config.provider.model.clone()))
    }

    /// Create `.bob/` and start persisting conversations.
    ///
    /// Returns `false` if the workspace already existed.
    pub async fn initialize_workspace(&mut self) -> Result<bool> {
        let created = self.workspace.initialize(&self.config.provider.model)?;
        if created {
            let mut settings = self.load_or_default_settings();
            settings.permissions = self.permissions.snapshot().await;
            self.workspace.save_settings(&mut settings)?;

            self.store = Some(ConversationStore::spawn(self.workspace.conversations_dir()));
            self.rebuild_loop();
        }
        Ok(created)
    }

    fn rebuild_loop(&mut self) {
        self.agent_loop = build_loop(
            &self.config,
            &self.provider,
            &self.workspace,
            &self.permissions,
            &self.ui,
            &self.gate,
            &self.plan_mode,
            self.store.as_ref(),
        )
        .with_conversation_id(self.conversation.id());
    }

    /// Stored conversations, newest first
    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>> {
        match &self.store {
            Some(store) => store.list().await,
            None => Ok(Vec::new()),
        }
    }

    /// Continue a stored conversation
    pub async fn load_conversation(&mut self, id: &str) -> Result<usize> {
        let store = self.store.as_ref().ok_or_else(|| {
            crate::core::BobError::workspace("Workspace is not initialized; run `init` first")
        })?;
        let record = store.load(id).await?;
        let count = record.messages.len();

        self.conversation = Conversation::restore(record.id, record.messages);
        self.agent_loop.set_conversation_id(self.conversation.id());
        tracing::info!(id = %id, messages = count, "conversation loaded");
        Ok(count)
    }

    /// Tool names the model can call
    pub fn tool_names(&self) -> Vec<String> {
        self.agent_loop.executor().registry().names()
    }

    pub async fn status(&self) -> AgentStatus {
        AgentStatus {
            provider: self.provider.name().to_string(),
            model: self.provider.model().to_string(),
            workspace: self.workspace.root().display().to_string(),
            workspace_initialized: self.workspace.is_initialized(),
            conversation_id: self.conversation.id().to_string(),
            messages: self.conversation.len(),
            max_iterations: self.agent_loop.max_iterations(),
            plan_mode: self.plan_mode.is_active(),
            permissions: self.permissions.snapshot().await,
        }
    }
}

/// Assemble the top-level loop and its full tool set
#[allow(clippy::too_many_arguments)]
fn build_loop(
    config: &Config,
    provider: &Arc<dyn LLMProvider>,
    workspace: &Workspace,
    permissions: &SharedPermissions,
    ui: &Arc<dyn AgentObserver>,
    gate: &InteractiveGate,
    plan_mode: &PlanModeState,
    store: Option<&ConversationStore>,
) -> AgentLoop {
    let working_dir = workspace.root().to_path_buf();
    let tracker = ReadTracker::new();
    let factory = SubagentFactory::new(
        Arc::clone(provider),
        permissions.clone(),
        working_dir.clone(),
        config,
    );

    let registry = ToolRegistry::new()
        .with(Arc::new(ReadTool::new(tracker.clone())))
        .with(Arc::new(WriteTool))
        .with(Arc::new(EditTool::new(tracker)))
        .with(Arc::new(BashTool::new(std::time::Duration::from_secs(
            config.tools.shell_timeout_secs,
        ))))
        .with(Arc::new(AskUserQuestionTool::new(gate.clone())))
        .with(Arc::new(EnterPlanModeTool::new(gate.clone(), plan_mode.clone())))
        .with(Arc::new(ExitPlanModeTool::new(plan_mode.clone(), Arc::clone(ui))))
        .with(Arc::new(TaskTool::new(factory)));

    // UI goes last so its plan-mode acknowledgement is the one returned
    let mut observers = ObserverSet::new();
    if let Some(store) = store {
        observers = observers.with(Arc::new(store.clone()));
    }
    let observers = observers.with(Arc::clone(ui));

    let executor = ToolExecutor::new(registry, permissions.clone(), working_dir);
    let mut agent_loop = AgentLoop::new(Arc::clone(provider), executor)
        .with_max_iterations(config.agent.max_iterations)
        .with_observer(Arc::new(observers));

    if let Some(ref prompt) = config.agent.system_prompt {
        agent_loop = agent_loop.with_system_prompt(prompt.clone());
    }
    agent_loop
}
