//! enter_plan_mode / exit_plan_mode

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::agent::observer::AgentObserver;
use crate::core::Result;
use crate::tools::gate::InteractiveGate;
use crate::tools::registry::{Tool, ToolContext};

/// Whether the session is currently planning
#[derive(Debug, Clone, Default)]
pub struct PlanModeState {
    active: Arc<AtomicBool>,
}

impl PlanModeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn set(&self, active: bool) -> bool {
        self.active.swap(active, Ordering::SeqCst)
    }
}

fn no_params() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "additionalProperties": false
    })
}

pub struct EnterPlanModeTool {
    gate: InteractiveGate,
    state: PlanModeState,
}

impl EnterPlanModeTool {
    pub fn new(gate: InteractiveGate, state: PlanModeState) -> Self {
        Self { gate, state }
    }
}

#[async_trait]
impl Tool for EnterPlanModeTool {
    fn name(&self) -> &str {
        "enter_plan_mode"
    }

    fn description(&self) -> &str {
        "Ask the user to approve a planning phase before implementing. Use it for tasks with \
         several valid approaches, architectural decisions, large changes or unclear \
         requirements. Do not use it for simple, obvious changes or pure research."
    }

    fn parameters_schema(&self) -> Value {
        no_params()
    }

    async fn execute(&self, _args: Value, ctx: &ToolContext) -> Result<String> {
        if self.state.is_active() {
            return Ok("Already in plan mode.".to_string());
        }

        let approved = self
            .gate
            .approve(
                "Enter plan mode? Bob will explore the codebase, design an approach and present \
                 a plan for approval before changing anything.",
                &ctx.cancel,
            )
            .await?;

        if approved {
            self.state.set(true);
            tracing::info!("plan mode entered");
            Ok("Plan mode activated. Explore the codebase, understand the existing patterns, \
                design your approach, clarify open points with ask_user_question, present the \
                plan and call exit_plan_mode when you are ready to implement."
                .to_string())
        } else {
            Ok("Plan mode request denied by user. Continue with the task directly.".to_string())
        }
    }
}

pub struct ExitPlanModeTool {
    state: PlanModeState,
    observer: Arc<dyn AgentObserver>,
}

impl ExitPlanModeTool {
    pub fn new(state: PlanModeState, observer: Arc<dyn AgentObserver>) -> Self {
        Self { state, observer }
    }
}

#[async_trait]
impl Tool for ExitPlanModeTool {
    fn name(&self) -> &str {
        "exit_plan_mode"
    }

    fn description(&self) -> &str {
        "Leave plan mode once the plan has been presented and open questions are resolved, \
         and start implementing. Only for planning implementation work, not for research."
    }

    fn parameters_schema(&self) -> Value {
        no_params()
    }

    async fn execute(&self, _args: Value, _ctx: &ToolContext) -> Result<String> {
        if !self.state.set(false) {
            return Ok("Warning: Not currently in plan mode".to_string());
        }
        tracing::info!("plan mode exited");
        Ok(self.observer.on_plan_mode_exit().await)
    }
}
