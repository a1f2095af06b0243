//! Agent loop state management
//!
//! Tracks where one run of the generate/dispatch cycle is and why it stopped.

use crate::core::TerminationReason;

/// Phase of the agent loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    AwaitingModel,
    AwaitingTools,
    Done,
}

/// Per-run state. Created when a run starts and dropped when it returns.
#[derive(Debug, Clone)]
pub struct AgentState {
    /// Number of model calls made so far
    pub iteration: usize,
    /// Maximum allowed model calls
    pub max_iterations: usize,
    pub phase: LoopPhase,
    /// Set once the run reaches `Done`
    pub termination: Option<TerminationReason>,
}

impl AgentState {
    /// Create a new state with the given bound
    pub fn new(max_iterations: usize) -> Self {
        Self {
            iteration: 0,
            max_iterations,
            phase: LoopPhase::Idle,
            termination: None,
        }
    }

    /// Enter `AwaitingModel` if the bound allows another model call.
    ///
    /// Returns `false` when the bound is reached; the counter is left unchanged.
    pub fn begin_model_call(&mut self) -> bool {
        if self.iteration >= self.max_iterations {
            return false;
        }
        self.iteration += 1;
        self.phase = LoopPhase::AwaitingModel;
        true
    }

    pub fn begin_tools(&mut self) {
        self.phase = LoopPhase::AwaitingTools;
    }

    pub fn finish(&mut self, reason: TerminationReason) {
        self.phase = LoopPhase::Done;
        self.termination = Some(reason);
    }

    pub fn is_done(&self) -> bool {
        self.phase == LoopPhase::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_new() {
        let state = AgentState::new(10);
        assert_eq!(state.iteration, 0);
        assert_eq!(state.phase, LoopPhase::Idle);
        assert!(state.termination.is_none());
    }

    #[test]
    fn test_bound_is_never_exceeded() {
        let mut state = AgentState::new(2);
        assert!(state.begin_model_call());
        state.begin_tools();
        assert!(state.begin_model_call());
        assert!(!state.begin_model_call());
        assert_eq!(state.iteration, 2);
    }

    #[test]
    fn test_finish() {
        let mut state = AgentState::new(1);
        state.finish(TerminationReason::Completed);
        assert!(state.is_done());
        assert_eq!(state.termination, Some(TerminationReason::Completed));
    }
}
