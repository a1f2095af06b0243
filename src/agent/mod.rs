//! Agent module - the agent loop, subagents and session management
//!
//! Contains the generate/dispatch loop, its collaborators and the session
//! facade the CLI drives.

pub mod agent_loop;
pub mod conversation;
pub mod loop_state;
pub mod observer;
pub mod orchestrator;
pub mod persistence;
pub mod prompts;
pub mod sub_agent;

pub use agent_loop::{AgentLoop, FinalStream, RunOutcome, DEFAULT_MAX_ITERATIONS};
pub use conversation::Conversation;
pub use loop_state::{AgentState, LoopPhase};
pub use observer::{AgentObserver, NullObserver, ObserverSet};
pub use orchestrator::{Agent, AgentStatus};
pub use persistence::{ConversationRecord, ConversationStore, ConversationSummary};
pub use sub_agent::{SubagentFactory, SubagentKind};
