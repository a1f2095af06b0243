//! Tools module - tool contract, permissions, execution and implementations
//!
//! Contains the tool registry, the batch executor, the interactive gate used
//! by tools that wait on a human, and the built-in tools.

pub mod executor;
pub mod gate;
pub mod implementations;
pub mod path_utils;
pub mod permissions;
pub mod registry;
pub mod schema;

pub use executor::ToolExecutor;
pub use gate::{InteractiveGate, PendingQuestion, Question, QuestionOption};
pub use permissions::{Permission, PermissionSet, SharedPermissions};
pub use registry::{parse_params, Tool, ToolContext, ToolRegistry};
