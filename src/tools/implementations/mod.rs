//! Built-in tool implementations

mod ask;
mod bash;
mod edit;
mod plan_mode;
mod read;
mod task;
mod write;

pub use ask::AskUserQuestionTool;
pub use bash::{check_read_only, BashPolicy, BashTool};
pub use edit::EditTool;
pub use plan_mode::{EnterPlanModeTool, ExitPlanModeTool, PlanModeState};
pub use read::ReadTool;
pub use task::TaskTool;
pub use write::WriteTool;
