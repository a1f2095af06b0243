//! Bob - Agentic Coding Assistant
//!
//! An agent orchestration engine: a generate/dispatch loop over an
//! OpenAI-compatible model, a permission-checked tool executor that runs
//! each batch of tool calls in parallel, an interactive gate that pauses a
//! tool until the human answers, and isolated subagents for delegated work.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, workspace settings and errors
//! - **LLM**: Provider abstraction with an OpenAI-compatible client
//! - **Tools**: Registry, executor, permissions, interactive gate and tools
//! - **Agent**: The agent loop, subagents, persistence and the session
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bob::agent::{Agent, NullObserver};
//! use bob::core::{Config, Workspace};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> bob::Result<()> {
//!     let config = Config::load();
//!     let provider = bob::llm::create_provider(&config)?;
//!     let mut agent = Agent::new(config, provider, Workspace::current(), Arc::new(NullObserver))?;
//!
//!     let outcome = agent
//!         .process("Summarize src/main.rs", &CancellationToken::new())
//!         .await?;
//!     println!("{}", outcome.text());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::Agent;
pub use cli::Repl;
pub use core::{BobError, Config, Result};
