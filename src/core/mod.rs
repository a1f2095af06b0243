//! Core module - shared infrastructure for bob
//!
//! This module contains foundational types, configuration, workspace settings
//! and error handling used throughout the application.

pub mod config;
pub mod error;
pub mod types;
pub mod workspace;

pub use config::Config;
pub use error::{BobError, Result};
pub use types::*;
pub use workspace::{Workspace, WorkspaceSettings};
