//! CLI module - command-line interface
//!
//! Contains the REPL, command parsing and terminal rendering.

pub mod commands;
pub mod console;
pub mod repl;

pub use console::ConsoleObserver;
pub use repl::Repl;
