//! CLI commands
//!
//! Special commands that can be executed in the REPL. A leading `/` is
//! accepted. Commands that take no arguments only match when typed alone, so
//! "status of the build" still goes to the model.

use crate::agent::Agent;
use crate::core::Result;
use crate::tools::Permission;

/// Result of parsing a command
pub enum CommandResult {
    /// Continue processing as normal input
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// Clear history
    Clear,
}

/// Parse and handle special commands
pub async fn handle_command(input: &str, agent: &mut Agent) -> Result<CommandResult> {
    let input = input.trim();
    let stripped = input.strip_prefix('/').unwrap_or(input);
    let parts: Vec<&str> = stripped.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match (cmd.as_str(), args.is_empty()) {
        ("exit" | "quit" | "q", true) => Ok(CommandResult::Exit),

        ("clear" | "reset", true) => {
            agent.clear_history();
            Ok(CommandResult::Clear)
        }

        ("help" | "?", true) => Ok(CommandResult::Handled(help_text())),

        ("status", true) => Ok(CommandResult::Handled(format!(
            "Bob Status:\n─────────────────────────────\n{}",
            agent.status().await
        ))),

        ("tools", true) => Ok(CommandResult::Handled(format!(
            "Available tools:\n{}",
            agent
                .tool_names()
                .iter()
                .map(|n| format!("  - {}", n))
                .collect::<Vec<_>>()
                .join("\n")
        ))),

        ("init", true) => {
            let output = if agent.initialize_workspace().await? {
                format!(
                    "Initialized workspace at {}/.bob\nAll tool permissions start disabled; use `enable <permission>`.",
                    agent.workspace().root().display()
                )
            } else {
                "Workspace already initialized.".to_string()
            };
            Ok(CommandResult::Handled(output))
        }

        ("permissions", true) => {
            let grants = agent.permissions().await;
            let lines: Vec<String> = grants
                .iter()
                .map(|(p, granted)| {
                    format!("  {:<24} {}", p.id(), if granted { "enabled" } else { "disabled" })
                })
                .collect();
            Ok(CommandResult::Handled(format!(
                "Tool permissions:\n{}\n\nUse `enable <permission>` or `disable <permission>`.",
                lines.join("\n")
            )))
        }

        ("enable" | "disable", _) => handle_permission_command(&cmd, args, agent).await,

        ("conversations", true) => {
            let conversations = agent.conversations().await?;
            if conversations.is_empty() {
                return Ok(CommandResult::Handled(
                    "No saved conversations (run `init` to enable saving).".to_string(),
                ));
            }
            let lines: Vec<String> = conversations
                .iter()
                .map(|c| {
                    format!(
                        "  {}  {}  {:>3} msgs  {}",
                        c.id,
                        c.updated_at.format("%Y-%m-%d %H:%M"),
                        c.message_count,
                        c.preview
                    )
                })
                .collect();
            Ok(CommandResult::Handled(format!(
                "Saved conversations:\n{}\n\nUse `load <id>` to continue one.",
                lines.join("\n")
            )))
        }

        ("load", false) => {
            let count = agent.load_conversation(args).await?;
            Ok(CommandResult::Handled(format!(
                "Loaded conversation {} ({} messages).",
                args, count
            )))
        }

        _ => {
            if input.starts_with('/') {
                Ok(CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                )))
            } else {
                Ok(CommandResult::Continue(input.to_string()))
            }
        }
    }
}

/// Handle `enable <permission>` / `disable <permission>`
async fn handle_permission_command(
    cmd: &str,
    args: &str,
    agent: &mut Agent,
) -> Result<CommandResult> {
    if args.is_empty() {
        return Ok(CommandResult::Handled(format!(
            "Usage: {} <permission>\nPermissions: {}",
            cmd,
            Permission::ALL
                .iter()
                .map(|p| p.id())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let permission: Permission = match args.parse() {
        Ok(p) => p,
        Err(e) => return Ok(CommandResult::Handled(e.to_string())),
    };

    let granted = cmd == "enable";
    agent.set_permission(permission, granted).await?;

    let note = if agent.workspace().is_initialized() {
        ""
    } else {
        " (this session only; run `init` to persist)"
    };
    Ok(CommandResult::Handled(format!(
        "{} {}{}",
        if granted { "Enabled" } else { "Disabled" },
        permission.id(),
        note
    )))
}

/// Get help text
fn help_text() -> String {
    r#"Bob - Commands
─────────────────────────────────────────

  help                 Show this help message
  status               Show session status
  tools                List the tools the model can call
  clear                Start a new conversation
  init                 Create .bob/ in the current directory
  permissions          Show tool permissions
  enable <permission>  Allow file_operations, shell_commands or network_access
  disable <permission> Revoke a permission
  conversations        List saved conversations
  load <id>            Continue a saved conversation
  exit                 Exit Bob

While Bob is working:
  Ctrl+C               Cancel the current run
  When Bob asks a question, type an option number (e.g. 2 or 1,3)
  or any free-text answer.

Tips:
  - Ask Bob to read files before it edits them
  - Ask it to explore the codebase first for large changes"#
        .to_string()
}
