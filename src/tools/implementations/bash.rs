//! Bash tool - run a shell command in the workspace root
//!
//! The command runs under `sh -c` with stdin closed. A timeout kills the
//! child. [`BashPolicy::ReadOnly`] restricts the tool to listing and
//! version-control queries.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::{BobError, Result};
use crate::tools::permissions::Permission;
use crate::tools::registry::{parse_params, Tool, ToolContext};

/// What the shell tool may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BashPolicy {
    /// Any command
    Unrestricted,
    /// Listing, searching and read-only git subcommands
    ReadOnly,
}

const READ_ONLY_GIT: &[&str] = &[
    "status", "log", "diff", "show", "ls-files", "grep", "blame", "branch", "rev-parse",
];

const SHELL_OPERATORS: &[char] = &[';', '&', '|', '>', '<', '$', '`', '\n', '(', ')'];

const FIND_ACTIONS: &[&str] = &[
    "-exec", "-execdir", "-ok", "-okdir", "-delete", "-fprint", "-fprint0", "-fprintf", "-fls",
];

/// Git options that write files or run external programs
const GIT_WRITING_OPTIONS: &[&str] = &["--output", "--ext-diff", "--open-files-in-pager"];

/// `git branch` flags that only list
const GIT_BRANCH_LISTING: &[&str] = &[
    "-a", "--all", "-r", "--remotes", "-l", "--list", "--show-current", "-v", "-vv",
    "--verbose", "--no-color", "--color",
];

fn read_only_denied(what: impl std::fmt::Display) -> BobError {
    BobError::tool(format!("{} is not allowed in read-only mode", what))
}

/// Check a command against the read-only allowlist
pub fn check_read_only(command: &str) -> Result<()> {
    if let Some(op) = command.chars().find(|c| SHELL_OPERATORS.contains(c)) {
        return Err(read_only_denied(format!("'{}'", op.escape_default())));
    }

    let words: Vec<&str> = command.split_whitespace().collect();
    let Some((&program, args)) = words.split_first() else {
        return Err(BobError::InvalidArguments("command is empty".to_string()));
    };

    match program {
        "git" => check_git(args),
        "find" => match args.iter().copied().find(|a| FIND_ACTIONS.contains(a)) {
            Some(action) => Err(read_only_denied(format!("find {}", action))),
            None => Ok(()),
        },
        "tree" => match args.iter().copied().find(|a| is_tree_output_flag(a)) {
            Some(flag) => Err(read_only_denied(format!("tree {}", flag))),
            None => Ok(()),
        },
        "ls" | "pwd" => Ok(()),
        other => Err(BobError::tool(format!(
            "'{}' is not allowed in read-only mode (allowed: ls, find, pwd, tree, git {})",
            other,
            READ_ONLY_GIT.join("|")
        ))),
    }
}

fn check_git(args: &[&str]) -> Result<()> {
    let Some((&sub, rest)) = args.split_first() else {
        return Err(BobError::tool("git requires a read-only subcommand"));
    };
    if !READ_ONLY_GIT.contains(&sub) {
        return Err(read_only_denied(format!("git {}", sub)));
    }

    if let Some(opt) = rest.iter().copied().find(|a| {
        GIT_WRITING_OPTIONS
            .iter()
            .any(|o| a.starts_with(*o))
            || (sub == "grep" && a.starts_with("-O"))
    }) {
        return Err(read_only_denied(format!("git {} {}", sub, opt)));
    }

    if sub == "branch" {
        // Positional arguments create branches unless they are --list patterns
        let listing = rest.iter().any(|a| *a == "-l" || *a == "--list");
        for arg in rest {
            let allowed = if arg.starts_with('-') {
                GIT_BRANCH_LISTING.contains(arg)
            } else {
                listing
            };
            if !allowed {
                return Err(read_only_denied(format!("git branch {}", arg)));
            }
        }
    }

    Ok(())
}

/// `tree -o FILE` writes its listing to a file
fn is_tree_output_flag(arg: &str) -> bool {
    arg.starts_with("-o") || (arg.starts_with('-') && !arg.starts_with("--") && arg.contains('o'))
}

fn format_output(stdout: &[u8], stderr: &[u8], code: Option<i32>) -> String {
    let mut parts = Vec::new();

    let stdout = String::from_utf8_lossy(stdout);
    if !stdout.trim().is_empty() {
        parts.push(format!("STDOUT:\n{}", stdout.trim()));
    }
    let stderr = String::from_utf8_lossy(stderr);
    if !stderr.trim().is_empty() {
        parts.push(format!("STDERR:\n{}", stderr.trim()));
    }

    let status = match code {
        Some(0) => "Exit code: 0 (success)".to_string(),
        Some(c) => format!("Exit code: {} (failed)", c),
        None => "Exit code: none (terminated by signal)".to_string(),
    };

    if parts.is_empty() {
        format!("Command executed successfully (no output)\n{}", status)
    } else {
        format!("{}\n{}", parts.join("\n\n"), status)
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        match self.policy {
            BashPolicy::Unrestricted => {
                "Execute a shell command in the workspace root. Returns stdout, stderr and the \
                 exit code. Use `read` rather than cat/head/tail for file contents."
            }
            BashPolicy::ReadOnly => {
                "Execute a read-only shell command in the workspace root: ls, find, pwd, tree, \
                 or git status/log/diff/show/ls-files/grep/blame/branch/rev-parse. Pipes, \
                 redirections and command chaining are rejected."
            }
        }
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    fn required_permission(&self) -> Option<Permission> {
        Some(Permission::ShellCommands)
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<String> {
        let params: Params = parse_params(args)?;

        if self.policy == BashPolicy::ReadOnly {
            check_read_only(&params.command)?;
        }

        tracing::info!(command = %params.command, "executing shell command");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&params.command)
            .current_dir(&ctx.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| BobError::tool(format!("Failed to spawn command: {}", e)))?;

        match timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => {
                let output = output?;
                Ok(format_output(&output.stdout, &output.stderr, output.status.code()))
            }
            Err(_) => {
                tracing::warn!(command = %params.command, "shell command timed out");
                Err(BobError::tool(format!(
                    "Command timed out after {} seconds",
                    self.timeout.as_secs()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_read_only_allowlist() {
        assert!(check_read_only("ls -la src").is_ok());
        assert!(check_read_only("git log --oneline -5").is_ok());
        assert!(check_read_only("find . -name '*.rs'").is_ok());

        assert!(check_read_only("rm -rf target").is_err());
        assert!(check_read_only("git commit -m x").is_err());
        assert!(check_read_only("ls; rm x").is_err());
        assert!(check_read_only("ls > out.txt").is_err());
        assert!(check_read_only("find . -delete").is_err());
        assert!(check_read_only("echo $(whoami)").is_err());
    }

    #[test]
    fn test_read_only_rejects_writing_flags() {
        assert!(check_read_only("git branch").is_ok());
        assert!(check_read_only("git branch -a").is_ok());
        assert!(check_read_only("git branch --show-current").is_ok());
        assert!(check_read_only("git branch --list feat*").is_ok());
        assert!(check_read_only("git branch -D main").is_err());
        assert!(check_read_only("git branch evil").is_err());
        assert!(check_read_only("git branch -m old new").is_err());

        assert!(check_read_only("git diff HEAD~1").is_ok());
        assert!(check_read_only("git diff --output=pwned.txt").is_err());
        assert!(check_read_only("git log -p --output pwned.txt").is_err());
        assert!(check_read_only("git diff --ext-diff").is_err());
        assert!(check_read_only("git grep -Ovim foo").is_err());

        assert!(check_read_only("tree -L 2").is_ok());
        assert!(check_read_only("tree -o pwned.txt").is_err());
        assert!(check_read_only("tree -ao pwned.txt").is_err());

        assert!(check_read_only("find . -fprint0 pwned.txt").is_err());
        assert!(check_read_only("find . -fls pwned.txt").is_err());
        assert!(check_read_only("find . -type f").is_ok());
    }

    #[test]
    fn test_format_output() {
        let out = format_output(b"hello\n", b"", Some(0));
        assert_eq!(out, "STDOUT:\nhello\nExit code: 0 (success)");

        let out = format_output(b"", b"", Some(2));
        assert!(out.starts_with("Command executed successfully (no output)"));
        assert!(out.ends_with("(failed)"));
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let ctx = ToolContext::new(dir.path(), CancellationToken::new());

        let out = BashTool::new(Duration::from_secs(10))
            .execute(json!({"command": "ls"}), &ctx)
            .await
            .unwrap();
        assert!(out.contains("marker.txt"));
        assert!(out.contains("(success)"));
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(dir.path(), CancellationToken::new());

        let err = BashTool::new(Duration::from_millis(200))
            .execute(json!({"command": "sleep 5"}), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_read_only_tool_rejects_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(dir.path(), CancellationToken::new());

        let err = BashTool::read_only(Duration::from_secs(10))
            .execute(json!({"command": "touch created.txt"}), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not allowed"));
        assert!(!dir.path().join("created.txt").exists());
    }
}
