//! Terminal rendering of agent activity and pending questions

use async_trait::async_trait;
use std::io::{self, Write};

use crate::agent::AgentObserver;
use crate::core::{Message, ToolCall, ToolResult};
use crate::tools::Question;

/// Prints tool activity as the loop runs
#[derive(Debug, Clone, Default)]
pub struct ConsoleObserver {
    verbose: bool,
}

impl ConsoleObserver {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

#[async_trait]
impl AgentObserver for ConsoleObserver {
    fn on_history_changed(&self, _conversation_id: &str, _history: &[Message]) {}

    fn on_tool_calls(&self, calls: &[ToolCall]) {
        for call in calls {
            println!("  → {}({})", call.name, summarize_arguments(&call.arguments));
        }
        let _ = io::stdout().flush();
    }

    fn on_tool_results(&self, results: &[ToolResult]) {
        for result in results {
            if result.success {
                println!("  ✓ {}", result.tool_name);
                if self.verbose {
                    println!("{}", indent(&truncate(&result.output, 800)));
                }
            } else {
                let first = result.output.lines().next().unwrap_or("");
                println!("  ✗ {}: {}", result.tool_name, truncate(first, 120));
            }
        }
    }

    async fn on_plan_mode_exit(&self) -> String {
        println!("\n── Plan mode exited ──\n");
        "Plan mode exited successfully. Ready to implement.".to_string()
    }
}

/// Render a question with numbered options
pub fn render_question(question: &Question) -> String {
    let mut out = String::new();
    if question.header.is_empty() {
        out.push_str(&format!("\n? {}\n", question.question));
    } else {
        out.push_str(&format!("\n[{}] {}\n", question.header, question.question));
    }
    for (i, option) in question.options.iter().enumerate() {
        if option.description.is_empty() {
            out.push_str(&format!("  {}. {}\n", i + 1, option.label));
        } else {
            out.push_str(&format!("  {}. {} - {}\n", i + 1, option.label, option.description));
        }
    }
    if question.multi_select {
        out.push_str("  (choose one or more, e.g. 1,3)\n");
    }
    out
}

/// Map a typed reply to the answer text.
///
/// Option numbers become option labels. Anything else is a free-text answer.
pub fn interpret_answer(question: &Question, input: &str) -> String {
    let input = input.trim();
    if question.options.is_empty() {
        return input.to_string();
    }

    let picks: Option<Vec<&str>> = input
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| question.options.get(i))
                .map(|o| o.label.as_str())
        })
        .collect();

    match picks {
        Some(labels) if labels.len() == 1 || (question.multi_select && !labels.is_empty()) => {
            labels.join(", ")
        }
        _ => input.to_string(),
    }
}

fn summarize_arguments(arguments: &serde_json::Value) -> String {
    match arguments.as_object() {
        Some(map) => map
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("{}={}", k, truncate(value.lines().next().unwrap_or(""), 60))
            })
            .collect::<Vec<_>>()
            .join(", "),
        None => truncate(&arguments.to_string(), 60),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", s.chars().take(max).collect::<String>())
    } else {
        s.to_string()
    }
}

fn indent(s: &str) -> String {
    s.lines()
        .map(|l| format!("    {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}
