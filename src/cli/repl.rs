//! Interactive REPL for Bob
//!
//! Provides the main user interaction loop. While a run is in flight the
//! REPL keeps answering the agent's questions and watches for Ctrl+C.

use futures::StreamExt;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::agent::Agent;
use crate::cli::commands::{handle_command, CommandResult};
use crate::cli::console::{interpret_answer, render_question, ConsoleObserver};
use crate::core::{BobError, Config, Result, TerminationReason, Workspace};
use crate::llm::create_provider;
use crate::tools::PendingQuestion;

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    agent: Agent,
    questions: mpsc::UnboundedReceiver<PendingQuestion>,
    lines: Lines<BufReader<Stdin>>,
    streaming: bool,
}

impl Repl {
    /// Create a REPL around an existing session
    pub fn new(mut agent: Agent) -> Result<Self> {
        let questions = agent
            .take_question_receiver()
            .ok_or_else(|| BobError::Other("question receiver already taken".to_string()))?;

        Ok(Self {
            agent,
            questions,
            lines: BufReader::new(tokio::io::stdin()).lines(),
            streaming: false,
        })
    }

    /// Create a REPL with custom configuration in the current directory
    pub fn with_config(config: Config) -> Result<Self> {
        let provider = create_provider(&config)?;
        let observer = Arc::new(ConsoleObserver::new(config.agent.debug));
        let agent = Agent::new(config, provider, Workspace::current(), observer)?;
        Self::new(agent)
    }

    /// Answer with a single streamed, tool-free response
    pub fn set_streaming(&mut self, streaming: bool) {
        self.streaming = streaming;
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Run one prompt and return (non-interactive mode)
    pub async fn run_once(&mut self, prompt: &str) -> Result<()> {
        if self.streaming {
            self.stream_turn(prompt).await
        } else {
            self.run_turn(prompt).await
        }
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner().await;

        loop {
            print!("You: ");
            io::stdout().flush()?;

            let input = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            };

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, &mut self.agent).await {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Clear) => {
                    println!("Conversation cleared.\n");
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                }
                Ok(CommandResult::Continue(input)) => {
                    let turn = if self.streaming {
                        self.stream_turn(&input).await
                    } else {
                        self.run_turn(&input).await
                    };
                    if let Err(e) = turn {
                        eprintln!("\nError: {}\n", e);
                    }
                }
                Err(e) => {
                    eprintln!("Command error: {}\n", e);
                }
            }
        }

        Ok(())
    }

    /// One buffered run: drive the loop while serving questions and Ctrl+C
    async fn run_turn(&mut self, input: &str) -> Result<()> {
        let cancel = CancellationToken::new();
        let run = self.agent.process(input, &cancel);
        tokio::pin!(run);

        let outcome = loop {
            tokio::select! {
                outcome = &mut run => break outcome?,
                Some(pending) = self.questions.recv() => {
                    answer_question(&mut self.lines, pending, &cancel).await;
                }
                _ = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                    println!("\nCancelling...");
                    cancel.cancel();
                }
            }
        };

        match outcome.reason {
            TerminationReason::Cancelled => println!("\n(cancelled)\n"),
            TerminationReason::IterationLimit => {
                println!("\nBob (stopped after {} iterations):\n{}\n", outcome.iterations, outcome.text())
            }
            _ => println!("\nBob:\n{}\n", outcome.text()),
        }
        Ok(())
    }

    /// One streamed run printing text as it arrives
    async fn stream_turn(&mut self, input: &str) -> Result<()> {
        let mut stream = self.agent.stream(input).await?;

        println!("\nBob:");
        loop {
            tokio::select! {
                chunk = stream.next() => match chunk {
                    Some(Ok(text)) => {
                        print!("{}", text);
                        io::stdout().flush()?;
                    }
                    Some(Err(e)) => {
                        eprintln!("\nStream error: {}", e);
                        break;
                    }
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    println!("\n(cancelled)");
                    break;
                }
            }
        }
        println!("\n");

        // Keep whatever arrived, even after an interruption
        self.agent.finish_stream(stream);
        Ok(())
    }

    /// Print the startup banner
    async fn print_banner(&self) {
        let status = self.agent.status().await;

        println!(
            r#"
╔═══════════════════════════════════════╗
║   Bob - Agentic Coding Assistant      ║
╚═══════════════════════════════════════╝
"#
        );
        println!("Provider:   {} ({})", status.provider, status.model);
        println!(
            "Workspace:  {}{}",
            status.workspace,
            if status.workspace_initialized {
                ""
            } else {
                " (run `init` to save conversations and permissions)"
            }
        );
        println!();
        println!("Commands: help, status, permissions, init, clear, exit");
        println!("─────────────────────────────────────────");
    }
}

/// Show a question, read the reply and resume the waiting tool.
///
/// Ctrl+C or end of input cancels the run instead of answering.
async fn answer_question(
    lines: &mut Lines<BufReader<Stdin>>,
    pending: PendingQuestion,
    cancel: &CancellationToken,
) {
    print!("{}> ", render_question(pending.question()));
    let _ = io::stdout().flush();

    let reply = tokio::select! {
        line = lines.next_line() => line.ok().flatten(),
        _ = tokio::signal::ctrl_c() => None,
        _ = cancel.cancelled() => None,
    };

    match reply {
        Some(reply) => {
            let answer = interpret_answer(pending.question(), &reply);
            if !pending.resolve(answer) {
                tracing::debug!("question was withdrawn before it was answered");
            }
        }
        None => {
            println!("\nCancelling...");
            cancel.cancel();
        }
    }
}
