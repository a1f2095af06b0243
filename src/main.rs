//! Bob - Agentic Coding Assistant
//!
//! Main entry point for the CLI application.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bob::{Config, Repl};

/// Bob - Agentic Coding Assistant
#[derive(Parser, Debug)]
#[command(name = "bob")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (overrides config and BOB_MODEL)
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Maximum generate/dispatch iterations per run
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,

    /// Stream a tool-free answer instead of running tools
    #[arg(long)]
    stream: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(ref model) = args.model {
        config.provider.model = model.clone();
    }

    if let Some(max_iterations) = args.max_iterations {
        config.agent.max_iterations = max_iterations;
    }

    if args.debug {
        config.agent.debug = true;
    }

    let default_level = if config.agent.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut repl = Repl::with_config(config)?;
    repl.set_streaming(args.stream);

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        repl.run_once(&prompt).await?;
        return Ok(());
    }

    // Interactive REPL mode
    repl.run().await?;

    Ok(())
}
