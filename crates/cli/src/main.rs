//! Planguard CLI - Main Entry Point
//!
//! Validates AI-authored test plans against the guardrails and runs their
//! scenarios in a real browser.

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{run, scenarios, validate};

/// Planguard - guardrailed execution of AI-authored test plans
#[derive(Parser)]
#[command(name = "planguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a plan against the schema and heuristic guardrails
    Validate(validate::ValidateArgs),

    /// List the scenarios in a plan
    Scenarios(scenarios::ScenariosArgs),

    /// Execute scenarios from a plan
    Run(run::RunArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; usage errors exit 1.
            let code = if e.use_stderr() { 1 } else { 0 };
            e.print()?;
            std::process::exit(code);
        }
    };

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let success = match cli.command {
        Commands::Validate(args) => validate::execute(args).await?,
        Commands::Scenarios(args) => scenarios::execute(args).await?,
        Commands::Run(args) => run::execute(args).await?,
    };

    if !success {
        std::process::exit(1);
    }

    Ok(())
}
