//! reactant - a ReAct agent for the terminal

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ask_command, init_command, models_command, status_command, AskArgs};

/// reactant - ReAct agent over hosted and local chat models
#[derive(Parser)]
#[command(name = "reactant")]
#[command(about = "◆ A ReAct agent with tools and structured output")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the config file
    Init,
    /// Ask the agent a question
    Ask(AskArgs),
    /// Show resolved configuration
    Status,
    /// List known models and their capabilities
    Models,
}

#[tokio::main]
async fn main() {
    // a missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match &cli.command {
        Commands::Ask(args) if args.verbose => EnvFilter::new("debug"),
        _ => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let (name, result) = match cli.command {
        Commands::Init => ("Init", init_command().await),
        Commands::Ask(args) => ("Ask", ask_command(args).await),
        Commands::Status => ("Status", status_command().await),
        Commands::Models => ("Models", models_command()),
    };

    if let Err(e) = result {
        error!("{} failed: {:#}", name, e);
        std::process::exit(1);
    }
}
