//! TaskPilot CLI: the main entry point.
//!
//! Commands:
//! - `init`: Write the default config and create the workspace
//! - `run`: Run the agent on one prompt
//! - `flow`: Plan a prompt and run the plan step by step
//! - `serve`: Start the HTTP gateway
//! - `tools`: List the built-in tools

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "taskpilot",
    about = "TaskPilot: a tool-calling agent and plan orchestrator",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and workspace
    Init,

    /// Run the agent on a single prompt
    Run {
        /// The prompt; read from stdin when omitted
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Create a plan for a prompt and execute it step by step
    Flow {
        /// The prompt; read from stdin when omitted
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long, env = "TASKPILOT_PORT")]
        port: Option<u16>,
    },

    /// List the built-in tools
    Tools,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Run { prompt } => commands::run::run(prompt).await?,
        Commands::Flow { prompt } => commands::flow::run(prompt).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Tools => commands::tools::run().await?,
    }

    Ok(())
}
