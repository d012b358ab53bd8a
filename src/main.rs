//! celo-agents binary entry point.

use std::sync::Arc;

use celo_agents::agent::{build_agent_system, AgentSystem};
use celo_agents::cli::{ChatArgs, Cli, Commands, ServeArgs};
use celo_agents::config::AgentsConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse_args();
    let config = AgentsConfig::from_env();

    let result = match cli.command {
        Commands::Serve(args) => handle_serve(config, args).await,
        Commands::Chat(args) => handle_chat(config, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn handle_serve(
    mut config: AgentsConfig,
    args: ServeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    tracing::info!("Initializing multi-agent system...");
    let system: Arc<dyn AgentSystem> = Arc::new(build_agent_system(&config)?);
    tracing::info!("Multi-agent system initialized");

    celo_agents::server::serve(&config, system).await?;
    Ok(())
}

async fn handle_chat(
    mut config: AgentsConfig,
    args: ChatArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(model) = args.model {
        config.model = model;
    }

    println!("\n\x1b[1;36m=== Multi-Agent System with Celo Blockchain and Web Search ===\x1b[0m");
    let system: Arc<dyn AgentSystem> = Arc::new(build_agent_system(&config)?);
    let thread_id = args
        .thread_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    celo_agents::cli::run_chat(system, thread_id).await?;
    Ok(())
}
