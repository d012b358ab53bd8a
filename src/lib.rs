//! Multi-agent assistant for the Celo blockchain and web search.
//!
//! A supervisor model routes each user turn to a blockchain expert (Celo
//! JSON-RPC tools) or a search expert (Tavily tools), and an HTTP API keeps
//! per-thread conversation history in memory.
//!
//! ```no_run
//! use std::sync::Arc;
//! use celo_agents::agent::{build_agent_system, AgentSystem};
//! use celo_agents::config::AgentsConfig;
//! use celo_agents::types::ModelMessage;
//!
//! # async fn example() -> celo_agents::error::Result<()> {
//! let config = AgentsConfig::from_env();
//! let system: Arc<dyn AgentSystem> = Arc::new(build_agent_system(&config)?);
//! let messages = system
//!     .invoke(vec![ModelMessage::user("What is the latest Celo block?")], "demo")
//!     .await?;
//! println!("{}", messages.last().map(|m| m.text()).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod generation;
pub mod models;
pub mod prelude;
pub mod provider;
pub mod server;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
