//! Configuration loaded from the environment (and `.env` when present).

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AgentsError;

pub const DEFAULT_MODEL: &str = "google:gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f64 = 0.0;
pub const DEFAULT_CELO_RPC_URL: &str = "https://forno.celo.org";
/// Celo mainnet.
pub const DEFAULT_CELO_CHAIN_ID: u64 = 42220;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(120);

/// Runtime configuration for the agent system and the HTTP API.
///
/// Resolution order: explicit setters > environment > `.env` > defaults.
#[derive(Clone)]
pub struct AgentsConfig {
    pub google_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub google_base_url: Option<String>,
    pub tavily_base_url: Option<String>,
    pub celo_rpc_url: String,
    pub celo_chain_id: u64,
    pub model: String,
    pub temperature: f64,
    pub host: String,
    pub port: u16,
    pub agent_timeout: Duration,
}

impl fmt::Debug for AgentsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentsConfig")
            .field("google_api_key", &self.google_api_key.as_ref().map(|_| ".."))
            .field("tavily_api_key", &self.tavily_api_key.as_ref().map(|_| ".."))
            .field("google_base_url", &self.google_base_url)
            .field("tavily_base_url", &self.tavily_base_url)
            .field("celo_rpc_url", &self.celo_rpc_url)
            .field("celo_chain_id", &self.celo_chain_id)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("agent_timeout", &self.agent_timeout)
            .finish()
    }
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentsConfig {
    /// Config with defaults and no credentials.
    pub fn new() -> Self {
        Self {
            google_api_key: None,
            tavily_api_key: None,
            google_base_url: None,
            tavily_base_url: None,
            celo_rpc_url: DEFAULT_CELO_RPC_URL.to_string(),
            celo_chain_id: DEFAULT_CELO_CHAIN_ID,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            agent_timeout: DEFAULT_AGENT_TIMEOUT,
        }
    }

    /// Load from `.env` (ignored if absent) and the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::new();

        config.google_api_key = get("GOOGLE_API_KEY").or_else(|| get("GEMINI_API_KEY"));
        config.tavily_api_key = get("TAVILY_API_KEY");
        config.google_base_url = get("GOOGLE_BASE_URL");
        config.tavily_base_url = get("TAVILY_BASE_URL");

        if let Some(url) = get("CELO_RPC_URL") {
            config.celo_rpc_url = url;
        }
        if let Some(id) = get("CELO_CHAIN_ID").and_then(|v| v.parse().ok()) {
            config.celo_chain_id = id;
        }
        if let Some(model) = get("AGENTS_MODEL") {
            config.model = model;
        }
        if let Some(temp) = get("AGENTS_TEMPERATURE").and_then(|v| v.parse().ok()) {
            config.temperature = temp;
        }
        if let Some(host) = get("API_HOST") {
            config.host = host;
        }
        if let Some(port) = get("API_PORT").and_then(|v| v.parse().ok()) {
            config.port = port;
        }
        if let Some(secs) = get("AGENT_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.agent_timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Names of required variables that are not set.
    pub fn missing_vars(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.google_api_key.is_none() {
            missing.push("GOOGLE_API_KEY");
        }
        if self.tavily_api_key.is_none() {
            missing.push("TAVILY_API_KEY");
        }
        missing
    }

    /// Presence-only validation of the required credentials.
    pub fn validate(&self) -> Result<(), AgentsError> {
        let missing = self.missing_vars();
        if missing.is_empty() {
            return Ok(());
        }
        Err(AgentsError::Configuration(format!(
            "Missing required environment variables: {}",
            missing.join(", ")
        )))
    }

    /// Socket address the HTTP API binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr, AgentsError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AgentsError::Configuration(format!("Invalid API address: {e}")))
    }
}
