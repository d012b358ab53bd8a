//! Supervisor that routes a conversation to specialist agents.
//!
//! The supervisor model sees one hand-off tool per agent
//! (`transfer_to_<agent>`). Calling one appends a confirmation tool
//! result, runs that agent over the full history and appends everything
//! it produced, followed by a `transfer_back_to_<supervisor>` call and its
//! result. Control then returns to the supervisor, which either hands off
//! again or answers with plain text.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::agent::{blockchain_expert, search_expert, Agent};
use crate::config::AgentsConfig;
use crate::error::AgentsError;
use crate::models::LanguageModel;
use crate::provider::{create_provider, ModelProvider, ProviderRequest, ToolDefinition};
use crate::tools::{
    blockchain_tools, search_tools, AgentToolParameters, CeloRpcClient, TavilyClient,
};
use crate::types::*;

pub const SUPERVISOR_NAME: &str = "main_supervisor";
pub const HANDOFF_PREFIX: &str = "transfer_to_";
pub const HANDBACK_PREFIX: &str = "transfer_back_to_";
/// Hand-offs allowed per invocation before the supervisor must answer.
pub const MAX_HANDOFFS: usize = 10;

const SUPERVISOR_PROMPT: &str = "You are a helpful assistant that coordinates between a blockchain expert and a search expert. \
Use the blockchain_expert for questions about the Celo blockchain, including fetching the latest \
block number, block information, or general blockchain statistics. \
Use the search_expert for questions that require searching the web for information or recent news. \
Carefully analyze each user query to determine which agent(s) to invoke. \
For queries that might benefit from both agents, you can use them in sequence. \
Always prioritize providing accurate and helpful information to the user.";

/// Anything that can advance a conversation by one user turn.
#[async_trait]
pub trait AgentSystem: Send + Sync {
    /// Take the thread's messages (ending with the new user message) and
    /// return the complete updated message list.
    async fn invoke(
        &self,
        messages: Vec<ModelMessage>,
        thread_id: &str,
    ) -> Result<Vec<ModelMessage>, AgentsError>;
}

/// Coordinates the specialist agents.
pub struct Supervisor {
    name: String,
    prompt: String,
    provider: Arc<dyn ModelProvider>,
    agents: Vec<Agent>,
    settings: GenerationSettings,
    max_handoffs: usize,
}

impl Supervisor {
    pub fn new(provider: Arc<dyn ModelProvider>, agents: Vec<Agent>) -> Self {
        Self {
            name: SUPERVISOR_NAME.to_string(),
            prompt: SUPERVISOR_PROMPT.to_string(),
            provider,
            agents,
            settings: GenerationSettings::default(),
            max_handoffs: MAX_HANDOFFS,
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_max_handoffs(mut self, max_handoffs: usize) -> Self {
        self.max_handoffs = max_handoffs;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// The hand-off tools offered to the supervisor model.
    pub fn handoff_tools(&self) -> Vec<ToolDefinition> {
        self.agents
            .iter()
            .map(|agent| ToolDefinition {
                name: format!("{HANDOFF_PREFIX}{}", agent.name()),
                description: format!("Ask agent '{}' for help", agent.name()),
                parameters: AgentToolParameters::empty().schema,
            })
            .collect()
    }

    fn find_agent(&self, tool_name: &str) -> Option<&Agent> {
        let target = tool_name.strip_prefix(HANDOFF_PREFIX)?;
        self.agents.iter().find(|a| a.name() == target)
    }

    /// The call/result pair that returns control from `agent` to the supervisor.
    fn handback(&self, agent: &str, handoff_id: &str) -> [ModelMessage; 2] {
        let call = AgentToolCall {
            id: format!("{handoff_id}_back"),
            name: format!("{HANDBACK_PREFIX}{}", self.name),
            arguments: json!({}),
        };
        let call_id = call.id.clone();
        let result = Value::String(format!("Successfully transferred back to {}", self.name));
        [
            ModelMessage::assistant_tool_calls("", vec![call]).with_name(agent),
            ModelMessage::tool_result(call_id, result, false).with_name(agent),
        ]
    }

    async fn ask(
        &self,
        messages: &[ModelMessage],
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<crate::provider::ProviderResponse, AgentsError> {
        let mut request_messages = Vec::with_capacity(messages.len() + 1);
        request_messages.push(ModelMessage::system(self.prompt.clone()));
        request_messages.extend(messages.iter().filter(|m| m.role != Role::System).cloned());

        let request = ProviderRequest {
            messages: request_messages,
            settings: self.settings.clone(),
            tools,
        };
        self.provider.generate_text(&request).await
    }

    /// Run the supervisor loop over `messages` and return the extended list.
    ///
    /// At most `max_handoffs` tool-call turns are processed. Past the cap the
    /// supervisor is asked without tools and its text ends the turn, even if
    /// it still requests a transfer.
    pub async fn run(&self, mut messages: Vec<ModelMessage>) -> Result<Vec<ModelMessage>, AgentsError> {
        let tools = self.handoff_tools();
        let mut handoffs = 0;

        loop {
            let capped = handoffs >= self.max_handoffs || tools.is_empty();
            let offered = (!capped).then(|| tools.clone());
            let response = self.ask(&messages, offered).await?;

            if response.tool_calls.is_empty() || capped {
                if !response.tool_calls.is_empty() {
                    warn!(
                        supervisor = %self.name,
                        handoffs,
                        ignored = response.tool_calls.len(),
                        "Hand-off cap reached; ignoring tool calls"
                    );
                }
                debug!(supervisor = %self.name, handoffs, "Supervisor answered");
                messages.push(ModelMessage::assistant(response.text).with_name(self.name.clone()));
                return Ok(messages);
            }

            messages.push(
                ModelMessage::assistant_tool_calls(response.text, response.tool_calls.clone())
                    .with_name(self.name.clone()),
            );

            // Only the first valid hand-off in a turn runs; every call still gets a result.
            let mut selected: Option<(&Agent, String)> = None;
            for call in &response.tool_calls {
                let (result, is_error) = match self.find_agent(&call.name) {
                    Some(agent) if selected.is_none() => {
                        selected = Some((agent, call.id.clone()));
                        (
                            Value::String(format!("Successfully transferred to {}", agent.name())),
                            false,
                        )
                    }
                    Some(agent) => (
                        json!({"error": format!(
                            "Transfer to {} skipped: only one transfer per turn",
                            agent.name()
                        )}),
                        true,
                    ),
                    None => {
                        warn!(tool = %call.name, "Supervisor called an unknown agent");
                        (json!({"error": format!("Unknown agent tool '{}'", call.name)}), true)
                    }
                };
                messages.push(
                    ModelMessage::tool_result(call.id.clone(), result, is_error)
                        .with_name(self.name.clone()),
                );
            }

            handoffs += 1;
            if let Some((agent, call_id)) = selected {
                info!(supervisor = %self.name, agent = agent.name(), handoffs, "Handing off");
                let produced = agent.run(&messages).await?;
                messages.extend(produced);
                messages.extend(self.handback(agent.name(), &call_id));
            }
        }
    }
}

#[async_trait]
impl AgentSystem for Supervisor {
    async fn invoke(
        &self,
        messages: Vec<ModelMessage>,
        thread_id: &str,
    ) -> Result<Vec<ModelMessage>, AgentsError> {
        debug!(thread_id, messages = messages.len(), "Invoking supervisor");
        self.run(messages).await
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("name", &self.name)
            .field("agents", &self.agents)
            .field("max_handoffs", &self.max_handoffs)
            .finish()
    }
}

/// Build the full system from configuration: one model shared by the
/// supervisor and both experts.
pub fn build_agent_system(config: &AgentsConfig) -> Result<Supervisor, AgentsError> {
    config.validate()?;

    let model: LanguageModel = config.model.parse()?;
    let provider: Arc<dyn ModelProvider> = Arc::from(create_provider(&model, config)?);
    let settings = GenerationSettings::builder()
        .temperature(config.temperature)
        .build();

    let rpc = Arc::new(CeloRpcClient::new(
        config.celo_rpc_url.clone(),
        config.celo_chain_id,
    ));
    let tavily_key = config
        .tavily_api_key
        .clone()
        .ok_or_else(|| AgentsError::Configuration("Missing TAVILY_API_KEY".into()))?;
    let mut tavily = TavilyClient::new(tavily_key);
    if let Some(base_url) = &config.tavily_base_url {
        tavily = tavily.with_base_url(base_url.clone());
    }

    let agents = vec![
        blockchain_expert(provider.clone(), blockchain_tools(rpc)).with_settings(settings.clone()),
        search_expert(provider.clone(), search_tools(Arc::new(tavily))).with_settings(settings.clone()),
    ];

    info!(model = %model, agents = agents.len(), "Agent system built");
    Ok(Supervisor::new(provider, agents).with_settings(settings))
}
