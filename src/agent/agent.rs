//! ReAct-style sub-agents: a model, a system prompt and a tool set.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::AgentsError;
use crate::generation::generate_text;
use crate::provider::ModelProvider;
use crate::tools::tool::Tool;
use crate::types::*;

pub const BLOCKCHAIN_EXPERT: &str = "blockchain_expert";
pub const SEARCH_EXPERT: &str = "search_expert";

const BLOCKCHAIN_PROMPT: &str = "You are a blockchain expert specialized in Celo blockchain operations. \
You have access to tools that allow you to fetch data from the Celo blockchain. \
When asked about blockchain data, always use the appropriate tool to fetch real-time data. \
Do not make up information about blockchain state - always use tools to fetch current data. \
Explain the blockchain concepts and data in a clear, accessible way.";

const SEARCH_PROMPT: &str = "You are a web search expert with access to real-time internet information. \
You have access to tools that allow you to search the web for information and recent news. \
When asked about current events, trends, or any information that might require up-to-date \
knowledge, always use the appropriate search tool to find reliable information. \
For general information use search_web, and for recent events use search_news. \
Never make up information - if you don't know or can't find the answer, say so. \
Present information in a clear, concise manner, citing sources when appropriate.";

/// A named agent that answers by running the tool loop over a conversation.
pub struct Agent {
    name: String,
    prompt: String,
    tools: Vec<Arc<dyn Tool>>,
    provider: Arc<dyn ModelProvider>,
    settings: GenerationSettings,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        prompt: impl Into<String>,
        provider: Arc<dyn ModelProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            tools: Vec::new(),
            provider,
            settings: GenerationSettings::default(),
        }
    }

    /// Add tools.
    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Set generation settings.
    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Run the agent over `history` and return only the messages it produced,
    /// each tagged with the agent's name.
    ///
    /// System messages already in the history are replaced by this agent's
    /// own prompt.
    pub async fn run(&self, history: &[ModelMessage]) -> Result<Vec<ModelMessage>, AgentsError> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ModelMessage::system(self.prompt.clone()));
        messages.extend(history.iter().filter(|m| m.role != Role::System).cloned());
        let prefix = messages.len();

        debug!(agent = %self.name, history = history.len(), "Agent run");
        let result = generate_text(
            self.provider.as_ref(),
            messages,
            self.settings.clone(),
            &self.tools,
        )
        .await?;

        let tool_calls: usize = result.steps.iter().map(|s| s.tool_calls.len()).sum();
        info!(agent = %self.name, steps = result.steps.len(), tool_calls, "Agent finished");

        Ok(result
            .messages
            .into_iter()
            .skip(prefix)
            .map(|m| m.with_name(self.name.clone()))
            .collect())
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("provider", &self.provider.provider_name())
            .field("model", &self.provider.model_id())
            .finish()
    }
}

/// The Celo blockchain specialist.
pub fn blockchain_expert(provider: Arc<dyn ModelProvider>, tools: Vec<Arc<dyn Tool>>) -> Agent {
    Agent::new(BLOCKCHAIN_EXPERT, BLOCKCHAIN_PROMPT, provider).with_tools(tools)
}

/// The web and news search specialist.
pub fn search_expert(provider: Arc<dyn ModelProvider>, tools: Vec<Arc<dyn Tool>>) -> Agent {
    Agent::new(SEARCH_EXPERT, SEARCH_PROMPT, provider).with_tools(tools)
}
