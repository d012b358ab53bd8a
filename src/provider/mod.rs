//! Model provider trait and implementations.

pub mod format;
pub mod google;
pub mod http;

use async_trait::async_trait;

use crate::config::AgentsConfig;
use crate::error::AgentsError;
use crate::models::LanguageModel;
use crate::types::{AgentToolCall, FinishReason, GenerationSettings, ModelMessage, Usage};

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<ModelMessage>,
    pub settings: GenerationSettings,
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Response from a provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Usage,
    pub tool_calls: Vec<AgentToolCall>,
    pub finish_reason: Option<FinishReason>,
}

/// Core trait implemented by all model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "google").
    fn provider_name(&self) -> &str;

    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Generate text (non-streaming).
    async fn generate_text(&self, request: &ProviderRequest)
        -> Result<ProviderResponse, AgentsError>;
}

/// Create a provider for the given model, using the provided config.
pub fn create_provider(
    model: &LanguageModel,
    config: &AgentsConfig,
) -> Result<Box<dyn ModelProvider>, AgentsError> {
    match model {
        LanguageModel::Google(model_id) => {
            let api_key = config
                .google_api_key
                .clone()
                .ok_or_else(|| AgentsError::Authentication("Missing GOOGLE_API_KEY".into()))?;
            let mut provider = google::GoogleProvider::new(model_id.clone(), api_key);
            if let Some(base_url) = &config.google_base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Box::new(provider))
        }
        LanguageModel::Custom { provider, .. } => Err(AgentsError::ModelNotFound(format!(
            "No built-in provider for '{provider}'"
        ))),
    }
}
