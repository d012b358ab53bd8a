//! Google Gemini API provider.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::AgentsError;
use crate::types::*;
use crate::util::retry::RetryPolicy;

use super::format::tool_result_to_object;
use super::http::{google_headers, shared_client, status_to_error};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleProvider {
    model_id: String,
    api_key: String,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl GoogleProvider {
    pub fn new(model_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Point the provider at another endpoint (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub(crate) fn build_request_body(&self, request: &ProviderRequest) -> Value {
        let mut system_parts: Vec<Value> = Vec::new();
        let mut contents: Vec<(&'static str, Vec<Value>)> = Vec::new();
        // Gemini names function responses by function, not by call id.
        let mut call_names: HashMap<&str, &str> = HashMap::new();

        for msg in &request.messages {
            let (role, parts) = match msg.role {
                Role::System => {
                    system_parts.push(json!({ "text": msg.text() }));
                    continue;
                }
                Role::User => ("user", text_parts(msg)),
                Role::Assistant => {
                    let mut parts = text_parts(msg);
                    for call in msg.tool_calls() {
                        call_names.insert(call.id.as_str(), call.name.as_str());
                        parts.push(json!({
                            "functionCall": { "name": call.name, "args": call.arguments }
                        }));
                    }
                    ("model", parts)
                }
                Role::Tool => {
                    let parts = msg
                        .tool_results()
                        .into_iter()
                        .map(|tr| {
                            let name = call_names
                                .get(tr.tool_call_id.as_str())
                                .copied()
                                .unwrap_or(tr.tool_call_id.as_str());
                            json!({
                                "functionResponse": {
                                    "name": name,
                                    "response": tool_result_to_object(&tr.result),
                                }
                            })
                        })
                        .collect();
                    ("user", parts)
                }
            };

            if parts.is_empty() {
                continue;
            }
            match contents.last_mut() {
                Some((last_role, last_parts)) if *last_role == role => last_parts.extend(parts),
                _ => contents.push((role, parts)),
            }
        }

        let contents: Vec<Value> = contents
            .into_iter()
            .map(|(role, parts)| json!({ "role": role, "parts": parts }))
            .collect();

        let mut body = serde_json::Map::new();
        body.insert("contents".into(), Value::Array(contents));

        if !system_parts.is_empty() {
            body.insert("systemInstruction".into(), json!({ "parts": system_parts }));
        }

        let mut gen_config = serde_json::Map::new();
        if let Some(max) = request.settings.max_tokens {
            gen_config.insert("maxOutputTokens".into(), max.into());
        }
        if let Some(temp) = request.settings.temperature {
            gen_config.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = request.settings.top_p {
            gen_config.insert("topP".into(), top_p.into());
        }
        if let Some(ref stops) = request.settings.stop_sequences {
            gen_config.insert("stopSequences".into(), json!(stops));
        }
        if !gen_config.is_empty() {
            body.insert("generationConfig".into(), Value::Object(gen_config));
        }

        if let Some(ref tools) = request.tools {
            if !tools.is_empty() {
                let fn_decls: Vec<Value> = tools
                    .iter()
                    .map(|t| {
                        let mut decl = json!({
                            "name": t.name,
                            "description": t.description,
                        });
                        if has_properties(&t.parameters) {
                            decl["parameters"] = t.parameters.clone();
                        }
                        decl
                    })
                    .collect();
                body.insert("tools".into(), json!([{ "functionDeclarations": fn_decls }]));
            }
        }

        Value::Object(body)
    }

    async fn send(&self, body: &Value) -> Result<GeminiResponse, AgentsError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model_id);

        let resp = shared_client()
            .post(&url)
            .headers(google_headers(&self.api_key))
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, AgentsError> {
        let body = self.build_request_body(request);

        debug!(model = %self.model_id, messages = request.messages.len(), "Google generate_text");

        let data = self.retry_policy.execute(|| self.send(&body)).await?;

        let candidate = data.candidates.into_iter().next().ok_or_else(|| {
            let reason = data
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            AgentsError::api(200, format!("Empty Gemini response: {reason}"))
        })?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(fc) = part.function_call {
                tool_calls.push(AgentToolCall {
                    id: fc.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                    name: fc.name,
                    arguments: fc.args.unwrap_or(Value::Object(Default::default())),
                });
            }
        }

        let finish_reason = if !tool_calls.is_empty() {
            Some(FinishReason::ToolCalls)
        } else {
            match candidate.finish_reason.as_deref() {
                Some("STOP") => Some(FinishReason::Stop),
                Some("MAX_TOKENS") => Some(FinishReason::Length),
                Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") => {
                    Some(FinishReason::ContentFilter)
                }
                Some(_) => Some(FinishReason::Error),
                None => None,
            }
        };

        let usage = data
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default();

        Ok(ProviderResponse {
            text,
            usage,
            tool_calls,
            finish_reason,
        })
    }
}

fn text_parts(msg: &ModelMessage) -> Vec<Value> {
    let text = msg.text();
    if text.is_empty() {
        Vec::new()
    } else {
        vec![json!({ "text": text })]
    }
}

fn has_properties(schema: &Value) -> bool {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|props| !props.is_empty())
}

// Internal Gemini response types

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    id: Option<String>,
    name: String,
    args: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ToolDefinition;
    use pretty_assertions::assert_eq;

    fn request(messages: Vec<ModelMessage>) -> ProviderRequest {
        ProviderRequest {
            messages,
            settings: GenerationSettings::default(),
            tools: None,
        }
    }

    #[test]
    fn system_messages_become_system_instruction() {
        let provider = GoogleProvider::new("gemini-2.5-flash", "k");
        let body = provider.build_request_body(&request(vec![
            ModelMessage::system("be brief"),
            ModelMessage::user("hi"),
        ]));
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
        assert_eq!(body["contents"][0]["role"], "user");
    }

    #[test]
    fn function_responses_use_call_name_and_group() {
        let provider = GoogleProvider::new("gemini-2.5-flash", "k");
        let calls = vec![
            AgentToolCall {
                id: "a".into(),
                name: "get_latest_block_number".into(),
                arguments: json!({}),
            },
            AgentToolCall {
                id: "b".into(),
                name: "get_celo_stats".into(),
                arguments: json!({}),
            },
        ];
        let body = provider.build_request_body(&request(vec![
            ModelMessage::user("stats?"),
            ModelMessage::assistant_tool_calls("", calls),
            ModelMessage::tool_result("a", json!(123), false),
            ModelMessage::tool_result("b", json!({"chain_id": 42220}), false),
        ]));

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(
            contents[1]["parts"][0]["functionCall"]["name"],
            "get_latest_block_number"
        );
        let responses = contents[2]["parts"].as_array().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(
            responses[0]["functionResponse"],
            json!({"name": "get_latest_block_number", "response": {"result": 123}})
        );
        assert_eq!(responses[1]["functionResponse"]["name"], "get_celo_stats");
    }

    #[test]
    fn parameterless_tools_omit_schema() {
        let provider = GoogleProvider::new("gemini-2.5-flash", "k");
        let mut req = request(vec![ModelMessage::user("hi")]);
        req.settings.temperature = Some(0.0);
        req.tools = Some(vec![ToolDefinition {
            name: "get_celo_stats".into(),
            description: "stats".into(),
            parameters: json!({"type": "object", "properties": {}, "required": []}),
        }]);
        let body = provider.build_request_body(&req);
        let decl = &body["tools"][0]["functionDeclarations"][0];
        assert_eq!(decl["name"], "get_celo_stats");
        assert!(decl.get("parameters").is_none());
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
    }
}
