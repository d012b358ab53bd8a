//! Axum route handlers for the chat API.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::error::ApiError;
use crate::agent::{AgentSystem, ThreadStore};
use crate::provider::format::tool_result_to_string;
use crate::types::{ModelMessage, Role};
use crate::util::timeout::with_timeout;

pub const API_VERSION: &str = "1.0.0";
const NO_RESPONSE: &str = "No response generated";

pub struct AppState {
    pub system: Option<Arc<dyn AgentSystem>>,
    pub threads: ThreadStore,
    pub agent_timeout: Duration,
}

/// A message as shown to API clients.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApiMessage {
    pub role: &'static str,
    pub content: String,
    pub timestamp: String,
}

impl From<&ModelMessage> for ApiMessage {
    fn from(message: &ModelMessage) -> Self {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System | Role::Tool => "system",
        };
        let content = match message.role {
            Role::Tool => message
                .tool_results()
                .iter()
                .map(|r| tool_result_to_string(&r.result))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => message.text(),
        };
        Self {
            role,
            content,
            timestamp: message
                .timestamp
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(timestamp),
        }
    }
}

pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn api_messages(messages: &[ModelMessage]) -> Vec<ApiMessage> {
    messages.iter().map(ApiMessage::from).collect()
}

/// The newest assistant message with text, as shown to the user.
pub fn latest_response(messages: &[ApiMessage]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == "assistant" && !m.content.is_empty())
        .map(|m| m.content.clone())
        .unwrap_or_else(|| NO_RESPONSE.to_string())
}

// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": timestamp(),
        "system_initialized": state.system.is_some(),
    }))
}

// GET /status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "system_initialized": state.system.is_some(),
        "active_threads": state.threads.len().await,
        "timestamp": timestamp(),
        "version": API_VERSION,
    }))
}

/// Pull `(message, thread_id)` out of a chat body.
fn parse_chat_body(body: &[u8]) -> Result<(String, Option<String>), ApiError> {
    let data = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => map,
        _ => return Err(ApiError::bad_request("Invalid JSON body")),
    };

    let message = match data.get("message") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    };
    if message.is_empty() {
        return Err(ApiError::bad_request("Message cannot be empty"));
    }

    let thread_id = match data.get("thread_id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    Ok((message, thread_id))
}

// POST /chat
pub async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let system = state.system.clone().ok_or_else(ApiError::not_initialized)?;
    let (message, thread_id) = parse_chat_body(&body)?;
    let thread_id = thread_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut messages = match state.threads.get(&thread_id).await {
        Some(existing) => existing,
        None => {
            state.threads.replace(thread_id.clone(), Vec::new()).await;
            Vec::new()
        }
    };
    let preview: String = message.chars().take(80).collect();
    info!(thread_id = %thread_id, "User: {preview}");
    messages.push(ModelMessage::user(message));

    let result = with_timeout(state.agent_timeout, system.invoke(messages, &thread_id))
        .await
        .map_err(|e| {
            error!(thread_id = %thread_id, error = %e, "Error in /chat");
            ApiError::from(e)
        })?;

    let conversation = api_messages(&result);
    state.threads.replace(thread_id.clone(), result).await;

    Ok(Json(json!({
        "response": latest_response(&conversation),
        "thread_id": thread_id,
        "conversation": conversation,
        "status": "success",
        "timestamp": timestamp(),
    })))
}

// GET /conversation/:thread_id
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let messages = state
        .threads
        .get(&thread_id)
        .await
        .ok_or_else(|| ApiError::not_found("Thread not found"))?;
    let messages = api_messages(&messages);
    Ok(Json(json!({
        "thread_id": thread_id,
        "message_count": messages.len(),
        "messages": messages,
        "status": "success",
        "timestamp": timestamp(),
    })))
}

// DELETE /conversation/:thread_id
pub async fn clear_conversation(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .threads
        .remove(&thread_id)
        .await
        .ok_or_else(|| ApiError::not_found("Thread not found"))?;
    info!(thread_id = %thread_id, "Conversation cleared");
    Ok(Json(json!({
        "message": format!("Conversation {thread_id} cleared"),
        "status": "success",
    })))
}

// GET /conversations
pub async fn list_conversations(State(state): State<Arc<AppState>>) -> Json<Value> {
    let threads: Vec<Value> = state
        .threads
        .list()
        .await
        .into_iter()
        .map(|(thread_id, message_count)| {
            json!({"thread_id": thread_id, "message_count": message_count})
        })
        .collect();
    Json(json!({
        "total_threads": threads.len(),
        "threads": threads,
        "status": "success",
        "timestamp": timestamp(),
    }))
}

pub async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Endpoint not found").with_timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chat_body_validation() {
        assert!(parse_chat_body(b"not json").is_err());
        assert!(parse_chat_body(b"{}").is_err());
        assert!(parse_chat_body(b"[1]").is_err());

        let err = parse_chat_body(br#"{"message": "   "}"#).unwrap_err();
        assert_eq!(err.message, "Message cannot be empty");

        let (message, thread) = parse_chat_body(br#"{"message": " hi ", "thread_id": "t"}"#).unwrap();
        assert_eq!(message, "hi");
        assert_eq!(thread.as_deref(), Some("t"));
    }

    #[test]
    fn roles_map_to_api_view() {
        let tool = ModelMessage::tool_result("c1", json!("Successfully transferred"), false);
        let view = api_messages(&[
            ModelMessage::user("q"),
            ModelMessage::assistant("a"),
            tool,
            ModelMessage::system("s"),
        ]);
        let roles: Vec<&str> = view.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["user", "assistant", "system", "system"]);
        assert_eq!(view[2].content, "Successfully transferred");
    }

    #[test]
    fn latest_response_skips_empty_assistant_turns() {
        let view = api_messages(&[
            ModelMessage::assistant("first"),
            ModelMessage::assistant_tool_calls("", vec![]),
        ]);
        assert_eq!(latest_response(&view), "first");
        assert_eq!(latest_response(&[]), NO_RESPONSE);
    }
}
