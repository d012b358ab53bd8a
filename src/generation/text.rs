//! Text generation with tool loop.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::AgentsError;
use crate::provider::{ModelProvider, ProviderRequest};
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::{tool_definitions, Tool};
use crate::types::*;

/// Maximum tool loop iterations to prevent infinite loops.
pub const MAX_TOOL_ITERATIONS: usize = 20;

/// Generate text with an optional tool loop.
///
/// If the model returns tool calls, they are executed and fed back
/// until the model produces a final text response or we hit the iteration limit.
pub async fn generate_text(
    provider: &dyn ModelProvider,
    mut messages: Vec<ModelMessage>,
    settings: GenerationSettings,
    tools: &[Arc<dyn Tool>],
) -> Result<GenerateTextResult, AgentsError> {
    let tool_defs = tool_definitions(tools);

    let mut steps = Vec::new();
    let mut total_usage = Usage::default();

    for iteration in 0..MAX_TOOL_ITERATIONS {
        let request = ProviderRequest {
            messages: messages.clone(),
            settings: settings.clone(),
            tools: tool_defs.clone(),
        };

        debug!(iteration, "generate_text: calling provider");
        let response = provider.generate_text(&request).await?;

        total_usage.merge(&response.usage);

        let mut step = GenerationStep {
            text: response.text.clone(),
            tool_calls: response.tool_calls.clone(),
            tool_results: Vec::new(),
            usage: response.usage,
            finish_reason: response.finish_reason,
        };

        if !response.tool_calls.is_empty() {
            messages.push(ModelMessage::assistant_tool_calls(
                response.text.clone(),
                response.tool_calls.clone(),
            ));

            for tc in &response.tool_calls {
                let result = execute_tool_call(tools, tc).await;
                step.tool_results.push(result.clone());
                messages.push(ModelMessage::tool_result(
                    result.tool_call_id,
                    result.result,
                    result.is_error,
                ));
            }

            steps.push(step);
            continue;
        }

        steps.push(step);
        messages.push(ModelMessage::assistant(response.text.clone()));

        return Ok(GenerateTextResult {
            text: response.text,
            steps,
            messages,
            usage: total_usage,
            finish_reason: response.finish_reason,
        });
    }

    warn!(iterations = MAX_TOOL_ITERATIONS, "generate_text: tool iteration limit reached");
    let last_text = steps.last().map(|s| s.text.clone()).unwrap_or_default();
    Ok(GenerateTextResult {
        text: last_text,
        steps,
        messages,
        usage: total_usage,
        finish_reason: Some(FinishReason::Length),
    })
}

/// Run one tool call. Failures become error results the model can read.
async fn execute_tool_call(
    tools: &[Arc<dyn Tool>],
    tc: &AgentToolCall,
) -> AgentToolResult {
    let Some(tool) = tools.iter().find(|t| t.name() == tc.name) else {
        warn!(tool = tc.name, "Tool not found");
        return AgentToolResult {
            tool_call_id: tc.id.clone(),
            result: serde_json::json!({"error": format!("Tool '{}' not found", tc.name)}),
            is_error: true,
        };
    };

    let args = ToolArguments::new(tc.arguments.clone());
    match tool.execute(&args).await {
        Ok(val) => AgentToolResult {
            tool_call_id: tc.id.clone(),
            result: val,
            is_error: false,
        },
        Err(e) => {
            warn!(tool = tc.name, error = %e, "Tool execution failed");
            AgentToolResult {
                tool_call_id: tc.id.clone(),
                result: serde_json::json!({"error": e.to_string()}),
                is_error: true,
            }
        }
    }
}
