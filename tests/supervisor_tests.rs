//! Supervisor routing between the specialist agents.

mod common;

use std::sync::Arc;

use celo_agents::agent::{
    blockchain_expert, build_agent_system, search_expert, Agent, AgentSystem, Supervisor,
    SUPERVISOR_NAME,
};
use celo_agents::config::AgentsConfig;
use celo_agents::error::AgentsError;
use celo_agents::tools::{AgentTool, AgentToolParameters, Tool};
use celo_agents::types::*;
use common::MockProvider;
use pretty_assertions::assert_eq;
use serde_json::json;

fn stub_block_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        "get_latest_block_number",
        "Get the latest block number on the Celo blockchain.",
        AgentToolParameters::empty(),
        |_args| async move { Ok(json!(123)) },
    ))
}

fn system_with(provider: Arc<MockProvider>) -> Supervisor {
    let agents = vec![
        blockchain_expert(provider.clone(), vec![stub_block_tool()]),
        search_expert(provider.clone(), vec![]),
    ];
    Supervisor::new(provider, agents)
}

#[tokio::test]
async fn hands_off_to_blockchain_expert_and_answers() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_tool_call("h1", "transfer_to_blockchain_expert", json!({}));
    provider.queue_tool_call("c1", "get_latest_block_number", json!({}));
    provider.queue_response("The latest block is 123.");
    provider.queue_response("The latest Celo block is 123.");

    let supervisor = system_with(provider.clone());
    let messages = supervisor
        .invoke(vec![ModelMessage::user("What is the latest block?")], "t1")
        .await
        .unwrap();

    let summary: Vec<(Role, Option<&str>)> = messages
        .iter()
        .map(|m| (m.role, m.name.as_deref()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Role::User, None),
            (Role::Assistant, Some(SUPERVISOR_NAME)),
            (Role::Tool, Some(SUPERVISOR_NAME)),
            (Role::Assistant, Some("blockchain_expert")),
            (Role::Tool, Some("blockchain_expert")),
            (Role::Assistant, Some("blockchain_expert")),
            (Role::Assistant, Some("blockchain_expert")),
            (Role::Tool, Some("blockchain_expert")),
            (Role::Assistant, Some(SUPERVISOR_NAME)),
        ]
    );
    assert_eq!(
        messages[6].tool_calls()[0].name,
        "transfer_back_to_main_supervisor"
    );
    assert_eq!(
        messages[7].tool_results()[0].result,
        json!("Successfully transferred back to main_supervisor")
    );
    assert_eq!(
        messages[2].tool_results()[0].result,
        json!("Successfully transferred to blockchain_expert")
    );
    assert_eq!(messages[4].tool_results()[0].result, json!(123));
    assert_eq!(messages.last().unwrap().text(), "The latest Celo block is 123.");

    let requests = provider.requests();
    assert_eq!(requests.len(), 4);

    let handoffs: Vec<String> = requests[0]
        .tools
        .as_ref()
        .unwrap()
        .iter()
        .map(|t| t.name.clone())
        .collect();
    assert_eq!(
        handoffs,
        vec!["transfer_to_blockchain_expert", "transfer_to_search_expert"]
    );

    // The expert sees its own prompt and the full history so far.
    let agent_request = &requests[1];
    assert_eq!(agent_request.messages[0].role, Role::System);
    assert!(agent_request.messages[0].text().contains("Celo blockchain operations"));
    assert_eq!(agent_request.messages.len(), 4);
    assert_eq!(
        agent_request.tools.as_ref().unwrap()[0].name,
        "get_latest_block_number"
    );
}

#[tokio::test]
async fn answers_directly_without_handoff() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_response("Hi! Ask me about Celo or the news.");

    let messages = system_with(provider.clone())
        .run(vec![ModelMessage::user("hello")])
        .await
        .unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].name.as_deref(), Some(SUPERVISOR_NAME));
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn unknown_agent_gets_an_error_result() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_tool_call("h1", "transfer_to_weather_expert", json!({}));
    provider.queue_response("I can't help with the weather.");

    let messages = system_with(provider.clone())
        .run(vec![ModelMessage::user("weather?")])
        .await
        .unwrap();

    let result = messages[2].tool_results()[0].clone();
    assert!(result.is_error);
    assert!(result.result["error"]
        .as_str()
        .unwrap()
        .contains("transfer_to_weather_expert"));
    assert_eq!(messages.last().unwrap().text(), "I can't help with the weather.");
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn handoff_cap_forces_a_final_answer() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_tool_call("h1", "transfer_to_search_expert", json!({}));
    provider.queue_response("Search results summary.");
    provider.queue_response("Here is what I found.");

    let messages = system_with(provider.clone())
        .with_max_handoffs(1)
        .run(vec![ModelMessage::user("news?")])
        .await
        .unwrap();

    assert_eq!(messages.last().unwrap().text(), "Here is what I found.");
    let requests = provider.requests();
    assert!(requests[0].tools.is_some());
    assert!(requests[2].tools.is_none());
}

#[tokio::test]
async fn transfers_after_the_cap_are_ignored() {
    let provider = Arc::new(MockProvider::new("mock"));
    for round in 0..2 {
        provider.queue_tool_call(&format!("h{round}"), "transfer_to_search_expert", json!({}));
        provider.queue_response(&format!("Findings {round}."));
    }
    // The model keeps asking for transfers even once tools are withdrawn.
    for extra in 0..5 {
        provider.queue_tool_calls(
            "Wrapping up.",
            &[(&format!("x{extra}"), "transfer_to_search_expert")],
        );
    }

    let messages = system_with(provider.clone())
        .with_max_handoffs(2)
        .run(vec![ModelMessage::user("news?")])
        .await
        .unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 5);
    assert!(requests[4].tools.is_none());

    let last = messages.last().unwrap();
    assert_eq!(last.name.as_deref(), Some(SUPERVISOR_NAME));
    assert_eq!(last.text(), "Wrapping up.");
    assert!(last.tool_calls().is_empty());
    // user + 2 x (handoff call, handoff result, expert answer, handback call, handback result) + answer
    assert_eq!(messages.len(), 12);
}

#[tokio::test]
async fn only_the_first_transfer_in_a_turn_runs() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_tool_calls(
        "",
        &[
            ("h1", "transfer_to_blockchain_expert"),
            ("h2", "transfer_to_search_expert"),
        ],
    );
    provider.queue_response("Block 123.");
    provider.queue_response("The latest block is 123.");

    let messages = system_with(provider.clone())
        .run(vec![ModelMessage::user("block and news?")])
        .await
        .unwrap();

    let first = messages[2].tool_results()[0].clone();
    assert_eq!(first.tool_call_id, "h1");
    assert!(!first.is_error);

    let second = messages[3].tool_results()[0].clone();
    assert_eq!(second.tool_call_id, "h2");
    assert!(second.is_error);
    assert!(second.result["error"]
        .as_str()
        .unwrap()
        .contains("search_expert"));

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[1].messages[0].text().contains("Celo blockchain operations"));
    assert!(requests
        .iter()
        .all(|r| !r.messages[0].text().contains("web search expert")));
    assert_eq!(messages.last().unwrap().text(), "The latest block is 123.");
}

#[tokio::test]
async fn agent_run_returns_only_new_messages() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_response("Only this.");

    let agent = Agent::new("solo", "You are terse.", provider.clone());
    let history = vec![
        ModelMessage::system("ignored"),
        ModelMessage::user("q1"),
        ModelMessage::assistant("a1"),
        ModelMessage::user("q2"),
    ];
    let produced = agent.run(&history).await.unwrap();

    assert_eq!(produced.len(), 1);
    assert_eq!(produced[0].text(), "Only this.");
    assert_eq!(produced[0].name.as_deref(), Some("solo"));

    let sent = &provider.requests()[0].messages;
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[0].text(), "You are terse.");
}

#[tokio::test]
async fn expert_failures_propagate() {
    let provider = Arc::new(MockProvider::new("mock"));
    provider.queue_tool_call("h1", "transfer_to_search_expert", json!({}));
    provider.queue_error(AgentsError::RateLimited { retry_after_ms: None });

    let err = system_with(provider)
        .run(vec![ModelMessage::user("news?")])
        .await
        .unwrap_err();
    assert!(matches!(err, AgentsError::RateLimited { .. }));
}

#[test]
fn build_requires_api_keys() {
    let err = build_agent_system(&AgentsConfig::new()).unwrap_err();
    assert!(err.to_string().contains("GOOGLE_API_KEY"));
}

#[test]
fn build_wires_both_experts() {
    let mut config = AgentsConfig::new();
    config.google_api_key = Some("g".into());
    config.tavily_api_key = Some("t".into());

    let supervisor = build_agent_system(&config).unwrap();
    let names: Vec<&str> = supervisor.agents().iter().map(|a| a.name()).collect();
    assert_eq!(names, vec!["blockchain_expert", "search_expert"]);
    assert_eq!(supervisor.agents()[0].tools().len(), 3);
    assert_eq!(supervisor.agents()[1].tools().len(), 2);
}
