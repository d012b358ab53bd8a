//! Tavily-backed search tools against a mock API.

use std::sync::Arc;

use celo_agents::error::AgentsError;
use celo_agents::tools::search::{search_tools, SearchRequest, TavilyClient};
use celo_agents::tools::{Tool, ToolArguments};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> Arc<TavilyClient> {
    Arc::new(TavilyClient::new("tvly-test").with_base_url(server.uri()))
}

fn tool(client: Arc<TavilyClient>, name: &str) -> Arc<dyn Tool> {
    search_tools(client)
        .into_iter()
        .find(|t| t.name() == name)
        .unwrap()
}

#[tokio::test]
async fn search_web_formats_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("authorization", "Bearer tvly-test"))
        .and(body_partial_json(json!({
            "query": "celo gas fees",
            "search_depth": "advanced",
            "max_results": 5,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"title": "Celo docs", "url": "https://docs.celo.org", "content": "Gas on Celo is cheap."},
                {"url": "https://example.com"},
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = tool(client(&server), "search_web")
        .execute(&ToolArguments::new(json!({"query": "celo gas fees"})))
        .await
        .unwrap();

    assert_eq!(
        result.as_str().unwrap(),
        "Search Results for: celo gas fees\n\n\
         1. Celo docs\n   URL: https://docs.celo.org\n   Gas on Celo is cheap....\n\n\
         2. No Title\n   URL: https://example.com\n   No content available...\n\n"
    );
}

#[tokio::test]
async fn search_news_sends_topic_and_days() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({
            "query": "celo",
            "topic": "news",
            "days": 3,
            "max_results": 2,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"title": "Celo L2", "url": "https://news.example/l2", "content": "Migration done.", "published_date": "2025-03-26"},
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = tool(client(&server), "search_news")
        .execute(&ToolArguments::new(json!({"query": "celo", "max_results": 2, "days_back": 3})))
        .await
        .unwrap();

    let text = result.as_str().unwrap();
    assert!(text.starts_with("Recent News Results for: celo\n\n1. Celo L2\n"));
    assert!(text.contains("   Published: 2025-03-26\n"));
}

#[tokio::test]
async fn api_failures_become_tool_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = tool(client(&server), "search_web")
        .execute(&ToolArguments::new(json!({"query": "x"})))
        .await
        .unwrap_err();
    match err {
        AgentsError::ToolExecution { tool_name, message } => {
            assert_eq!(tool_name, "search_web");
            assert!(message.contains("invalid api key"));
        }
        other => panic!("expected ToolExecution, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_query_is_invalid_argument() {
    let server = MockServer::start().await;
    let err = tool(client(&server), "search_news")
        .execute(&ToolArguments::new(json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentsError::InvalidArgument(_)));
}

#[tokio::test]
async fn client_returns_raw_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let results = client(&server)
        .search(&SearchRequest::web("nothing", 1))
        .await
        .unwrap();
    assert!(results.is_empty());
}
