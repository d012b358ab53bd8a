//! Web and news search tools backed by the Tavily API.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::AgentsError;
use crate::provider::http::{bearer_headers, shared_client, status_to_error};
use crate::tools::tool::{tool_error, AgentTool, Tool};
use crate::tools::types::AgentToolParameters;

const BASE_URL: &str = "https://api.tavily.com";
const DEFAULT_MAX_RESULTS: u64 = 5;
const DEFAULT_DAYS_BACK: u64 = 7;
/// Characters of page content kept per result.
const SNIPPET_CHARS: usize = 300;

/// A Tavily search request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub search_depth: String,
    pub max_results: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u64>,
}

impl SearchRequest {
    /// General web search with advanced depth.
    pub fn web(query: impl Into<String>, max_results: u64) -> Self {
        Self {
            query: query.into(),
            search_depth: "advanced".to_string(),
            max_results,
            topic: None,
            days: None,
        }
    }

    /// News search limited to the last `days` days.
    pub fn news(query: impl Into<String>, max_results: u64, days: u64) -> Self {
        Self {
            topic: Some("news".to_string()),
            days: Some(days),
            ..Self::web(query, max_results)
        }
    }
}

/// One search hit.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct SearchResult {
    pub title: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
    pub published_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// Thin Tavily REST client.
pub struct TavilyClient {
    api_key: String,
    base_url: String,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, AgentsError> {
        debug!(query = %request.query, topic = ?request.topic, "Tavily search");

        let resp = shared_client()
            .post(format!("{}/search", self.base_url))
            .headers(bearer_headers(&self.api_key))
            .json(request)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: SearchResponse = resp.json().await?;
        Ok(data.results)
    }
}

impl std::fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TavilyClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn snippet(content: Option<&str>) -> String {
    content
        .unwrap_or("No content available")
        .chars()
        .take(SNIPPET_CHARS)
        .collect()
}

/// Render web results as numbered plain text.
pub fn format_web_results(query: &str, results: &[SearchResult]) -> String {
    let mut out = format!("Search Results for: {query}\n\n");
    for (i, r) in results.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, r.title.as_deref().unwrap_or("No Title")));
        out.push_str(&format!("   URL: {}\n", r.url.as_deref().unwrap_or("No URL")));
        out.push_str(&format!("   {}...\n\n", snippet(r.content.as_deref())));
    }
    out
}

/// Render news results as numbered plain text, with publication dates.
pub fn format_news_results(query: &str, results: &[SearchResult]) -> String {
    let mut out = format!("Recent News Results for: {query}\n\n");
    for (i, r) in results.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, r.title.as_deref().unwrap_or("No Title")));
        out.push_str(&format!(
            "   Published: {}\n",
            r.published_date.as_deref().unwrap_or("Unknown date")
        ));
        out.push_str(&format!("   URL: {}\n", r.url.as_deref().unwrap_or("No URL")));
        out.push_str(&format!("   {}...\n\n", snippet(r.content.as_deref())));
    }
    out
}

/// `search_web`: general web search.
pub fn search_web_tool(client: Arc<TavilyClient>) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        "search_web",
        "Search the web for information. Use for general questions that need \
         up-to-date knowledge.",
        AgentToolParameters::object()
            .string("query", "The search query", true)
            .integer("max_results", "Maximum number of results to return (default: 5)", false)
            .build(),
        move |args| {
            let client = client.clone();
            async move {
                let query = args.get_str("query")?.to_string();
                let max_results = args.get_u64_opt("max_results")?.unwrap_or(DEFAULT_MAX_RESULTS);
                let results = client
                    .search(&SearchRequest::web(query.clone(), max_results))
                    .await
                    .map_err(|e| tool_error("search_web", e))?;
                Ok(Value::String(format_web_results(&query, &results)))
            }
        },
    ))
}

/// `search_news`: recent news search.
pub fn search_news_tool(client: Arc<TavilyClient>) -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        "search_news",
        "Search for recent news. Use for current events.",
        AgentToolParameters::object()
            .string("query", "The search query", true)
            .integer("max_results", "Maximum number of results to return (default: 5)", false)
            .integer("days_back", "How many days back to search for news (default: 7)", false)
            .build(),
        move |args| {
            let client = client.clone();
            async move {
                let query = args.get_str("query")?.to_string();
                let max_results = args.get_u64_opt("max_results")?.unwrap_or(DEFAULT_MAX_RESULTS);
                let days_back = args.get_u64_opt("days_back")?.unwrap_or(DEFAULT_DAYS_BACK);
                let results = client
                    .search(&SearchRequest::news(query.clone(), max_results, days_back))
                    .await
                    .map_err(|e| tool_error("search_news", e))?;
                Ok(Value::String(format_news_results(&query, &results)))
            }
        },
    ))
}

/// Both search tools sharing one client.
pub fn search_tools(client: Arc<TavilyClient>) -> Vec<Arc<dyn Tool>> {
    vec![search_web_tool(client.clone()), search_news_tool(client)]
}
