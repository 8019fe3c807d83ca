//! Web search tool backed by DuckDuckGo's HTML endpoint.
//!
//! Returns one result link per line, or `(no results)`.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use taskpilot_core::error::ToolError;
use taskpilot_core::tool::{Tool, ToolResult};
use tracing::debug;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const DEFAULT_RESULTS: u64 = 5;

static RESULT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]*class="result__a"[^>]*href="([^"]+)""#).expect("valid result link pattern")
});

pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self::with_endpoint(SEARCH_URL)
    }

    /// Search against a different HTML endpoint with the same markup.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; taskpilot)")
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull up to `limit` result links out of a results page.
pub fn extract_links(html: &str, limit: usize) -> Vec<String> {
    RESULT_LINK
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str().replace("&amp;", "&")))
        .take(limit)
        .collect()
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web using DuckDuckGo and return the top result links"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num": {
                    "type": "integer",
                    "description": "Number of results to return",
                    "default": DEFAULT_RESULTS
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"].as_str().unwrap_or("").trim();
        if query.is_empty() {
            return Ok(ToolResult::failure("Query is required"));
        }
        let num = arguments["num"].as_u64().unwrap_or(DEFAULT_RESULTS) as usize;

        debug!(query, num, "Searching the web");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await;

        let html = match response {
            Ok(r) => match r.text().await {
                Ok(body) => body,
                Err(e) => return Ok(ToolResult::failure(e.to_string())),
            },
            Err(e) => return Ok(ToolResult::failure(e.to_string())),
        };

        let links = extract_links(&html, num);
        Ok(ToolResult::text(if links.is_empty() {
            "(no results)".to_string()
        } else {
            links.join("\n")
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <div class="result"><a rel="nofollow" class="result__a" href="https://www.rust-lang.org/">Rust</a></div>
        <div class="result"><a class="result__a" href="https://doc.rust-lang.org/book/?a=1&amp;b=2">Book</a></div>
        <div class="result"><a class="result__snippet" href="https://ignored.example">snippet</a></div>
        <div class="result"><a class="result__a" href="https://crates.io/">Crates</a></div>
    "#;

    #[test]
    fn extracts_result_links_in_order() {
        let links = extract_links(PAGE, 10);
        assert_eq!(
            links,
            vec![
                "https://www.rust-lang.org/",
                "https://doc.rust-lang.org/book/?a=1&b=2",
                "https://crates.io/",
            ]
        );
    }

    #[test]
    fn limit_is_respected() {
        assert_eq!(extract_links(PAGE, 1).len(), 1);
        assert!(extract_links("<html></html>", 5).is_empty());
    }

    #[tokio::test]
    async fn empty_query_rejected() {
        let result = WebSearchTool::new()
            .execute(serde_json::json!({"query": "  "}))
            .await
            .unwrap();
        assert_eq!(result.error.as_deref(), Some("Query is required"));
    }
}
